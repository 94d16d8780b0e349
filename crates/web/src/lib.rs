//! Web front end for the ITI scheduling backend.
//!
//! Every page controller renders server-side HTML from the backend's JSON
//! and keeps its own view state.

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use client::{ApiClient, MAX_UPLOAD_BYTES, Notifier};

pub mod cli;
pub mod config;
pub mod layout;
pub mod pages;

use config::{AppConfig, GraphConfig};
use pages::{exportar, grafo, horarios, inicio, profesor, reporte};

/// Room for multipart framing around the largest accepted upload, so an
/// oversized file still reaches the size check instead of a bare 413.
const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES as usize + 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub api: ApiClient,
    pub notifier: Arc<Notifier>,
    pub inicio: Arc<RwLock<inicio::InicioState>>,
    pub horarios: Arc<RwLock<horarios::HorariosState>>,
    pub profesor: Arc<RwLock<profesor::ProfesorState>>,
    pub grafo: Arc<RwLock<grafo::GrafoState>>,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let notifier = Notifier::new(&config.notifications);
        let api = ApiClient::from_config(&config.backend, notifier)?;
        Ok(Self::new(api, &config.graph))
    }

    pub fn new(api: ApiClient, graph: &GraphConfig) -> Self {
        let notifier = api.notifier().clone();
        Self {
            api,
            notifier,
            inicio: Arc::default(),
            horarios: Arc::default(),
            profesor: Arc::default(),
            grafo: Arc::new(RwLock::new(grafo::GrafoState::new(graph.view_config()))),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(inicio::show))
        .route(
            "/upload",
            post(inicio::upload).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/upload/quitar", post(inicio::quitar))
        .route("/generar", post(inicio::generar))
        .route("/horarios", get(horarios::show))
        .route("/profesor", get(profesor::show))
        .route("/profesor/disponibilidad", post(profesor::toggle))
        .route("/grafo", get(grafo::show))
        .route("/grafo/actualizar", post(grafo::actualizar))
        .route("/grafo/reiniciar", post(grafo::reiniciar))
        .route("/grafo/exportar", get(grafo::exportar))
        .route("/grafo/nodos/:id", get(grafo::detalle))
        .route(
            "/grafo/nodos/:id/tooltip",
            get(grafo::tooltip).delete(grafo::ocultar_tooltip),
        )
        .route("/grafo/nodos/:id/arrastrar", post(grafo::arrastrar))
        .route("/reporte", get(reporte::show))
        .route("/reporte/regenerar", post(reporte::regenerar))
        .route("/exportar/:formato", get(exportar::download))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
