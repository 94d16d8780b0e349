use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Redirect, Response};
use serde::{Deserialize, Serialize};

use client::schema::ConflictGraph;
use graph::{
    ConflictKind, DetailPanel, EdgeFilter, GraphError, GraphView, NodeId, RenderSummary, SvgExport,
    Tooltip, ViewConfig,
};

use crate::AppState;
use crate::layout::{self, Nav, esc};

pub struct GrafoState {
    pub datos: Option<ConflictGraph>,
    pub filtro: EdgeFilter,
    pub view: GraphView,
}

impl GrafoState {
    pub fn new(config: ViewConfig) -> Self {
        Self {
            datos: None,
            filtro: EdgeFilter::Todos,
            view: GraphView::new(config),
        }
    }

    /// Re-render the loaded graph with the current filter.
    pub fn render(&mut self) -> Option<RenderSummary> {
        let datos = self.datos.as_ref()?;
        Some(self.view.render(&datos.input.filtered(self.filtro)))
    }

    pub fn set_filter(&mut self, filtro: EdgeFilter) -> Option<RenderSummary> {
        self.filtro = filtro;
        self.render()
    }
}

#[derive(Debug, Deserialize)]
pub struct GrafoQuery {
    pub tipo: Option<String>,
    /// Node whose detail panel is open.
    pub nodo: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PointerQuery {
    pub x: Option<f64>,
    pub y: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct DragRequest {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct NodePosition {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Serialize)]
pub struct TooltipResponse {
    #[serde(flatten)]
    pub tooltip: Tooltip,
    pub html: String,
}

pub async fn show(State(state): State<AppState>, Query(query): Query<GrafoQuery>) -> Html<String> {
    let page = |body: String| layout::page("Grafo de Conflictos", Nav::Grafo, &body, &state.notifier);

    let needs_load = state.grafo.read().await.datos.is_none();
    if needs_load && !load(&state).await {
        return page(layout::empty_state("No se pudo cargar el grafo"));
    }

    let mut grafo = state.grafo.write().await;
    let filtro = query.tipo.as_deref().map(EdgeFilter::parse);
    match filtro {
        Some(filtro) if filtro != grafo.filtro || !grafo.view.is_rendered() => {
            grafo.set_filter(filtro);
        }
        None if !grafo.view.is_rendered() => {
            grafo.render();
        }
        _ => {}
    }

    let detalle = query
        .nodo
        .as_deref()
        .and_then(|raw| grafo.view.resolve_id(raw).ok())
        .and_then(|id| grafo.view.click(&id).ok());

    page(graph_page(&grafo, detalle.as_ref()))
}

/// Fetch the graph again and render every edge.
pub async fn actualizar(State(state): State<AppState>) -> Redirect {
    load(&state).await;
    Redirect::to("/grafo")
}

/// Drop the filter and lay the graph out from scratch.
pub async fn reiniciar(State(state): State<AppState>) -> Redirect {
    state.grafo.write().await.set_filter(EdgeFilter::Todos);
    Redirect::to("/grafo")
}

pub async fn exportar(State(state): State<AppState>) -> Response {
    match state.grafo.read().await.view.export_svg() {
        Ok(SvgExport { file_name, markup }) => {
            state.notifier.success("Grafo descargado exitosamente");
            tracing::info!(%file_name, bytes = markup.len(), "graph exported");
            (
                [
                    (header::CONTENT_TYPE, SvgExport::MIME_TYPE.to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", file_name),
                    ),
                ],
                markup,
            )
                .into_response()
        }
        Err(err) => {
            state.notifier.error(err.to_string());
            Redirect::to("/grafo").into_response()
        }
    }
}

pub async fn detalle(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let grafo = state.grafo.read().await;
    match grafo.view.resolve_id(&id).and_then(|id| grafo.view.click(&id)) {
        Ok(panel) => Html(detail_panel(&panel)).into_response(),
        Err(err) => graph_error(err),
    }
}

pub async fn tooltip(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(pointer): Query<PointerQuery>,
) -> Response {
    let mut grafo = state.grafo.write().await;
    let found = grafo.view.resolve_id(&id);
    let mut tooltip = match found.and_then(|id| grafo.view.hover_enter(&id)) {
        Ok(tooltip) => tooltip,
        Err(err) => return graph_error(err),
    };
    if let (Some(x), Some(y)) = (pointer.x, pointer.y) {
        if let Some(moved) = grafo.view.hover_move(x, y) {
            tooltip = moved;
        }
    }
    let html = tooltip_html(&tooltip);
    Json(TooltipResponse { tooltip, html }).into_response()
}

pub async fn ocultar_tooltip(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let mut grafo = state.grafo.write().await;
    let found = grafo.view.resolve_id(&id);
    match found.and_then(|id| grafo.view.hover_leave(&id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => graph_error(err),
    }
}

/// One full drag gesture: grab, move to (`x`, `y`), release.
pub async fn arrastrar(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<DragRequest>,
) -> Response {
    let mut grafo = state.grafo.write().await;
    let view = &mut grafo.view;

    if let Err(err) = view.resolve_id(&id).and_then(|id| drag(view, &id, request.x, request.y)) {
        return graph_error(err);
    }

    let positions: Vec<NodePosition> = view
        .positions()
        .into_iter()
        .map(|(id, x, y)| NodePosition { id, x, y })
        .collect();
    Json(positions).into_response()
}

fn drag(view: &mut GraphView, id: &NodeId, x: f64, y: f64) -> graph::error::Result<()> {
    view.drag_start(id)?;
    view.drag_to(id, x, y)?;
    view.drag_end(id)
}

/// Fetch `/api/grafo` into the state and render it unfiltered.
async fn load(state: &AppState) -> bool {
    let Ok(datos) = state.api.grafo().await else {
        return false;
    };
    let mut grafo = state.grafo.write().await;
    grafo.datos = Some(datos);
    grafo.set_filter(EdgeFilter::Todos);
    true
}

fn graph_error(err: GraphError) -> Response {
    let status = match err {
        GraphError::NothingRendered => StatusCode::CONFLICT,
        GraphError::UnknownNode(_) => StatusCode::NOT_FOUND,
    };
    (status, err.to_string()).into_response()
}

fn graph_page(grafo: &GrafoState, detalle: Option<&DetailPanel>) -> String {
    let mut out = String::new();

    if let Some(datos) = &grafo.datos {
        out.push_str(&format!(
            r#"<div class="stats">{}{}{}</div>"#,
            layout::stat_card("Nodos", datos.total_nodos),
            layout::stat_card("Conexiones", datos.total_conexiones),
            layout::stat_card("Conflictos", datos.total_conflictos),
        ));
    }

    out.push_str(&filter_form(grafo.filtro));

    out.push_str(r#"<div id="grafoContainer" class="grafo-container">"#);
    match grafo.view.surface() {
        Some(surface) => out.push_str(&surface.to_markup()),
        None => out.push_str(r#"<p class="empty-state">No hay datos del grafo</p>"#),
    }
    out.push_str("</div>");

    out.push_str(&format!(
        r#"<div class="leyenda"><span style="color: {}">━ Conflicto de profesor</span> <span style="color: {}">━ Conflicto de horario</span></div>"#,
        graph::palette::edge_color(ConflictKind::Profesor),
        graph::palette::edge_color(ConflictKind::Horario),
    ));

    if let Some(panel) = detalle {
        out.push_str(&detail_panel(panel));
    }
    out
}

fn filter_form(actual: EdgeFilter) -> String {
    let options: String = [
        (EdgeFilter::Todos, "Todos los conflictos"),
        (EdgeFilter::Only(ConflictKind::Profesor), "Solo profesor"),
        (EdgeFilter::Only(ConflictKind::Horario), "Solo horario"),
    ]
    .iter()
    .map(|(filtro, label)| {
        let selected = if *filtro == actual { " selected" } else { "" };
        format!(r#"<option value="{}"{}>{}</option>"#, filtro.as_str(), selected, label)
    })
    .collect();

    format!(
        r#"<section class="card controles"><form method="get" action="/grafo"><select id="filtroTipo" name="tipo">{}</select> <button class="btn">Filtrar</button></form><form method="post" action="/grafo/actualizar"><button class="btn" id="btnActualizar">Actualizar</button></form><form method="post" action="/grafo/reiniciar"><button class="btn btn-secondary" id="btnReiniciar">Reiniciar vista</button></form><a class="btn" href="/grafo/exportar">Descargar SVG</a></section>"#,
        options
    )
}

pub(crate) fn detail_panel(panel: &DetailPanel) -> String {
    let conflictos = if panel.conflictos.is_empty() {
        "<p>Sin conflictos detectados</p>".to_string()
    } else {
        let items: String = panel
            .conflictos
            .iter()
            .map(|c| format!("<li>{}: {}</li>", c.tipo.label(), esc(&c.other_nombre)))
            .collect();
        format!(
            "<h5>Conflictos ({})</h5><ul>{}</ul>",
            panel.conflictos.len(),
            items
        )
    };

    format!(
        r#"<section id="detallesNodo" class="card"><a class="btn btn-secondary" href="/grafo">Cerrar</a><h3 id="detalleNombre">{}</h3><p>Grupo: <span id="detalleGrupo">{}</span></p><p>Profesor: <span id="detalleProfesor">{}</span></p><p>Horas/semana: <span id="detalleHoras">{}</span></p><div id="detalleConflictos">{}</div></section>"#,
        esc(&panel.nombre),
        esc(panel.grupo.as_deref().unwrap_or("")),
        esc(panel.profesor.as_deref().unwrap_or("Sin asignar")),
        fmt_horas(panel.horas),
        conflictos
    )
}

fn tooltip_html(tooltip: &Tooltip) -> String {
    format!(
        "<strong>{}</strong><br><small>Grupo: {}</small><br><small>Profesor: {}</small><br><small>Horas/semana: {}</small>",
        esc(&tooltip.nombre),
        esc(tooltip.grupo.as_deref().unwrap_or("")),
        esc(tooltip.profesor.as_deref().unwrap_or("Sin asignar")),
        fmt_horas(tooltip.horas),
    )
}

fn fmt_horas(horas: Option<f64>) -> String {
    horas.map(|h| h.to_string()).unwrap_or_default()
}
