use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};

use client::schema::{SystemStatus, UploadSummary};
use client::upload::format_file_size;
use client::{MAX_UPLOAD_BYTES, UploadRejection, validate_upload};

use crate::AppState;
use crate::layout::{self, Nav, esc};

#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFile {
    pub name: String,
    pub size: u64,
}

#[derive(Debug, Default)]
pub struct InicioState {
    pub archivo: Option<SelectedFile>,
    pub resumen: Option<UploadSummary>,
    /// Sentence describing the last generation run.
    pub resultado: Option<String>,
    /// Show the upload form even when the backend has preloaded data.
    pub mostrar_carga: bool,
}

impl InicioState {
    fn reset(&mut self) {
        *self = InicioState {
            mostrar_carga: true,
            ..Default::default()
        };
    }

    fn shows_preloaded(&self) -> bool {
        self.archivo.is_none() && !self.mostrar_carga
    }
}

pub async fn show(State(state): State<AppState>) -> Html<String> {
    let estado = state.api.estado().await.ok();
    let view = state.inicio.read().await;

    let preloaded = estado.as_ref().filter(|e| e.datos_cargados);
    if preloaded.is_some() && view.shows_preloaded() {
        state.notifier.info("Hay datos previamente cargados");
    }

    let mut body = String::new();
    match preloaded {
        Some(_) if view.shows_preloaded() => body.push_str(PRELOADED_CARD),
        _ => body.push_str(&upload_section(view.archivo.as_ref())),
    }

    let resumen = view
        .resumen
        .clone()
        .or_else(|| preloaded.map(summary_from_status));
    if let Some(resumen) = resumen {
        body.push_str(&resumen_section(&resumen));
        body.push_str(GENERATE_FORM);
    }

    let resultado = view.resultado.clone().or_else(|| {
        estado
            .as_ref()
            .filter(|e| e.horarios_generados)
            .map(|e| {
                format!(
                    "Se generaron horarios para {} grupos con {} de {} cursos asignados.",
                    e.total_grupos, e.total_cursos, e.total_cursos
                )
            })
    });
    if let Some(mensaje) = resultado {
        body.push_str(&format!(
            r#"<section id="resultadoSection" class="card"><h2>Horarios generados</h2><p id="resultadoMensaje">{}</p><a class="btn" href="/horarios">Ver horarios</a> <a class="btn" href="/grafo">Ver grafo</a> <a class="btn" href="/reporte">Ver reporte</a></section>"#,
            esc(&mensaje)
        ));
    }

    layout::page("Inicio", Nav::Inicio, &body, &state.notifier)
}

/// Receive the `file` field, check it locally, then forward it.
pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let received = match read_file_field(&mut multipart).await {
        Ok(received) => received,
        Err(message) => {
            state.notifier.error(message);
            return Redirect::to("/").into_response();
        }
    };

    let Some((name, bytes, oversized)) = received else {
        state.notifier.error(UploadRejection::MissingName.to_string());
        return Redirect::to("/").into_response();
    };

    if oversized {
        // The type check still takes precedence over the size.
        if let Err(rejection) = validate_upload(&name, MAX_UPLOAD_BYTES + 1) {
            tracing::warn!(file = %name, %rejection, "upload rejected before forwarding");
            state.notifier.error(rejection.to_string());
        }
        return Redirect::to("/").into_response();
    }

    let size = bytes.len() as u64;
    let Ok(response) = state.api.upload_bytes(&name, bytes).await else {
        return Redirect::to("/").into_response();
    };

    let mut view = state.inicio.write().await;
    if response.success {
        state.notifier.success("Archivo procesado correctamente");
        view.archivo = Some(SelectedFile { name, size });
        view.resumen = response.resumen;
        view.resultado = None;
    } else {
        state.notifier.error("Error al procesar archivo");
    }
    Redirect::to("/").into_response()
}

pub async fn quitar(State(state): State<AppState>) -> Redirect {
    state.inicio.write().await.reset();
    Redirect::to("/")
}

pub async fn generar(State(state): State<AppState>) -> Redirect {
    let Ok(response) = state.api.generar_horarios().await else {
        return Redirect::to("/");
    };

    match response.estadisticas.filter(|_| response.success) {
        Some(estadisticas) => {
            state.inicio.write().await.resultado = Some(estadisticas.summary());
            state.notifier.success("Horarios generados exitosamente");
        }
        None => {
            state.notifier.error("Error al generar horarios");
        }
    }
    Redirect::to("/")
}

/// Read the first `file` field, stopping once it passes the upload cap.
/// Returns `(name, bytes, oversized)`.
async fn read_file_field(
    multipart: &mut Multipart,
) -> Result<Option<(String, Vec<u8>, bool)>, String> {
    while let Some(mut field) = multipart.next_field().await.map_err(multipart_message)? {
        if field.name() != Some("file") {
            continue;
        }
        let name = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Ok(None),
        };

        let mut bytes = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(multipart_message)? {
            bytes.extend_from_slice(&chunk);
            if bytes.len() as u64 > MAX_UPLOAD_BYTES {
                return Ok(Some((name, Vec::new(), true)));
            }
        }
        return Ok(Some((name, bytes, false)));
    }
    Ok(None)
}

fn multipart_message(err: axum::extract::multipart::MultipartError) -> String {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadRejection::TooLarge {
            size: MAX_UPLOAD_BYTES + 1,
        }
        .to_string()
    } else {
        format!("Error: {}", err.body_text())
    }
}

fn summary_from_status(estado: &SystemStatus) -> UploadSummary {
    UploadSummary {
        cursos: estado.total_cursos,
        profesores: estado.total_profesores,
        grupos: estado.total_grupos,
        aulas: estado.total_aulas,
    }
}

fn upload_section(archivo: Option<&SelectedFile>) -> String {
    let file_info = match archivo {
        Some(file) => format!(
            r#"<div id="fileInfo" class="file-info"><i class="fas fa-file"></i> <span id="fileName">{}</span> (<span id="fileSize">{}</span>)<form method="post" action="/upload/quitar"><button class="btn btn-secondary" id="removeFile">Quitar</button></form></div>"#,
            esc(&file.name),
            format_file_size(file.size)
        ),
        None => String::new(),
    };
    format!(
        r#"<section class="card upload-section"><h2>Cargar datos</h2><form id="uploadArea" method="post" action="/upload" enctype="multipart/form-data"><p>Archivos Excel (.xlsx, .xls) o JSON (.json), máximo 16MB</p><input type="file" id="fileInput" name="file" accept=".xlsx,.xls,.json"> <button class="btn">Subir</button></form>{}</section>"#,
        file_info
    )
}

fn resumen_section(resumen: &UploadSummary) -> String {
    format!(
        r#"<section id="resumenSection" class="card"><h2>Resumen de datos</h2><div class="stats">{}{}{}{}</div></section>"#,
        layout::stat_card("Cursos", resumen.cursos),
        layout::stat_card("Profesores", resumen.profesores),
        layout::stat_card("Grupos", resumen.grupos),
        layout::stat_card("Aulas", resumen.aulas),
    )
}

const PRELOADED_CARD: &str = r#"<section class="card" style="text-align: center"><h3>Datos Cargados Automáticamente</h3><p>Los horarios han sido cargados desde los archivos CSV del sistema</p><form method="post" action="/upload/quitar"><button class="btn btn-secondary">Cargar otro archivo</button></form></section>"#;

const GENERATE_FORM: &str = r#"<section class="card"><form method="post" action="/generar"><button class="btn" id="btnGenerar">Generar horarios</button></form></section>"#;
