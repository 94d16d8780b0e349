use axum::extract::State;
use axum::response::{Html, Redirect};

use client::schema::ValidationReport;

use crate::AppState;
use crate::layout::{self, Nav, esc};
use crate::pages::require_schedules;

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    /// `success`, `info`, `warning` or `danger`.
    pub tipo: &'static str,
    pub titulo: String,
    pub descripcion: String,
}

pub async fn show(State(state): State<AppState>) -> Html<String> {
    let page = |body: String| layout::page("Reporte de Validación", Nav::Reporte, &body, &state.notifier);

    if require_schedules(&state, "No hay horarios generados.").await.is_none() {
        return page(layout::empty_state("No hay horarios generados"));
    }

    let Ok(reporte) = state.api.validacion().await else {
        return page(layout::empty_state("No hay reporte de validación disponible"));
    };

    page(report_body(&reporte))
}

/// The report is fetched fresh by `show`, so regenerating only announces it.
pub async fn regenerar(State(state): State<AppState>) -> Redirect {
    state.notifier.success("Reporte actualizado");
    Redirect::to("/reporte")
}

/// Advice derived from the validation results.
pub fn recomendaciones(reporte: &ValidationReport) -> Vec<Recommendation> {
    let mut out = Vec::new();
    let total = reporte.restricciones.len();
    let incumplidas = total - reporte.cumplidas();

    if total > 0 && incumplidas == 0 {
        out.push(Recommendation {
            tipo: "success",
            titulo: "Distribución Equilibrada".to_string(),
            descripcion: "Todas las restricciones se cumplen.".to_string(),
        });
    }
    if incumplidas > 0 {
        out.push(Recommendation {
            tipo: "danger",
            titulo: "Restricciones Incumplidas".to_string(),
            descripcion: format!("{} de {} restricciones no se cumplen.", incumplidas, total),
        });
    }
    if reporte.conflictos_criticos > 0 {
        out.push(Recommendation {
            tipo: "danger",
            titulo: "Conflictos Críticos".to_string(),
            descripcion: format!(
                "Se detectaron {} conflictos críticos. Revise el grafo de conflictos.",
                reporte.conflictos_criticos
            ),
        });
    }
    if !reporte.optimizaciones.is_empty() {
        out.push(Recommendation {
            tipo: "warning",
            titulo: "Revisar Optimizaciones".to_string(),
            descripcion: format!(
                "Se detectaron {} posibles optimizaciones.",
                reporte.optimizaciones.len()
            ),
        });
    }
    if out.is_empty() {
        out.push(Recommendation {
            tipo: "info",
            titulo: "Sin Observaciones".to_string(),
            descripcion: "No hay datos suficientes para generar recomendaciones.".to_string(),
        });
    }
    out
}

fn report_body(reporte: &ValidationReport) -> String {
    let mut out = format!(
        r#"<section class="card"><div class="stats">{}{}{}{}</div><form method="post" action="/reporte/regenerar"><button class="btn">Regenerar reporte</button></form> <a class="btn" href="/exportar/pdf">Exportar a PDF</a></section>"#,
        layout::stat_card("Restricciones cumplidas", reporte.cumplidas()),
        layout::stat_card("Optimizaciones", reporte.optimizaciones.len()),
        layout::stat_card("Conflictos críticos", reporte.conflictos_criticos),
        layout::stat_card("Eficiencia %", reporte.eficiencia()),
    );

    out.push_str(r#"<section class="card"><h2>Restricciones</h2><div id="restriccionesContainer">"#);
    if reporte.restricciones.is_empty() {
        out.push_str("<p>No hay restricciones definidas</p>");
    }
    for r in &reporte.restricciones {
        let class = if r.cumplida { "success" } else { "danger" };
        out.push_str(&format!(
            r#"<div class="restriccion-item {}"><h4>{}</h4><p>{}</p></div>"#,
            class,
            esc(&r.tipo),
            esc(&r.descripcion)
        ));
    }
    out.push_str("</div></section>");

    out.push_str(r#"<section class="card"><h2>Optimizaciones</h2><div id="optimizacionesContainer">"#);
    if reporte.optimizaciones.is_empty() {
        out.push_str("<p>No se detectaron optimizaciones</p>");
    }
    for o in &reporte.optimizaciones {
        let class = if o.is_warning() { "warning" } else { "info" };
        out.push_str(&format!(
            r#"<div class="optimizacion-item {}"><p>{}</p></div>"#,
            class,
            esc(&o.mensaje)
        ));
    }
    out.push_str("</div></section>");

    let conflictos = if reporte.conflictos_criticos > 0 {
        format!(
            "Se detectaron {} conflictos críticos",
            reporte.conflictos_criticos
        )
    } else {
        "No hay conflictos detectados".to_string()
    };
    out.push_str(&format!(
        r#"<section id="conflictosSection" class="card"><h2>Conflictos</h2><p>{}</p></section>"#,
        conflictos
    ));

    out.push_str(r#"<section class="card"><h2>Recomendaciones</h2><div id="recomendacionesContainer">"#);
    for r in recomendaciones(reporte) {
        out.push_str(&format!(
            r#"<div class="recomendacion-item {}"><h4>{}</h4><p>{}</p></div>"#,
            r.tipo,
            esc(&r.titulo),
            esc(&r.descripcion)
        ));
    }
    out.push_str("</div></section>");
    out
}
