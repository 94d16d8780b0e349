use axum::extract::{Query, State};
use axum::response::Html;
use serde::Deserialize;

use client::schema::{DIAS, GroupSchedule, GroupSlot};

use crate::AppState;
use crate::layout::{self, Nav, esc};
use crate::pages::require_schedules;

#[derive(Debug, Default)]
pub struct HorariosState {
    pub grupos: Vec<String>,
    pub actual: Option<GroupSchedule>,
}

#[derive(Debug, Deserialize)]
pub struct HorariosQuery {
    pub grupo: Option<String>,
}

pub async fn show(State(state): State<AppState>, Query(query): Query<HorariosQuery>) -> Html<String> {
    let page = |body: String| layout::page("Horarios por Grupo", Nav::Horarios, &body, &state.notifier);

    if require_schedules(&state, "No hay horarios generados. Ve a Inicio para cargar datos.")
        .await
        .is_none()
    {
        return page(layout::empty_state("No hay horarios generados"));
    }

    let grupos = match state.api.grupos().await {
        Ok(grupos) if !grupos.is_empty() => grupos,
        _ => return page(layout::empty_state("No hay grupos disponibles")),
    };

    let schedule = match query.grupo.as_deref().map(str::trim) {
        Some("") => {
            state.notifier.error("Selecciona un grupo");
            None
        }
        Some(grupo) => state.api.horario_grupo(grupo).await.ok(),
        None => None,
    };

    let mut view = state.horarios.write().await;
    view.grupos = grupos;
    if schedule.is_some() {
        view.actual = schedule;
    }

    let selected = view.actual.as_ref().map(|s| s.grupo.as_str());
    let mut body = group_selector(&view.grupos, selected);
    match &view.actual {
        Some(schedule) => body.push_str(&schedule_table(schedule)),
        None => body.push_str(r#"<p class="empty-state">Selecciona un grupo para ver su horario.</p>"#),
    }

    page(body)
}

fn group_selector(grupos: &[String], selected: Option<&str>) -> String {
    let mut options = String::from(r#"<option value="">Seleccionar grupo...</option>"#);
    for grupo in grupos {
        let attr = if Some(grupo.as_str()) == selected { " selected" } else { "" };
        options.push_str(&format!(
            r#"<option value="{g}"{attr}>{g}</option>"#,
            g = esc(grupo)
        ));
    }
    format!(
        r#"<section class="card"><form method="get" action="/horarios"><select id="grupoSelect" name="grupo">{}</select> <button class="btn" id="btnCargarHorario">Cargar horario</button></form></section>"#,
        options
    )
}

/// Weekly grid: one row per franja, one column per weekday.
pub(crate) fn schedule_table(schedule: &GroupSchedule) -> String {
    let mut rows = String::new();
    for franja in schedule.franjas() {
        rows.push_str(&format!(r#"<tr><td class="hora-column">{}</td>"#, esc(&franja)));
        for dia in DIAS {
            match schedule.slot(dia, &franja) {
                Some(slot) => rows.push_str(&format!("<td>{}</td>", slot_cell(slot))),
                None => rows.push_str("<td></td>"),
            }
        }
        rows.push_str("</tr>");
    }

    let header: String = DIAS.iter().map(|d| format!("<th>{}</th>", d)).collect();
    format!(
        r#"<section id="horarioSection" class="card"><h2 id="horarioTitulo">Horario - {}</h2><a class="btn" href="/exportar/excel">Exportar a Excel</a><table><thead><tr><th>Hora</th>{}</tr></thead><tbody id="horarioTableBody">{}</tbody></table></section>"#,
        esc(&schedule.grupo),
        header,
        rows
    )
}

fn slot_cell(slot: &GroupSlot) -> String {
    const SIN_ASIGNAR: &str = "Sin asignar";
    let curso = slot.curso.as_deref().unwrap_or(SIN_ASIGNAR);
    let profesor = slot.profesor.as_ref().map_or(SIN_ASIGNAR, |p| p.name());
    let aula = slot.aula.as_ref().map_or(SIN_ASIGNAR, |a| a.name());
    format!(
        r#"<div class="clase-cell"><div class="clase-nombre">{}</div><div class="clase-profesor">{}</div><div class="clase-aula">{}</div></div>"#,
        esc(curso),
        esc(profesor),
        esc(aula)
    )
}
