use std::collections::HashMap;

use axum::Form;
use axum::extract::{Query, State};
use axum::response::{Html, Redirect};
use serde::Deserialize;

use client::schema::{DIAS, Teacher, TeacherSchedule};

use crate::AppState;
use crate::layout::{self, Nav, esc};
use crate::pages::require_schedules;

/// Time bands shown in the availability grid.
pub const FRANJAS: [&str; 9] = [
    "7:00-8:30",
    "8:30-10:00",
    "10:00-11:30",
    "11:30-13:00",
    "13:00-14:30",
    "14:30-16:00",
    "16:00-17:30",
    "17:30-19:00",
    "19:00-20:30",
];

/// Local availability edits layered over the teacher's classes. Never sent
/// to the backend.
#[derive(Debug, Default, Clone)]
pub struct Availability {
    overrides: HashMap<(String, String), bool>,
}

impl Availability {
    pub fn is_busy(&self, schedule: &TeacherSchedule, dia: &str, franja: &str) -> bool {
        self.overrides
            .get(&(dia.to_string(), franja.to_string()))
            .copied()
            .unwrap_or_else(|| schedule.is_busy(dia, franja))
    }

    /// Flip a cell and return whether it is now busy.
    pub fn toggle(&mut self, schedule: &TeacherSchedule, dia: &str, franja: &str) -> bool {
        let busy = !self.is_busy(schedule, dia, franja);
        self.overrides
            .insert((dia.to_string(), franja.to_string()), busy);
        busy
    }
}

#[derive(Debug, Default)]
pub struct ProfesorState {
    pub profesores: Vec<Teacher>,
    pub actual: Option<TeacherSchedule>,
    pub disponibilidad: Availability,
}

#[derive(Debug, Deserialize)]
pub struct ProfesorQuery {
    pub nombre: Option<String>,
    /// Case-insensitive roster search.
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ToggleForm {
    pub dia: String,
    pub franja: String,
}

pub async fn show(State(state): State<AppState>, Query(query): Query<ProfesorQuery>) -> Html<String> {
    let page = |body: String| layout::page("Profesores", Nav::Profesor, &body, &state.notifier);

    if require_schedules(&state, "No hay horarios generados.").await.is_none() {
        return page(layout::empty_state("No hay horarios generados"));
    }

    let profesores = match state.api.profesores().await {
        Ok(list) if !list.profesores.is_empty() => list.profesores,
        _ => return page(layout::empty_state("No hay profesores registrados")),
    };

    let schedule = match query.nombre.as_deref().map(str::trim) {
        Some("") => {
            state.notifier.error("Selecciona un profesor");
            None
        }
        Some(nombre) => state.api.profesor(nombre).await.ok(),
        None => None,
    };

    let mut view = state.profesor.write().await;
    view.profesores = profesores;
    if let Some(schedule) = schedule {
        view.actual = Some(schedule);
        view.disponibilidad = Availability::default();
    }

    let busqueda = query.q.unwrap_or_default();
    let visibles = filter_teachers(&view.profesores, &busqueda);

    let mut body = String::new();
    if let Some(actual) = &view.actual {
        body.push_str(&teacher_section(actual, &view.disponibilidad));
    }
    body.push_str(&roster(&visibles, &busqueda));

    page(body)
}

pub async fn toggle(State(state): State<AppState>, Form(form): Form<ToggleForm>) -> Redirect {
    let mut view = state.profesor.write().await;
    let ProfesorState {
        actual,
        disponibilidad,
        ..
    } = &mut *view;
    let Some(actual) = actual.as_ref() else {
        return Redirect::to("/profesor");
    };
    if !DIAS.contains(&form.dia.as_str()) || !FRANJAS.contains(&form.franja.as_str()) {
        state
            .notifier
            .error(format!("Franja inválida: {} {}", form.dia, form.franja));
        return Redirect::to("/profesor");
    }

    if disponibilidad.toggle(actual, &form.dia, &form.franja) {
        state
            .notifier
            .info(format!("{} {} marcado como OCUPADO", form.dia, form.franja));
    } else {
        state
            .notifier
            .success(format!("{} {} marcado como DISPONIBLE", form.dia, form.franja));
    }
    tracing::debug!(profesor = %actual.profesor, dia = %form.dia, franja = %form.franja, "availability toggled");
    Redirect::to("/profesor")
}

pub fn filter_teachers<'a>(profesores: &'a [Teacher], busqueda: &str) -> Vec<&'a Teacher> {
    let needle = busqueda.trim().to_lowercase();
    profesores
        .iter()
        .filter(|p| p.nombre.to_lowercase().contains(&needle))
        .collect()
}

fn roster(profesores: &[&Teacher], busqueda: &str) -> String {
    let cards: String = profesores
        .iter()
        .map(|p| {
            format!(
                r#"<form class="profesor-card" method="get" action="/profesor"><input type="hidden" name="nombre" value="{n}"><button class="btn-link"><h4>{n}</h4><p>{} cursos</p><p>{} horas</p></button></form>"#,
                p.cursos.len(),
                p.horas_asignadas,
                n = esc(&p.nombre),
            )
        })
        .collect();
    format!(
        r#"<section id="listaProfesoresSection" class="card"><h2>Profesores</h2><form method="get" action="/profesor"><input id="searchProfesor" name="q" placeholder="Buscar profesor..." value="{}"> <button class="btn">Buscar</button></form><div id="profesoresGrid" class="profesores-grid">{}</div></section>"#,
        esc(busqueda),
        cards
    )
}

fn teacher_section(schedule: &TeacherSchedule, disponibilidad: &Availability) -> String {
    let info = schedule.info.clone().unwrap_or_default();
    let mut out = format!(
        r#"<section id="infoProfesorSection" class="card"><h2 id="profesorNombre">{}</h2><p id="profesorCurso">{}</p><div class="stats">{}{}</div><a class="btn" href="/exportar/pdf">Exportar a PDF</a>"#,
        esc(&schedule.profesor),
        esc(info.curso.as_deref().unwrap_or("")),
        layout::stat_card("Clases", schedule.total_clases),
        layout::stat_card("Horas asignadas", info.horas_asignadas.unwrap_or(0.0)),
    );

    out.push_str(r#"<h3>Clases asignadas</h3><div id="clasesContainer" class="clases-grid">"#);
    for clase in &schedule.clases {
        out.push_str(&format!(
            r#"<div class="clase-card"><h4>{}</h4><p>{}</p><p>{} - {}</p><p>{}</p></div>"#,
            esc(&clase.curso),
            esc(&clase.grupo),
            esc(&clase.dia),
            esc(&clase.franja),
            esc(clase.aula.as_ref().map_or("", |a| a.name())),
        ));
    }
    out.push_str("</div>");

    out.push_str(r#"<h3>Horario semanal</h3><table><thead><tr><th>Día</th><th>Franja</th><th>Curso</th><th>Grupo</th><th>Aula</th></tr></thead><tbody id="horarioProfesorBody">"#);
    for clase in schedule.classes_by_weekday() {
        out.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            esc(&clase.dia),
            esc(&clase.franja),
            esc(&clase.curso),
            esc(&clase.grupo),
            esc(clase.aula.as_ref().map_or("", |a| a.name())),
        ));
    }
    out.push_str("</tbody></table>");

    out.push_str(&availability_grid(schedule, disponibilidad));
    out.push_str("</section>");
    out
}

fn availability_grid(schedule: &TeacherSchedule, disponibilidad: &Availability) -> String {
    let mut out = String::from(r#"<h3>Disponibilidad</h3><div id="disponibilidadGrid" class="disp-grid"><div></div>"#);
    for dia in DIAS {
        let short: String = dia.chars().take(3).collect();
        out.push_str(&format!(r#"<div class="disp-dia">{}</div>"#, short));
    }
    for franja in FRANJAS {
        out.push_str(&format!(r#"<div class="disp-franja">{}</div>"#, franja));
        for dia in DIAS {
            let busy = disponibilidad.is_busy(schedule, dia, franja);
            let (class, title, mark) = if busy {
                ("ocupado", "Click para marcar como disponible", "✗")
            } else {
                ("libre", "Click para marcar como ocupado", "✓")
            };
            out.push_str(&format!(
                r#"<form class="disp-cell {class}" method="post" action="/profesor/disponibilidad"><input type="hidden" name="dia" value="{dia}"><input type="hidden" name="franja" value="{franja}"><button title="{title}">{mark}</button></form>"#
            ));
        }
    }
    out.push_str("</div>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schedule() -> TeacherSchedule {
        serde_json::from_value(json!({
            "profesor": "Ana Ruiz",
            "clases": [
                {"dia": "Miércoles", "franja": "8:30-10:00", "curso": "Redes", "grupo": "ITI-2V", "aula": "B1"},
                {"dia": "Lunes", "franja": "7:00-8:30", "curso": "Cálculo", "grupo": "ITI-1V", "aula": {"nombre": "A1"}}
            ],
            "horario_por_dia": {
                "Lunes": [{"dia": "Lunes", "franja": "7:00-8:30", "curso": "Cálculo", "grupo": "ITI-1V"}]
            },
            "total_clases": 2
        }))
        .unwrap()
    }

    #[test]
    fn test_toggle_overrides_schedule() {
        let schedule = schedule();
        let mut disponibilidad = Availability::default();

        assert!(disponibilidad.is_busy(&schedule, "Lunes", "7:00-8:30"));
        assert!(!disponibilidad.toggle(&schedule, "Lunes", "7:00-8:30"));
        assert!(!disponibilidad.is_busy(&schedule, "Lunes", "7:00-8:30"));
        assert!(disponibilidad.toggle(&schedule, "Lunes", "7:00-8:30"));

        assert!(disponibilidad.toggle(&schedule, "Viernes", "19:00-20:30"));
        assert!(disponibilidad.is_busy(&schedule, "Viernes", "19:00-20:30"));
    }

    #[test]
    fn test_grid_has_every_cell() {
        let html = availability_grid(&schedule(), &Availability::default());
        assert_eq!(html.matches(r#"class="disp-cell "#).count(), 45);
        assert_eq!(html.matches("disp-cell ocupado").count(), 1);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let profesores: Vec<Teacher> = serde_json::from_value(json!([
            {"nombre": "Ana Ruiz", "cursos": [1, 2], "horas_asignadas": 8},
            {"nombre": "Luis Pérez", "cursos_asignados": ["MAT-1"]}
        ]))
        .unwrap();

        let found = filter_teachers(&profesores, "  ANA ");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].nombre, "Ana Ruiz");
        assert_eq!(filter_teachers(&profesores, "").len(), 2);
        assert_eq!(filter_teachers(&profesores, "pérez")[0].cursos.len(), 1);
    }

    #[test]
    fn test_weekly_table_sorted_by_weekday() {
        let html = teacher_section(&schedule(), &Availability::default());
        let body = &html[html.find("horarioProfesorBody").unwrap()..];
        assert!(body.find("Lunes").unwrap() < body.find("Miércoles").unwrap());
        assert!(html.contains("A1"));
    }
}
