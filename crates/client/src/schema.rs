//! Response shapes of the scheduling backend.
//!
//! Fields the backend may omit are `Option` or `#[serde(default)]` here, so a
//! body that deserializes is safe to render without further probing. Anything
//! else is reported as [`crate::ApiError::MalformedResponse`].

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

pub use graph::{ConflictKind, GraphEdge, GraphInput, GraphNode, NodeId};

/// Weekdays shown in timetables, in display order.
pub const DIAS: [&str; 5] = ["Lunes", "Martes", "Miércoles", "Jueves", "Viernes"];

/// Position of a weekday in [`DIAS`]; unknown days sort last.
pub fn weekday_index(dia: &str) -> usize {
    DIAS.iter().position(|d| *d == dia).unwrap_or(DIAS.len())
}

/// Spanish display name for an English weekday key.
pub fn format_day(day: &str) -> String {
    match day.to_lowercase().as_str() {
        "monday" => "Lunes".to_string(),
        "tuesday" => "Martes".to_string(),
        "wednesday" => "Miércoles".to_string(),
        "thursday" => "Jueves".to_string(),
        "friday" => "Viernes".to_string(),
        "saturday" => "Sábado".to_string(),
        "sunday" => "Domingo".to_string(),
        _ => day.to_string(),
    }
}

/// Leading hour of a time band label such as `"7:00-8:30"`.
pub fn franja_start_hour(franja: &str) -> Option<u32> {
    franja.split(':').next()?.trim().parse().ok()
}

// ========== /api/estado ==========

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemStatus {
    pub datos_cargados: bool,
    pub horarios_generados: bool,
    #[serde(default)]
    pub total_cursos: usize,
    #[serde(default)]
    pub total_profesores: usize,
    #[serde(default)]
    pub total_grupos: usize,
    #[serde(default)]
    pub total_aulas: usize,
    #[serde(default)]
    pub grupos: Vec<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

// ========== /api/grupos, /api/horario/{grupo} ==========

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupList {
    #[serde(default)]
    pub grupos: Vec<String>,
}

/// Teachers and rooms arrive either as a bare name or as `{ "nombre": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NamedRef {
    Name(String),
    Object { nombre: String },
}

impl NamedRef {
    pub fn name(&self) -> &str {
        match self {
            NamedRef::Name(n) => n,
            NamedRef::Object { nombre } => nombre,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSlot {
    pub franja: String,
    #[serde(default)]
    pub curso: Option<String>,
    #[serde(default)]
    pub profesor: Option<NamedRef>,
    #[serde(default)]
    pub aula: Option<NamedRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSchedule {
    pub grupo: String,
    #[serde(default)]
    pub dias: BTreeMap<String, Vec<GroupSlot>>,
}

impl GroupSchedule {
    /// Distinct franjas across the week, ordered by leading hour.
    pub fn franjas(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut franjas: Vec<String> = self
            .dias
            .values()
            .flatten()
            .filter(|slot| seen.insert(slot.franja.clone()))
            .map(|slot| slot.franja.clone())
            .collect();
        franjas.sort_by_key(|f| franja_start_hour(f).unwrap_or(u32::MAX));
        franjas
    }

    pub fn slot(&self, dia: &str, franja: &str) -> Option<&GroupSlot> {
        self.dias.get(dia)?.iter().find(|s| s.franja == franja)
    }
}

// ========== /api/profesores, /api/profesor/{nombre} ==========

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Teacher {
    pub nombre: String,
    #[serde(default, alias = "cursos_asignados")]
    pub cursos: Vec<NodeId>,
    #[serde(default)]
    pub horas_asignadas: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeacherList {
    #[serde(default)]
    pub profesores: Vec<Teacher>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeacherClass {
    pub dia: String,
    pub franja: String,
    pub curso: String,
    pub grupo: String,
    #[serde(default)]
    pub aula: Option<NamedRef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeacherInfo {
    #[serde(default)]
    pub curso: Option<String>,
    #[serde(default)]
    pub horas_asignadas: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeacherSchedule {
    pub profesor: String,
    #[serde(default)]
    pub info: Option<TeacherInfo>,
    #[serde(default)]
    pub clases: Vec<TeacherClass>,
    #[serde(default)]
    pub horario_por_dia: BTreeMap<String, Vec<TeacherClass>>,
    #[serde(default)]
    pub total_clases: usize,
}

impl TeacherSchedule {
    /// Classes ordered by weekday; order within a day is preserved.
    pub fn classes_by_weekday(&self) -> Vec<&TeacherClass> {
        let mut clases: Vec<&TeacherClass> = self.clases.iter().collect();
        clases.sort_by_key(|c| weekday_index(&c.dia));
        clases
    }

    pub fn is_busy(&self, dia: &str, franja: &str) -> bool {
        self.horario_por_dia
            .get(dia)
            .is_some_and(|clases| clases.iter().any(|c| c.franja == franja))
    }
}

// ========== /api/grafo ==========

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphStats {
    #[serde(default)]
    pub total_nodos: Option<usize>,
    #[serde(default)]
    pub total_conexiones: Option<usize>,
    #[serde(default)]
    pub total_conflictos: Option<usize>,
}

/// Raw `/api/grafo` body. Edges come as `conexiones`, `enlaces` or both.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphPayload {
    pub nodos: Vec<GraphNode>,
    #[serde(default)]
    pub conexiones: Option<Vec<GraphEdge>>,
    #[serde(default)]
    pub enlaces: Option<Vec<GraphEdge>>,
    #[serde(default)]
    pub estadisticas: Option<GraphStats>,
}

/// Validated conflict graph with resolved statistics.
#[derive(Debug, Clone, Serialize)]
pub struct ConflictGraph {
    pub input: GraphInput,
    pub total_nodos: usize,
    pub total_conexiones: usize,
    pub total_conflictos: usize,
}

impl GraphPayload {
    pub fn into_graph(self) -> Result<ConflictGraph, String> {
        let mut ids = HashSet::new();
        for node in &self.nodos {
            if !ids.insert(&node.id) {
                return Err(format!("id de nodo duplicado: {}", node.id));
            }
        }

        let edges = self.conexiones.or(self.enlaces).unwrap_or_default();
        let stats = self.estadisticas.unwrap_or_default();

        Ok(ConflictGraph {
            total_nodos: stats.total_nodos.unwrap_or(self.nodos.len()),
            total_conexiones: stats.total_conexiones.unwrap_or(edges.len()),
            total_conflictos: stats.total_conflictos.unwrap_or(0),
            input: GraphInput {
                nodes: self.nodos,
                edges,
            },
        })
    }
}

// ========== /api/validacion ==========

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintCheck {
    pub tipo: String,
    #[serde(default)]
    pub descripcion: String,
    pub cumplida: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Advisory {
    pub tipo: String,
    #[serde(alias = "sugerencia")]
    pub mensaje: String,
}

impl Advisory {
    pub fn is_warning(&self) -> bool {
        self.tipo == "warning"
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    #[serde(default, alias = "restricciones_cumplidas")]
    pub restricciones: Vec<ConstraintCheck>,
    #[serde(default)]
    pub optimizaciones: Vec<Advisory>,
    #[serde(default)]
    pub conflictos_criticos: usize,
}

impl ValidationReport {
    pub fn cumplidas(&self) -> usize {
        self.restricciones.iter().filter(|r| r.cumplida).count()
    }

    /// Percentage of satisfied constraints, rounded; 0 when there are none.
    pub fn eficiencia(&self) -> u32 {
        let total = self.restricciones.len();
        if total == 0 {
            return 0;
        }
        ((self.cumplidas() as f64 / total as f64) * 100.0).round() as u32
    }
}

// ========== /api/upload, /api/generar-horarios ==========

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadSummary {
    #[serde(default)]
    pub cursos: usize,
    #[serde(default)]
    pub profesores: usize,
    #[serde(default)]
    pub grupos: usize,
    #[serde(default)]
    pub aulas: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    #[serde(default)]
    pub mensaje: Option<String>,
    #[serde(default)]
    pub resumen: Option<UploadSummary>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationStats {
    #[serde(default)]
    pub grupos: usize,
    #[serde(default)]
    pub cursos_asignados: usize,
    #[serde(default)]
    pub total_cursos: usize,
    #[serde(default)]
    pub conflictos_detectados: usize,
}

impl GenerationStats {
    pub fn summary(&self) -> String {
        format!(
            "Se generaron horarios para {} grupos con {} de {} cursos asignados.",
            self.grupos, self.cursos_asignados, self.total_cursos
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub success: bool,
    #[serde(default)]
    pub mensaje: Option<String>,
    #[serde(default)]
    pub estadisticas: Option<GenerationStats>,
}

// ========== /api/exportar/{formato} ==========

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Excel,
    Json,
}

impl ExportFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "pdf" => Some(ExportFormat::Pdf),
            "excel" | "xlsx" => Some(ExportFormat::Excel),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }

    /// Path segment understood by the backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Excel => "excel",
            ExportFormat::Json => "json",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Excel => "xlsx",
            ExportFormat::Json => "json",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Excel => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            ExportFormat::Json => "application/json",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_franjas_sorted_by_leading_hour() {
        let schedule: GroupSchedule = serde_json::from_value(json!({
            "grupo": "ITI-1V",
            "dias": {
                "Lunes": [
                    {"franja": "10:00-11:30", "curso": "Redes", "profesor": "Ana", "aula": "A1"},
                    {"franja": "7:00-8:30", "curso": "Cálculo", "profesor": {"nombre": "Luis"}, "aula": {"nombre": "A2"}}
                ],
                "Martes": [
                    {"franja": "8:30-10:00", "curso": "Física"},
                    {"franja": "10:00-11:30", "curso": "Redes"}
                ]
            }
        }))
        .unwrap();

        assert_eq!(schedule.franjas(), vec!["7:00-8:30", "8:30-10:00", "10:00-11:30"]);

        let slot = schedule.slot("Lunes", "7:00-8:30").unwrap();
        assert_eq!(slot.profesor.as_ref().map(NamedRef::name), Some("Luis"));
        assert_eq!(slot.aula.as_ref().map(NamedRef::name), Some("A2"));
        assert!(schedule.slot("Martes", "8:30-10:00").unwrap().profesor.is_none());
        assert!(schedule.slot("Viernes", "7:00-8:30").is_none());
    }

    #[test]
    fn test_graph_payload_prefers_conexiones() {
        let payload: GraphPayload = serde_json::from_value(json!({
            "nodos": [
                {"id": 1, "nombre": "A", "grupo": "G1", "horas": 4},
                {"id": 2, "nombre": "B", "grupo": "G1", "horas": 3}
            ],
            "conexiones": [{"source": 1, "target": 2, "tipo": "profesor"}],
            "enlaces": []
        }))
        .unwrap();

        let graph = payload.into_graph().unwrap();
        assert_eq!(graph.input.edges.len(), 1);
        assert_eq!(graph.total_nodos, 2);
        assert_eq!(graph.total_conexiones, 1);
        assert_eq!(graph.total_conflictos, 0);
    }

    #[test]
    fn test_graph_payload_rejects_duplicate_ids() {
        let payload: GraphPayload = serde_json::from_value(json!({
            "nodos": [
                {"id": "C1", "nombre": "A"},
                {"id": "C1", "nombre": "B"}
            ]
        }))
        .unwrap();

        let err = payload.into_graph().unwrap_err();
        assert!(err.contains("C1"));
    }

    #[test]
    fn test_validation_report_accepts_backend_aliases() {
        let report: ValidationReport = serde_json::from_value(json!({
            "restricciones_cumplidas": [
                {"tipo": "Profesores", "cumplida": true, "descripcion": "ok"},
                {"tipo": "Aulas", "cumplida": false, "descripcion": "choque"},
                {"tipo": "Grupos", "cumplida": true, "descripcion": "ok"}
            ],
            "optimizaciones": [{"tipo": "Distribución", "sugerencia": "Horarios distribuidos uniformemente"}]
        }))
        .unwrap();

        assert_eq!(report.cumplidas(), 2);
        assert_eq!(report.eficiencia(), 67);
        assert_eq!(report.optimizaciones[0].mensaje, "Horarios distribuidos uniformemente");
        assert_eq!(report.conflictos_criticos, 0);
        assert_eq!(ValidationReport::default().eficiencia(), 0);
    }

    #[test]
    fn test_teacher_classes_sorted_by_weekday() {
        let schedule: TeacherSchedule = serde_json::from_value(json!({
            "profesor": "Ana",
            "clases": [
                {"dia": "Jueves", "franja": "7:00-8:30", "curso": "Redes", "grupo": "ITI-1V", "aula": "A1"},
                {"dia": "Lunes", "franja": "8:30-10:00", "curso": "Redes", "grupo": "ITI-2V", "aula": "A1"}
            ],
            "horario_por_dia": {
                "Lunes": [{"dia": "Lunes", "franja": "8:30-10:00", "curso": "Redes", "grupo": "ITI-2V"}]
            },
            "total_clases": 2
        }))
        .unwrap();

        let dias: Vec<_> = schedule.classes_by_weekday().iter().map(|c| c.dia.as_str()).collect();
        assert_eq!(dias, vec!["Lunes", "Jueves"]);
        assert!(schedule.is_busy("Lunes", "8:30-10:00"));
        assert!(!schedule.is_busy("Jueves", "7:00-8:30"));
    }

    #[test]
    fn test_helpers() {
        assert_eq!(franja_start_hour("19:00-20:30"), Some(19));
        assert_eq!(franja_start_hour("mañana"), None);
        assert_eq!(format_day("Wednesday"), "Miércoles");
        assert_eq!(format_day("Lunes"), "Lunes");
        assert_eq!(ExportFormat::parse("EXCEL"), Some(ExportFormat::Excel));
        assert_eq!(ExportFormat::Excel.extension(), "xlsx");
        assert!(ExportFormat::parse("csv").is_none());
    }
}
