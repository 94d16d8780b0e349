pub mod exportar;
pub mod grafo;
pub mod horarios;
pub mod inicio;
pub mod profesor;
pub mod reporte;

use client::schema::SystemStatus;

use crate::AppState;

/// Status of the backend when schedules exist. Otherwise posts `message` as
/// an info notification and returns `None` so the page shows its empty state.
pub(crate) async fn require_schedules(state: &AppState, message: &str) -> Option<SystemStatus> {
    match state.api.estado().await {
        Ok(estado) if estado.horarios_generados => Some(estado),
        // A failed status call was already reported as an error.
        _ => {
            state.notifier.info(message);
            None
        }
    }
}
