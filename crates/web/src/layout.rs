//! Page shell shared by every view: navigation, styles and the alert stack.

use std::borrow::Cow;
use std::fmt::Write;
use std::time::Duration;

use axum::response::Html;

use client::{Notifier, Phase, VisibleNotification};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    Inicio,
    Horarios,
    Profesor,
    Grafo,
    Reporte,
}

impl Nav {
    const ALL: [Nav; 5] = [Nav::Inicio, Nav::Horarios, Nav::Profesor, Nav::Grafo, Nav::Reporte];

    pub fn path(&self) -> &'static str {
        match self {
            Nav::Inicio => "/",
            Nav::Horarios => "/horarios",
            Nav::Profesor => "/profesor",
            Nav::Grafo => "/grafo",
            Nav::Reporte => "/reporte",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Nav::Inicio => "Inicio",
            Nav::Horarios => "Horarios",
            Nav::Profesor => "Profesores",
            Nav::Grafo => "Grafo de Conflictos",
            Nav::Reporte => "Reporte",
        }
    }
}

/// Escape text for HTML content and attribute values.
pub fn esc(raw: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(raw)
}

pub fn page(title: &str, active: Nav, body: &str, notifier: &Notifier) -> Html<String> {
    let mut out = String::with_capacity(body.len() + 4096);
    let _ = write!(
        out,
        r#"<!DOCTYPE html><html lang="es"><head><meta charset="utf-8"><meta name="viewport" content="width=device-width, initial-scale=1"><title>{} - Sistema de Horarios ITI</title><style>{}</style></head><body>"#,
        esc(title),
        STYLE
    );

    out.push_str(r#"<nav class="navbar"><span class="brand">Sistema de Horarios ITI</span><ul>"#);
    for nav in Nav::ALL {
        let class = if nav == active { " class=\"active\"" } else { "" };
        let _ = write!(out, r#"<li><a href="{}"{}>{}</a></li>"#, nav.path(), class, nav.label());
    }
    out.push_str("</ul></nav>");

    out.push_str(&alerts(&notifier.visible(), notifier.leave_animation()));
    let _ = write!(out, r#"<main class="container"><h1>{}</h1>{}</main>"#, esc(title), body);
    out.push_str("</body></html>");

    Html(out)
}

/// Fixed alert container. Each alert slides in, and slides back out during
/// its last `leave` of lifetime.
pub fn alerts(items: &[VisibleNotification], leave: Duration) -> String {
    let mut out = String::from(r#"<div id="alertContainer" class="alert-container">"#);
    let leave_ms = leave.as_millis();
    for n in items {
        let style = match n.phase {
            Phase::Visible => {
                let delay = n.remaining.as_millis().saturating_sub(leave_ms);
                format!(
                    "animation: slideIn 0.3s ease, slideIn {}ms ease {}ms reverse forwards",
                    leave_ms, delay
                )
            }
            Phase::Leaving => format!(
                "animation: slideIn {}ms ease reverse forwards",
                n.remaining.as_millis()
            ),
        };
        let phase = match n.phase {
            Phase::Visible => "visible",
            Phase::Leaving => "leaving",
        };
        let _ = write!(
            out,
            r#"<div class="alert alert-{kind} alert-{phase}" data-id="{id}" style="{style}"><i class="fas fa-{icon}"></i> <span>{msg}</span></div>"#,
            kind = n.kind.as_str(),
            id = n.id,
            icon = n.kind.icon(),
            msg = esc(&n.message),
        );
    }
    out.push_str("</div>");
    out
}

pub fn empty_state(message: &str) -> String {
    format!(
        r#"<div id="emptyState" class="empty-state"><i class="fas fa-calendar-times"></i><p>{}</p><a class="btn" href="/">Ir a Inicio</a></div>"#,
        esc(message)
    )
}

pub fn stat_card(label: &str, value: impl std::fmt::Display) -> String {
    format!(
        r#"<div class="stat-card"><span class="stat-value">{}</span><span class="stat-label">{}</span></div>"#,
        value,
        esc(label)
    )
}

const STYLE: &str = r#"
body { font-family: 'Segoe UI', sans-serif; margin: 0; background: #f5f5f5; color: #333; }
.navbar { display: flex; align-items: center; gap: 2rem; background: #6b3fa0; padding: 0.8rem 2rem; }
.navbar .brand { color: #fff; font-weight: bold; }
.navbar ul { display: flex; gap: 1rem; list-style: none; margin: 0; padding: 0; }
.navbar a { color: #e8dcf5; text-decoration: none; }
.navbar a.active { color: #fff; border-bottom: 2px solid #fff; }
.container { max-width: 1200px; margin: 0 auto; padding: 1.5rem; }
.card { background: #fff; border-radius: 8px; padding: 1.5rem; margin-bottom: 1.5rem; box-shadow: 0 2px 6px rgba(0,0,0,0.08); }
.btn { display: inline-block; background: #8e5bc5; color: #fff; border: none; border-radius: 5px; padding: 0.5rem 1rem; cursor: pointer; text-decoration: none; }
.btn-secondary { background: #95a5a6; }
.stats { display: flex; gap: 1rem; flex-wrap: wrap; }
.stat-card { background: #fff; border-radius: 8px; padding: 1rem 1.5rem; display: flex; flex-direction: column; min-width: 140px; }
.stat-value { font-size: 1.8rem; font-weight: bold; color: #6b3fa0; }
.empty-state { text-align: center; padding: 3rem; color: #666; }
table { width: 100%; border-collapse: collapse; background: #fff; }
th, td { border: 1px solid #e0e0e0; padding: 0.5rem; vertical-align: top; }
th { background: #6b3fa0; color: #fff; }
.hora-column { font-weight: bold; white-space: nowrap; }
.clase-cell { font-size: 0.85rem; }
.alert-container { position: fixed; top: 1rem; right: 1rem; z-index: 1000; display: flex; flex-direction: column; gap: 0.5rem; }
.alert { padding: 0.8rem 1.2rem; border-radius: 5px; color: #fff; min-width: 260px; }
.alert-info { background: #3498db; }
.alert-success { background: #27ae60; }
.alert-error { background: #e74c3c; }
@keyframes slideIn { from { transform: translateX(100%); opacity: 0; } to { transform: translateX(0); opacity: 1; } }
.disp-grid { display: grid; grid-template-columns: 120px repeat(5, 1fr); gap: 2px; }
.disp-cell button { width: 100%; border: none; padding: 0.4rem; cursor: pointer; }
.disp-cell.libre button { background: #d4edda; }
.disp-cell.ocupado button { background: #f8d7da; }
.grafo-container { background: #fff; border-radius: 8px; overflow: hidden; }
.restriccion-item.success, .recomendacion-item.success { border-left: 4px solid #27ae60; }
.restriccion-item.danger, .recomendacion-item.danger { border-left: 4px solid #e74c3c; }
.optimizacion-item.warning, .recomendacion-item.warning { border-left: 4px solid #f39c12; }
.optimizacion-item.info, .recomendacion-item.info { border-left: 4px solid #3498db; }
.restriccion-item, .optimizacion-item, .recomendacion-item { background: #fff; padding: 0.6rem 1rem; margin-bottom: 0.5rem; }
"#;
