use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Error,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Info => "info",
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            NotificationKind::Success => "check-circle",
            NotificationKind::Error => "times-circle",
            NotificationKind::Info => "info-circle",
        }
    }
}

/// Where a notification is in its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Visible,
    /// Playing the reverse slide-in before removal.
    Leaving,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub kind: NotificationKind,
    pub created_at: Instant,
}

#[derive(Debug, Clone, Serialize)]
pub struct VisibleNotification {
    pub id: u64,
    pub message: String,
    pub kind: NotificationKind,
    pub phase: Phase,
    /// Time left until the notification is removed.
    #[serde(skip)]
    pub remaining: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    pub dismiss_after_ms: u64,
    pub leave_animation_ms: u64,
    pub max_visible: usize,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            dismiss_after_ms: 5000,
            leave_animation_ms: 300,
            max_visible: 8,
        }
    }
}

/// Transient, auto-dismissing status messages.
///
/// Expired entries are pruned lazily whenever the surface is read or written.
pub struct Notifier {
    entries: Mutex<Vec<Notification>>,
    next_id: AtomicU64,
    dismiss_after: Duration,
    leave_animation: Duration,
    max_visible: usize,
}

impl Notifier {
    pub fn new(config: &NotifierConfig) -> Arc<Self> {
        Arc::new(Self {
            entries: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            dismiss_after: Duration::from_millis(config.dismiss_after_ms),
            leave_animation: Duration::from_millis(config.leave_animation_ms),
            max_visible: config.max_visible.max(1),
        })
    }

    pub fn notify(&self, message: impl Into<String>, kind: NotificationKind) -> u64 {
        self.notify_at(message, kind, Instant::now())
    }

    pub fn info(&self, message: impl Into<String>) -> u64 {
        self.notify(message, NotificationKind::Info)
    }

    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.notify(message, NotificationKind::Success)
    }

    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.notify(message, NotificationKind::Error)
    }

    pub fn notify_at(&self, message: impl Into<String>, kind: NotificationKind, now: Instant) -> u64 {
        let message = message.into();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        match kind {
            NotificationKind::Error => tracing::warn!(id, %message, "notification"),
            _ => tracing::debug!(id, kind = kind.as_str(), %message, "notification"),
        }

        let mut entries = self.entries.lock();
        self.prune(&mut entries, now);
        entries.push(Notification {
            id,
            message,
            kind,
            created_at: now,
        });
        if entries.len() > self.max_visible {
            let overflow = entries.len() - self.max_visible;
            entries.drain(..overflow);
        }
        id
    }

    /// Dismiss a notification right away (the close button).
    pub fn dismiss(&self, id: u64) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|n| n.id != id);
        entries.len() != before
    }

    pub fn visible(&self) -> Vec<VisibleNotification> {
        self.visible_at(Instant::now())
    }

    pub fn visible_at(&self, now: Instant) -> Vec<VisibleNotification> {
        let mut entries = self.entries.lock();
        self.prune(&mut entries, now);

        let lifetime = self.lifetime();
        entries
            .iter()
            .map(|n| {
                let age = now.saturating_duration_since(n.created_at);
                let phase = if age < self.dismiss_after {
                    Phase::Visible
                } else {
                    Phase::Leaving
                };
                VisibleNotification {
                    id: n.id,
                    message: n.message.clone(),
                    kind: n.kind,
                    phase,
                    remaining: lifetime.saturating_sub(age),
                }
            })
            .collect()
    }

    /// Number of notifications of a given kind still on screen.
    pub fn count(&self, kind: NotificationKind) -> usize {
        self.visible().iter().filter(|n| n.kind == kind).count()
    }

    pub fn dismiss_after(&self) -> Duration {
        self.dismiss_after
    }

    pub fn leave_animation(&self) -> Duration {
        self.leave_animation
    }

    fn lifetime(&self) -> Duration {
        self.dismiss_after + self.leave_animation
    }

    fn prune(&self, entries: &mut Vec<Notification>, now: Instant) {
        let lifetime = self.lifetime();
        entries.retain(|n| now.saturating_duration_since(n.created_at) < lifetime);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notifier() -> Arc<Notifier> {
        Notifier::new(&NotifierConfig::default())
    }

    #[test]
    fn test_phases_follow_timing() {
        let n = notifier();
        let t0 = Instant::now();
        n.notify_at("Archivo procesado correctamente", NotificationKind::Success, t0);

        let shown = n.visible_at(t0 + Duration::from_millis(4999));
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].phase, Phase::Visible);

        let leaving = n.visible_at(t0 + Duration::from_millis(5100));
        assert_eq!(leaving[0].phase, Phase::Leaving);
        assert_eq!(leaving[0].remaining, Duration::from_millis(200));

        assert!(n.visible_at(t0 + Duration::from_millis(5300)).is_empty());
    }

    #[test]
    fn test_notifications_stack_in_order() {
        let n = notifier();
        let t0 = Instant::now();
        n.notify_at("uno", NotificationKind::Info, t0);
        n.notify_at("dos", NotificationKind::Error, t0 + Duration::from_millis(10));

        let shown = n.visible_at(t0 + Duration::from_millis(20));
        let messages: Vec<_> = shown.iter().map(|v| v.message.as_str()).collect();
        assert_eq!(messages, vec!["uno", "dos"]);
    }

    #[test]
    fn test_cap_drops_oldest() {
        let n = Notifier::new(&NotifierConfig {
            max_visible: 2,
            ..Default::default()
        });
        let t0 = Instant::now();
        n.notify_at("a", NotificationKind::Info, t0);
        n.notify_at("b", NotificationKind::Info, t0);
        n.notify_at("c", NotificationKind::Info, t0);

        let shown = n.visible_at(t0);
        assert_eq!(shown.len(), 2);
        assert_eq!(shown[0].message, "b");
        assert_eq!(shown[1].message, "c");
    }

    #[test]
    fn test_dismiss() {
        let n = notifier();
        let id = n.info("hola");
        assert!(n.dismiss(id));
        assert!(!n.dismiss(id));
        assert!(n.visible().is_empty());
    }
}
