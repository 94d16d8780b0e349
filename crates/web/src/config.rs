use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use client::{ClientConfig, NotifierConfig};
use graph::{ViewConfig, Viewport};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: ClientConfig,
    pub server: ServerConfig,
    pub notifications: NotifierConfig,
    pub graph: GraphConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
    /// Emit logs as JSON lines instead of the human format.
    pub json_logs: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub width: f64,
    pub height: f64,
    pub max_ticks: usize,
    pub drag_ticks: usize,
    /// Fixed seed for reproducible layouts.
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8080".to_string(),
            json_logs: false,
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        let view = ViewConfig::default();
        Self {
            width: view.viewport.width,
            height: view.viewport.height,
            max_ticks: view.max_ticks,
            drag_ticks: view.drag_ticks,
            seed: None,
        }
    }
}

impl GraphConfig {
    pub fn view_config(&self) -> ViewConfig {
        ViewConfig {
            viewport: Viewport::new(self.width, self.height),
            max_ticks: self.max_ticks,
            drag_ticks: self.drag_ticks,
            seed: self.seed,
        }
    }
}

impl AppConfig {
    /// Read a TOML file; missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Load `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.backend.base_url, "http://localhost:5000");
        assert_eq!(config.notifications.max_visible, 8);
        assert_eq!(config.notifications.dismiss_after_ms, 5000);
        assert_eq!(config.graph.max_ticks, 300);
        assert_eq!(config.server.listen, "127.0.0.1:8080");
    }

    #[test]
    fn test_partial_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[backend]\nbase_url = \"http://horarios:5000\"\n\n[graph]\nwidth = 640.0\nseed = 9\n"
        )
        .unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.backend.base_url, "http://horarios:5000");
        assert_eq!(config.backend.connect_timeout_secs, 10);
        assert_eq!(config.graph.width, 640.0);
        assert_eq!(config.graph.height, 700.0);
        assert_eq!(config.graph.view_config().seed, Some(9));
        assert_eq!(config.notifications.leave_animation_ms, 300);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = AppConfig::load(Path::new("/nonexistent/horarios.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
