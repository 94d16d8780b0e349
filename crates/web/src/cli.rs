//! Command line entry points. `serve` runs the web front end, the other
//! subcommands drive the backend directly and write results to disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use client::schema::ExportFormat;
use client::{ApiClient, NotificationKind, Notifier};
use graph::{EdgeFilter, GraphView};

use crate::config::{AppConfig, GraphConfig};

#[derive(Parser, Debug)]
#[command(name = "horarios")]
#[command(about = "Web front end and CLI for the ITI scheduling backend", long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Backend origin, overrides `backend.base_url`
    #[arg(long, env = "HORARIOS_BACKEND_URL")]
    pub base_url: Option<String>,

    /// Address for `serve`, overrides `server.listen`
    #[arg(long, env = "HORARIOS_LISTEN")]
    pub listen: Option<String>,

    /// Log JSON lines instead of the human format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run the web front end (default)
    Serve,
    /// Print the backend status
    Estado,
    /// Upload a course spreadsheet or CSV
    Subir { archivo: PathBuf },
    /// Ask the backend to generate schedules
    Generar,
    /// Download an export (pdf, excel or json)
    Exportar {
        formato: String,
        #[arg(short, long, default_value = ".")]
        salida: PathBuf,
    },
    /// Lay out the conflict graph and write it as SVG
    Grafo {
        /// Edge filter: todos, profesor or horario
        #[arg(long, default_value = "todos")]
        tipo: String,
        #[arg(short, long, default_value = ".")]
        salida: PathBuf,
    },
}

impl Cli {
    /// Load the config file and apply command line overrides.
    pub fn app_config(&self) -> Result<AppConfig> {
        let mut config = AppConfig::load_or_default(self.config.as_deref())?;
        if let Some(base_url) = &self.base_url {
            config.backend.base_url = base_url.clone();
        }
        if let Some(listen) = &self.listen {
            config.server.listen = listen.clone();
        }
        if self.json_logs {
            config.server.json_logs = true;
        }
        Ok(config)
    }
}

/// Run every subcommand except `serve`.
pub async fn run(command: Command, config: &AppConfig) -> Result<()> {
    let notifier = Notifier::new(&config.notifications);
    let api = ApiClient::from_config(&config.backend, notifier.clone())
        .context("Failed to build backend client")?;

    let result = dispatch(command, &api, &config.graph).await;
    print_notifications(&notifier);
    result
}

async fn dispatch(command: Command, api: &ApiClient, graph: &GraphConfig) -> Result<()> {
    match command {
        Command::Serve => bail!("serve is handled by the binary"),
        Command::Estado => {
            let estado = api.estado().await?;
            println!("{}", serde_json::to_string_pretty(&estado)?);
        }
        Command::Subir { archivo } => {
            let response = api.upload_path(&archivo).await?;
            if !response.success {
                bail!(
                    "{}",
                    response
                        .mensaje
                        .unwrap_or_else(|| "Error al procesar archivo".to_string())
                );
            }
            api.notifier().success("Archivo procesado correctamente");
            if let Some(resumen) = response.resumen {
                println!("{}", serde_json::to_string_pretty(&resumen)?);
            }
        }
        Command::Generar => {
            let response = api.generar_horarios().await?;
            if !response.success {
                bail!(
                    "{}",
                    response
                        .mensaje
                        .unwrap_or_else(|| "Error al generar horarios".to_string())
                );
            }
            api.notifier().success("Horarios generados exitosamente");
            if let Some(stats) = response.estadisticas {
                println!("{}", stats.summary());
            }
        }
        Command::Exportar { formato, salida } => {
            let path = exportar_a(api, &formato, &salida).await?;
            println!("{}", path.display());
        }
        Command::Grafo { tipo, salida } => {
            let path = grafo_a(api, graph, &tipo, &salida).await?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

/// Download an export into `dir` and return the written path.
pub async fn exportar_a(api: &ApiClient, formato: &str, dir: &Path) -> Result<PathBuf> {
    let Some(formato) = ExportFormat::parse(formato) else {
        bail!("Formato de exportación no soportado: {}", formato);
    };
    let file = api.exportar(formato).await?;
    let path = dir.join(&file.file_name);
    tokio::fs::write(&path, &file.bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Fetch the conflict graph, lay it out with `tipo` applied and write the
/// SVG into `dir`.
pub async fn grafo_a(api: &ApiClient, config: &GraphConfig, tipo: &str, dir: &Path) -> Result<PathBuf> {
    let datos = api.grafo().await?;
    let mut view = GraphView::new(config.view_config());
    let summary = view.render(&datos.input.filtered(EdgeFilter::parse(tipo)));
    tracing::info!(
        nodes = summary.nodes,
        edges = summary.edges,
        ticks = summary.ticks,
        "graph laid out"
    );

    let export = view.export_svg()?;
    let path = dir.join(&export.file_name);
    tokio::fs::write(&path, export.markup.as_bytes())
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    api.notifier().success("Grafo descargado exitosamente");
    Ok(path)
}

fn print_notifications(notifier: &Notifier) {
    for n in notifier.visible() {
        let tag = match n.kind {
            NotificationKind::Info => "info",
            NotificationKind::Success => "ok",
            NotificationKind::Error => "error",
        };
        eprintln!("[{}] {}", tag, n.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::parse_from(["horarios", "exportar", "pdf", "-s", "/tmp"]);
        assert_eq!(
            cli.command,
            Some(Command::Exportar {
                formato: "pdf".to_string(),
                salida: PathBuf::from("/tmp"),
            })
        );

        let cli = Cli::parse_from(["horarios", "--base-url", "http://b:5000", "grafo", "--tipo", "horario"]);
        assert_eq!(cli.base_url.as_deref(), Some("http://b:5000"));
        assert!(matches!(cli.command, Some(Command::Grafo { ref tipo, .. }) if tipo == "horario"));

        assert_eq!(Cli::parse_from(["horarios"]).command, None);
    }

    #[test]
    fn test_overrides_beat_config() {
        let cli = Cli::parse_from(["horarios", "--listen", "0.0.0.0:9000", "--json-logs", "serve"]);
        let config = cli.app_config().unwrap();
        assert_eq!(config.server.listen, "0.0.0.0:9000");
        assert!(config.server.json_logs);
        assert_eq!(config.backend.base_url, "http://localhost:5000");
    }
}
