use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use web::cli::{self, Cli, Command};
use web::config::AppConfig;
use web::{AppState, build_router};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let config = args.app_config()?;
    init_tracing(config.server.json_logs);

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&config).await,
        command => cli::run(command, &config).await,
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn serve(config: &AppConfig) -> Result<()> {
    info!(
        "Starting horarios web v{} (backend {})",
        env!("CARGO_PKG_VERSION"),
        config.backend.base_url
    );

    let state = AppState::from_config(config)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.listen))?;
    info!("Listening on http://{}", config.server.listen);

    axum::serve(listener, app).await?;
    Ok(())
}
