//! Standalone web server binary
//!
//! Usage: cargo run -p pointrush_web --bin pointrush-server -- --port 5000

use clap::Parser;
use pointrush_web::{init_logging, load_with_sources, ConfigOverrides, LogFormat, WebServer};

#[derive(Debug, Parser)]
#[command(name = "pointrush-server", about = "Serve the Point Rush card game", version)]
struct Cli {
    #[command(flatten)]
    overrides: ConfigOverrides,
    /// Log output format
    #[arg(long = "log-format", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.log_format)?;

    let resolved = load_with_sources(&cli.overrides)?;
    tracing::info!(
        host = %resolved.config.host,
        port = resolved.config.port,
        deck = %resolved.config.deck_path.display(),
        static_dir = %resolved.config.static_dir.display(),
        sources = ?resolved.sources,
        "configuration resolved"
    );

    let server = WebServer::new(resolved.config)?;
    let handle = server.start().await?;

    tokio::signal::ctrl_c().await?;

    tracing::info!("shutting down");
    handle.shutdown().await?;
    Ok(())
}
