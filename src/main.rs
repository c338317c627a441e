//! CLI Entry Point for security-dashboard
//!
//! Connects to a home-security monitoring server and follows its event
//! stream headlessly. Everything the dashboard would display (statistics,
//! alerts, notifications, connection status) is written to the log.
//!
//! # Usage
//!
//! Follow a server:
//! ```bash
//! security-dashboard run --server camera.local:8000
//! ```
//!
//! Print the effective configuration:
//! ```bash
//! security-dashboard show-config --config security-dashboard.toml
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use security_dashboard::address::resolve_address;
use security_dashboard::config::{DashboardConfig, DEFAULT_CONFIG_FILE};
use security_dashboard::frontend::LogFrontend;
use security_dashboard::logging::{self, LoggingConfig, OutputFormat};
use security_dashboard::media::HttpMediaApi;
use security_dashboard::session::DashboardSession;
use security_dashboard::transport::WebSocketConnector;

#[derive(Parser)]
#[command(name = "security-dashboard")]
#[command(about = "Headless client for a home security monitoring server", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Server address (host:port, ws://, http:// ...); overrides the config file
    #[arg(long, global = true)]
    server: Option<String>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log format override
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormatArg>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect and follow the server until Ctrl+C (default)
    Run,

    /// Print the effective configuration and server address, then exit
    ShowConfig,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

impl From<LogFormatArg> for OutputFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => Self::Pretty,
            LogFormatArg::Compact => Self::Compact,
            LogFormatArg::Json => Self::Json,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = DashboardConfig::load_from(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format.into();
    }
    config.validate()?;

    let logging_config = LoggingConfig::from_dashboard_config(&config).map_err(anyhow::Error::msg)?;
    logging::init(logging_config).map_err(anyhow::Error::msg)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config, cli.server.as_deref()).await,
        Commands::ShowConfig => show_config(&config, cli.server.as_deref()),
    }
}

async fn run(config: DashboardConfig, server: Option<&str>) -> Result<()> {
    let address = resolve_address(server, Some(config.server.as_str()));
    tracing::info!("Server: {} (from {})", address, address.source());

    let media_api = HttpMediaApi::new(&address);
    let session = DashboardSession::new(
        config,
        address,
        Arc::new(WebSocketConnector),
        Arc::new(media_api),
        LogFrontend,
    );
    let handle = session.handle();
    let task = tokio::spawn(session.run());

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;
    tracing::info!("Shutting down");
    handle.shutdown()?;

    let session = task.await.context("Session task failed")?;
    tracing::info!(
        "Session ended after {} reconnect(s), {} alert(s) logged",
        session.connection().reconnects_scheduled(),
        session.view().alerts.len()
    );
    Ok(())
}

fn show_config(config: &DashboardConfig, server: Option<&str>) -> Result<()> {
    let address = resolve_address(server, Some(config.server.as_str()));
    println!("{}", serde_json::to_string_pretty(config)?);
    println!("channel: {} (from {})", address, address.source());
    println!("media:   {}", address.http_base());
    Ok(())
}
