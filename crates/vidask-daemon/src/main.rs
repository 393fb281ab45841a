//! vidask daemon - backend process for the video question assistant
//!
//! The daemon provides:
//! - HTTP API for the browser extension and the `vidask` CLI
//! - Video session tracking from browser lifecycle events
//! - Background cache invalidation through the RAG engine

mod error;
mod server;
mod supervisor;

use std::path::PathBuf;

use clap::Parser;
use libvidask_core::Config;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use supervisor::Supervisor;

#[derive(Parser)]
#[command(name = "vidask-daemon", about = "vidask backend daemon", version)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, env = "VIDASK_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config and PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Address to bind (overrides config)
    #[arg(long)]
    bind: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("vidask-daemon starting");

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(e.exit_code());
        }
    };
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }

    if config.credential.is_none() {
        warn!(
            credential_env = %config.engine.credential_env,
            "RAG API key is not set; ask and clear requests will fail until it is configured"
        );
    }

    let supervisor = Supervisor::new(config);
    if let Err(e) = supervisor.run(shutdown_signal()).await {
        error!("Supervisor error: {}", e);
        std::process::exit(1);
    }

    info!("vidask-daemon stopped");
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Received shutdown signal");
}
