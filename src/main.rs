//! rxdiskd daemon entry point
//!
//! Loads configuration, wires the device manager to the real utility
//! invoker, and serves the REST API until interrupted.

use clap::{ArgAction, Parser};
use console::style;
use rxdiskd::api;
use rxdiskd::config::ConfigManager;
use rxdiskd::error::{RxdError, RxdResult};
use rxdiskd::manager::DeviceManager;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// rxdiskd - REST management daemon for RAM-backed block devices
#[derive(Parser, Debug)]
#[command(name = "rxdiskd")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, env = "RXDISKD_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overriding the configured one
    #[arg(short, long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> RxdResult<()> {
    let cli = Cli::parse();

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("rxdiskd=warn"),
        1 => EnvFilter::new("rxdiskd=info"),
        _ => EnvFilter::new("rxdiskd=debug"),
    };

    let config_manager = if let Some(path) = cli.config {
        ConfigManager::with_path(path)
    } else {
        ConfigManager::new()
    };
    let config = config_manager.load().await?;

    if config.general.log_format == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let manager = Arc::new(DeviceManager::from_config(&config.utility));
    let app = api::router(manager);

    let listen = cli.listen.unwrap_or(config.server.listen);
    let listener = TcpListener::bind(&listen)
        .await
        .map_err(|e| RxdError::io(format!("binding {listen}"), e))?;
    info!("Listening on {listen}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| RxdError::io("serving HTTP", e))?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
