//! Brick Wall server binary.
//!
//! Wires the hub that owns the wall to the HTTP/`WebSocket` server.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `brickwall.yaml` (or `$BRICKWALL_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Spawn the hub
//! 4. Serve until `Ctrl-C`
//! 5. Stop the hub and cancel pending resets

mod error;

use std::path::PathBuf;
use std::sync::Arc;

use brickwall_core::config::{LoggingConfig, WallConfig};
use brickwall_server::{AppState, ServerConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "brickwall.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, logging, or the server fails.
#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Load configuration.
    let config_path = std::env::var("BRICKWALL_CONFIG")
        .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = WallConfig::load(&config_path)?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging)?;
    info!(
        config = %config_path.display(),
        columns = config.grid.columns,
        rows = config.grid.rows,
        min_delay_ms = config.reset.min_delay_ms,
        max_delay_ms = config.reset.max_delay_ms,
        seeded = config.reset.seed.is_some(),
        "brickwall v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    // 3. Spawn the hub.
    let (hub, hub_task) = brickwall_core::spawn_hub(&config);
    let state = Arc::new(AppState::new(hub.clone(), &config.server.static_dir));
    info!(static_dir = %config.server.static_dir, "Serving presentation assets");

    // 4. Serve until Ctrl-C.
    let server_config = ServerConfig::from(&config.server);
    brickwall_server::start_server(&server_config, state, shutdown_signal()).await?;

    // 5. Stop the hub; open sessions see their outbox close and exit.
    if hub.shutdown().is_err() {
        warn!("Hub already stopped");
    }
    if let Err(e) = hub_task.await {
        warn!(error = %e, "Hub task ended abnormally");
    }
    info!("brickwall shutdown complete");

    Ok(())
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(logging: &LoggingConfig) -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .map_err(|e| AppError::Logging {
            message: format!("invalid log filter {:?}: {e}", logging.level),
        })?;

    let result = if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
    };

    result.map_err(|e| AppError::Logging {
        message: e.to_string(),
    })
}

/// Resolve when the process receives `Ctrl-C`.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "Failed to listen for shutdown signal, running until killed");
            std::future::pending::<()>().await;
        }
    }
}
