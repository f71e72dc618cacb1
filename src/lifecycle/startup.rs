//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Bind the listener and begin accepting traffic
//! - Wire OS signals to graceful shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Source and TLS are loaded before the socket is bound
//! - Metrics endpoint failure is logged, not fatal

use crate::config::{ConfigError, ServerConfig};
use crate::lifecycle::{signals, Shutdown};
use crate::net::{ListenerError, TlsError};
use crate::observability::metrics;
use crate::server::SearchServer;
use crate::source::SourceError;

/// Anything that prevents the server from starting.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("source unavailable: {0}")]
    Source(#[from] SourceError),

    #[error("tls setup failed: {0}")]
    Tls(#[from] TlsError),

    #[error(transparent)]
    Listener(#[from] ListenerError),
}

/// Start the server and serve until SIGINT/SIGTERM.
pub async fn run(config: ServerConfig) -> Result<(), StartupError> {
    tracing::info!(
        source = %config.source.path.display(),
        reread_on_query = config.source.reread_on_query,
        algorithm = ?config.search.algorithm,
        tls = config.tls.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = SearchServer::bind(&config).await?;

    let shutdown = Shutdown::new();
    let stop = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(stop).await;
    tracing::info!("Shutdown complete");
    Ok(())
}
