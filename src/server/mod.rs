//! Search server runtime.
//!
//! # Responsibilities
//! - Open the source, load TLS and bind the listener (all fallible work)
//! - Accept connections and give each one its own task
//! - Run the TLS handshake inside the connection task
//! - On shutdown: stop accepting, drain sessions, release the socket

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio_rustls::TlsAcceptor;
use tracing::Instrument;

use crate::config::ServerConfig;
use crate::lifecycle::{shutdown, StartupError};
use crate::net::{tls, ConnectionId, ConnectionPermit, ConnectionTracker, Listener};
use crate::observability::metrics;
use crate::search::Algorithm;
use crate::session::{CloseReason, Session, SessionContext, SessionError};
use crate::source::DataSource;

/// Pause after a failed accept (e.g. out of file descriptors).
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// A bound search server, ready to accept connections.
pub struct SearchServer {
    listener: Listener,
    tls: Option<TlsAcceptor>,
    context: Arc<SessionContext>,
    tracker: ConnectionTracker,
    handshake_timeout: Duration,
    shutdown_timeout: Duration,
}

impl SearchServer {
    /// Perform every fallible startup step and bind the listening socket.
    pub async fn bind(config: &ServerConfig) -> Result<Self, StartupError> {
        let source = DataSource::open(&config.source).await?;

        if config.search.algorithm == Algorithm::Binary {
            if let DataSource::Cached(lines) = &source {
                if !lines.is_sorted() {
                    tracing::warn!(
                        path = %config.source.path.display(),
                        "Binary search selected but the source is not sorted; \
                         queries will be refused unless source.sort_on_load is set"
                    );
                }
            }
        }

        let tls = if config.tls.enabled {
            Some(tls::load_acceptor(&config.tls.cert_path, &config.tls.key_path).await?)
        } else {
            None
        };

        let context = SessionContext::from_config(source, config);
        tracing::info!(
            algorithm = context.matcher.name(),
            reread_on_query = context.source.is_reread(),
            "Search strategy selected"
        );

        let listener = Listener::bind(&config.listener).await?;

        Ok(Self {
            listener,
            tls,
            context: Arc::new(context),
            tracker: ConnectionTracker::new(),
            handshake_timeout: Duration::from_secs(config.listener.handshake_timeout_secs),
            shutdown_timeout: Duration::from_secs(config.lifecycle.shutdown_timeout_secs),
        })
    }

    /// Get the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.listener.local_addr()
    }

    /// Number of connections currently being served.
    pub fn active_connections(&self) -> u64 {
        self.tracker.active_count()
    }

    /// Accept connections until `stop` fires, then drain and release the socket.
    pub async fn run(self, mut stop: broadcast::Receiver<()>) {
        tracing::info!(
            address = ?self.listener.local_addr().ok(),
            tls = self.tls.is_some(),
            "Search server accepting connections"
        );

        loop {
            tokio::select! {
                _ = shutdown::wait(&mut stop) => {
                    tracing::info!("Shutdown signal received, no longer accepting");
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer, permit)) => {
                        // A stop sent before the resubscribe only reaches `stop`.
                        let session_stop = stop.resubscribe();
                        if shutdown::signalled(&mut stop) {
                            tracing::info!(
                                peer_addr = %peer,
                                "Shutdown signal received, dropping connection accepted during shutdown"
                            );
                            break;
                        }
                        self.spawn_connection(stream, peer, permit, session_stop);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Accept failed");
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                },
            }
        }

        let remaining = self.active_connections();
        if remaining > 0 {
            tracing::info!(sessions = remaining, "Waiting for sessions to finish");
        }
        if !self.tracker.wait_for_drain(self.shutdown_timeout).await {
            tracing::warn!(
                sessions = self.active_connections(),
                "Shutdown timeout reached with sessions still open"
            );
        }

        drop(self.listener);
        tracing::info!("Search server stopped");
    }

    fn spawn_connection(
        &self,
        stream: TcpStream,
        peer: SocketAddr,
        permit: ConnectionPermit,
        stop: broadcast::Receiver<()>,
    ) {
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(peer_addr = %peer, error = %e, "Failed to set TCP_NODELAY");
        }

        let guard = self.tracker.track();
        let span = tracing::info_span!("session", connection_id = %guard.id(), peer_addr = %peer);
        let tls = self.tls.clone();
        let context = Arc::clone(&self.context);
        let handshake_timeout = self.handshake_timeout;

        tokio::spawn(
            async move {
                let id = guard.id();
                serve_connection(stream, peer, tls, handshake_timeout, context, id, stop).await;
                drop(permit);
                drop(guard);
            }
            .instrument(span),
        );
    }
}

async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    tls: Option<TlsAcceptor>,
    handshake_timeout: Duration,
    context: Arc<SessionContext>,
    id: ConnectionId,
    stop: broadcast::Receiver<()>,
) {
    let outcome = match tls {
        Some(acceptor) => match tls::handshake(&acceptor, stream, handshake_timeout).await {
            Ok(stream) => Session::new(stream, peer, id, context).run(stop).await,
            Err(e) => {
                metrics::record_handshake_failure();
                tracing::warn!(peer_addr = %peer, error = %e, "Dropping connection");
                return;
            }
        },
        None => Session::new(stream, peer, id, context).run(stop).await,
    };
    log_outcome(outcome);
}

fn log_outcome(outcome: Result<CloseReason, SessionError>) {
    match outcome {
        Ok(reason) => tracing::debug!(?reason, "Session ended"),
        Err(e) => tracing::warn!(error = %e, "Session terminated"),
    }
}
