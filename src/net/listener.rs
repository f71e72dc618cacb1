//! Bounded TCP listener.
//!
//! # Responsibilities
//! - Bind the configured host and port
//! - Hand out accepted streams together with a connection slot
//! - Hold back new accepts while `max_connections` sessions are open

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::ListenerConfig;

#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to accept: {0}")]
    Accept(#[source] std::io::Error),

    #[error("listener closed")]
    Closed,
}

/// TCP listener that stops accepting while every connection slot is taken.
#[derive(Debug)]
pub struct Listener {
    socket: TcpListener,
    slots: Arc<Semaphore>,
    max_connections: usize,
}

impl Listener {
    pub async fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let address = config.bind_address();
        let bind_error = |source| ListenerError::Bind {
            address: address.clone(),
            source,
        };

        let socket = TcpListener::bind(&address).await.map_err(bind_error)?;
        let local = socket.local_addr().map_err(bind_error)?;
        tracing::info!(
            address = %local,
            max_connections = config.max_connections,
            "Listener bound"
        );

        Ok(Self {
            socket,
            slots: Arc::new(Semaphore::new(config.max_connections)),
            max_connections: config.max_connections,
        })
    }

    /// Wait for a free slot, then for the next connection.
    ///
    /// The returned permit must live as long as the session.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr, ConnectionPermit), ListenerError> {
        if self.slots.available_permits() == 0 {
            tracing::warn!(
                max_connections = self.max_connections,
                "Connection limit reached, holding new connections"
            );
        }

        let slot = Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .map_err(|_| ListenerError::Closed)?;
        let (stream, peer) = self.socket.accept().await.map_err(ListenerError::Accept)?;

        tracing::debug!(
            peer_addr = %peer,
            free_slots = self.slots.available_permits(),
            "Connection accepted"
        );
        Ok((stream, peer, ConnectionPermit { _slot: slot }))
    }

    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.socket.local_addr()
    }

    /// Connection slots not currently held by a session.
    pub fn available_permits(&self) -> usize {
        self.slots.available_permits()
    }

    pub fn max_connections(&self) -> usize {
        self.max_connections
    }
}

/// One connection slot; released on drop, including when the session task panics.
#[derive(Debug)]
pub struct ConnectionPermit {
    _slot: OwnedSemaphorePermit,
}
