//! Connection identity and lifecycle tracking.
//!
//! # Responsibilities
//! - Hand out per-server connection IDs for tracing
//! - Count live sessions so shutdown can wait for them to drain
//! - Publish the live session count as a metric

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use crate::observability::metrics;

/// Identifier attached to every log event of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl From<u64> for ConnectionId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

#[derive(Debug, Default)]
struct Counts {
    active: AtomicU64,
    issued: AtomicU64,
    drained: Notify,
}

/// Live session accounting for one server.
///
/// Cloning shares the same counts.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    counts: Arc<Counts>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session. It stays counted until the guard is dropped.
    pub fn track(&self) -> ConnectionGuard {
        let id = ConnectionId(self.counts.issued.fetch_add(1, Ordering::Relaxed) + 1);
        self.counts.active.fetch_add(1, Ordering::SeqCst);
        metrics::session_opened();
        ConnectionGuard {
            counts: Arc::clone(&self.counts),
            id,
        }
    }

    pub fn active_count(&self) -> u64 {
        self.counts.active.load(Ordering::SeqCst)
    }

    /// Wait until no session is left or `timeout` elapses.
    ///
    /// Returns `false` on timeout.
    pub async fn wait_for_drain(&self, timeout: Duration) -> bool {
        let drained = async {
            loop {
                // Created before the check so a release in between is not missed.
                let released = self.counts.drained.notified();
                if self.active_count() == 0 {
                    return;
                }
                released.await;
            }
        };
        tokio::time::timeout(timeout, drained).await.is_ok()
    }
}

/// Keeps one session counted while alive.
#[derive(Debug)]
pub struct ConnectionGuard {
    counts: Arc<Counts>,
    id: ConnectionId,
}

impl ConnectionGuard {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if self.counts.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.counts.drained.notify_waiters();
        }
        metrics::session_closed();
        tracing::trace!(connection_id = %self.id, "Connection released");
    }
}
