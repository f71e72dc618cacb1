//! Metrics collection and exposition.
//!
//! # Metrics
//! - `search_queries_total` (counter): queries by response token
//! - `search_query_duration_seconds` (histogram): time from decoded query to response
//! - `search_active_sessions` (gauge): current connection count
//! - `search_handshake_failures_total` (counter): failed TLS handshakes
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and serve it on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one answered query.
pub fn record_query(response: &'static str, start: Instant) {
    metrics::counter!("search_queries_total", "response" => response).increment(1);
    metrics::histogram!("search_query_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn session_opened() {
    metrics::gauge!("search_active_sessions").increment(1.0);
}

pub fn session_closed() {
    metrics::gauge!("search_active_sessions").decrement(1.0);
}

pub fn record_handshake_failure() {
    metrics::counter!("search_handshake_failures_total").increment(1);
}
