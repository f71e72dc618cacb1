//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the search
//! server. All types derive Serde traits for deserialization from config files.
//! Keys used by older deployments (`linuxpath`, `REREAD_ON_QUERY`,
//! `SSL_ENABLED`, `CERTFILE`, `KEYFILE`) are accepted as aliases.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::search::Algorithm;

/// Root configuration for the search server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (host, port, connection limits).
    pub listener: ListenerConfig,

    /// Transport encryption.
    pub tls: TlsConfig,

    /// Source data file and acquisition policy.
    pub source: SourceConfig,

    /// Matching strategy.
    pub search: SearchConfig,

    /// Per-connection settings.
    pub session: SessionConfig,

    /// Shutdown behavior.
    pub lifecycle: LifecycleConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// Port to bind. 0 picks an ephemeral port.
    pub port: u16,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,

    /// Upper bound on a single TLS handshake, in seconds.
    pub handshake_timeout_secs: u64,
}

impl ListenerConfig {
    /// `host:port` string suitable for binding.
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 44445,
            max_connections: 10_000,
            handshake_timeout_secs: 10,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Wrap every accepted connection in a TLS server handshake.
    #[serde(alias = "SSL_ENABLED")]
    pub enabled: bool,

    /// Path to certificate file (PEM).
    #[serde(alias = "CERTFILE")]
    pub cert_path: PathBuf,

    /// Path to private key file (PEM).
    #[serde(alias = "KEYFILE")]
    pub key_path: PathBuf,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cert_path: PathBuf::from("cert.pem"),
            key_path: PathBuf::from("key.pem"),
        }
    }
}

/// Where lines come from and how often they are read.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SourceConfig {
    /// Text file searched by every query.
    #[serde(alias = "linuxpath")]
    pub path: PathBuf,

    /// Read the file again for every query instead of caching it at startup.
    #[serde(alias = "REREAD_ON_QUERY")]
    pub reread_on_query: bool,

    /// Sort lines after loading. Required for the binary strategy unless the
    /// file is already sorted.
    pub sort_on_load: bool,
}

/// Matching strategy selection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    pub algorithm: Algorithm,

    /// Lines per group for the buffered strategy.
    pub chunk_size: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Linear,
            chunk_size: 1024,
        }
    }
}

/// Per-connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Maximum bytes read for one query.
    pub buffer_size: usize,

    /// Close a session after this many seconds without a query. 0 disables.
    pub idle_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            buffer_size: 1024,
            idle_timeout_secs: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// How long to wait for in-flight sessions after a stop signal.
    pub shutdown_timeout_secs: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            shutdown_timeout_secs: 30,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
