//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (buffer sizes, chunk sizes, limits)
//! - Reject strategy/source combinations that cannot hold their preconditions
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - File existence is checked at startup, not here

use crate::config::schema::ServerConfig;
use crate::search::Algorithm;

/// Largest accepted per-read buffer.
pub const MAX_BUFFER_SIZE: usize = 64 * 1024;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("source.linuxpath must not be empty")]
    MissingSourcePath,

    #[error("listener.host must not be empty")]
    MissingHost,

    #[error("listener.max_connections must be greater than 0")]
    ZeroMaxConnections,

    #[error("tls is enabled but tls.{0} is empty")]
    MissingTlsPath(&'static str),

    #[error("search.chunk_size must be greater than 0")]
    ZeroChunkSize,

    #[error("session.buffer_size must be between 1 and {max}, got {size}")]
    BufferSizeOutOfRange { size: usize, max: usize },

    #[error("search.algorithm = \"preloaded\" requires source.reread_on_query = false")]
    PreloadedWithReread,
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.source.path.as_os_str().is_empty() {
        errors.push(ValidationError::MissingSourcePath);
    }

    if config.listener.host.trim().is_empty() {
        errors.push(ValidationError::MissingHost);
    }

    if config.listener.max_connections == 0 {
        errors.push(ValidationError::ZeroMaxConnections);
    }

    if config.tls.enabled {
        if config.tls.cert_path.as_os_str().is_empty() {
            errors.push(ValidationError::MissingTlsPath("cert_path"));
        }
        if config.tls.key_path.as_os_str().is_empty() {
            errors.push(ValidationError::MissingTlsPath("key_path"));
        }
    }

    if config.search.chunk_size == 0 {
        errors.push(ValidationError::ZeroChunkSize);
    }

    let buffer_size = config.session.buffer_size;
    if buffer_size == 0 || buffer_size > MAX_BUFFER_SIZE {
        errors.push(ValidationError::BufferSizeOutOfRange {
            size: buffer_size,
            max: MAX_BUFFER_SIZE,
        });
    }

    if config.search.algorithm == Algorithm::Preloaded && config.source.reread_on_query {
        errors.push(ValidationError::PreloadedWithReread);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
