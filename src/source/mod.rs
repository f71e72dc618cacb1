//! Source data subsystem.
//!
//! # Data Flow
//! ```text
//! Cached mode:
//!     startup → read file once → LineSet (Arc, immutable)
//!     query   → clone Arc
//!
//! Reread mode:
//!     startup → check path exists
//!     query   → read file → fresh LineSet → dropped after the match
//! ```
//!
//! # Design Decisions
//! - The source is an owned value injected into sessions, never a global
//! - Cached lines are shared read-only; no locking on the query path
//! - Read failures in reread mode are per-query errors, not fatal

pub mod lines;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::SourceConfig;

pub use lines::LineSet;

/// The source file could not provide lines.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("source file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read source file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("source file {path} is not valid UTF-8")]
    InvalidEncoding { path: PathBuf },
}

/// Supplies the current line set to the matcher.
#[derive(Debug, Clone)]
pub enum DataSource {
    /// Lines read once at startup.
    Cached(Arc<LineSet>),
    /// Lines read from disk on every call.
    Reread { path: PathBuf, sort: bool },
}

impl DataSource {
    /// Prepare the source described by the configuration.
    ///
    /// Cached mode reads the whole file here; reread mode only checks that the
    /// path exists. Either failure is a startup error.
    pub async fn open(config: &SourceConfig) -> Result<Self, SourceError> {
        if config.reread_on_query {
            tokio::fs::metadata(&config.path)
                .await
                .map_err(|e| io_error(&config.path, e))?;

            tracing::info!(path = %config.path.display(), "Source will be reread on every query");
            return Ok(Self::Reread {
                path: config.path.clone(),
                sort: config.sort_on_load,
            });
        }

        let lines = read_lines(&config.path, config.sort_on_load).await?;
        tracing::info!(
            path = %config.path.display(),
            lines = lines.len(),
            sorted = lines.is_sorted(),
            "Source cached in memory"
        );
        Ok(Self::Cached(Arc::new(lines)))
    }

    /// Build a cached source from lines already in memory.
    pub fn cached(lines: LineSet) -> Self {
        Self::Cached(Arc::new(lines))
    }

    /// The lines a query should be matched against right now.
    pub async fn current_lines(&self) -> Result<Arc<LineSet>, SourceError> {
        match self {
            Self::Cached(lines) => Ok(Arc::clone(lines)),
            Self::Reread { path, sort } => read_lines(path, *sort).await.map(Arc::new),
        }
    }

    pub fn is_reread(&self) -> bool {
        matches!(self, Self::Reread { .. })
    }
}

/// Read, decode and split a file into a [`LineSet`].
pub async fn read_lines(path: &Path, sort: bool) -> Result<LineSet, SourceError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| io_error(path, e))?;
    let text = String::from_utf8(bytes).map_err(|_| SourceError::InvalidEncoding {
        path: path.to_path_buf(),
    })?;

    Ok(if sort {
        LineSet::parse_sorted(&text)
    } else {
        LineSet::parse(&text)
    })
}

fn io_error(path: &Path, source: std::io::Error) -> SourceError {
    if source.kind() == ErrorKind::NotFound {
        SourceError::NotFound {
            path: path.to_path_buf(),
        }
    } else {
        SourceError::Unreadable {
            path: path.to_path_buf(),
            source,
        }
    }
}
