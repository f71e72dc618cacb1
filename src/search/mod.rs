//! Line matching subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     SearchConfig.algorithm (tag)
//!     → Algorithm::matcher()
//!     → Arc<dyn LineMatcher> shared by every session
//!
//! Per query:
//!     LineSet + query → LineMatcher::find → MatchResult | SearchError
//! ```
//!
//! # Strategies
//! - `linear`: in-order scan, the reference semantics
//! - `binary`: leftmost insertion point on sorted lines
//! - `buffered`: linear scan in fixed-size chunks
//! - `preloaded`: linear scan over lines that are resident in memory
//! - `hash`: membership test against a per-set hash index
//! - `regex`: the query is a pattern; any line containing a match counts
//!
//! All strategies except `regex` answer the same question: is the query
//! exactly equal to some trimmed line. `regex` is a different mode, not a
//! faster exact search.

pub mod binary;
pub mod buffered;
pub mod hash;
pub mod linear;
pub mod pattern;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;
use crate::source::LineSet;

pub use binary::BinarySearch;
pub use buffered::BufferedSearch;
pub use hash::HashSearch;
pub use linear::{LinearSearch, PreloadedSearch};
pub use pattern::RegexSearch;

/// Outcome of a successful search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    Exists,
    NotFound,
}

impl MatchResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchResult::Exists => "STRING EXISTS",
            MatchResult::NotFound => "STRING NOT FOUND",
        }
    }
}

impl From<bool> for MatchResult {
    fn from(found: bool) -> Self {
        if found {
            MatchResult::Exists
        } else {
            MatchResult::NotFound
        }
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A query could not be evaluated by the selected strategy.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("binary search requires sorted lines")]
    Unsorted,
}

/// A line matching strategy.
pub trait LineMatcher: Send + Sync + fmt::Debug {
    /// Decide whether `query` occurs in `lines`.
    fn find(&self, lines: &LineSet, query: &str) -> Result<MatchResult, SearchError>;

    /// Strategy name for logging.
    fn name(&self) -> &'static str;
}

/// Matching strategy selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    #[default]
    Linear,
    Binary,
    Regex,
    Buffered,
    Preloaded,
    Hash,
}

impl Algorithm {
    pub const ALL: [Algorithm; 6] = [
        Algorithm::Linear,
        Algorithm::Binary,
        Algorithm::Regex,
        Algorithm::Buffered,
        Algorithm::Preloaded,
        Algorithm::Hash,
    ];

    /// Resolve the tag into the strategy that serves every query.
    pub fn matcher(self, chunk_size: usize) -> Arc<dyn LineMatcher> {
        match self {
            Algorithm::Linear => Arc::new(LinearSearch),
            Algorithm::Binary => Arc::new(BinarySearch),
            Algorithm::Regex => Arc::new(RegexSearch),
            Algorithm::Buffered => Arc::new(BufferedSearch::new(chunk_size)),
            Algorithm::Preloaded => Arc::new(PreloadedSearch),
            Algorithm::Hash => Arc::new(HashSearch),
        }
    }

    /// True for strategies that test exact line equality.
    pub fn is_exact(self) -> bool {
        !matches!(self, Algorithm::Regex)
    }
}

/// Build the configured strategy.
pub fn build_matcher(config: &SearchConfig) -> Arc<dyn LineMatcher> {
    config.algorithm.matcher(config.chunk_size)
}
