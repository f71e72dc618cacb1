//! Linear scan strategies.

use crate::search::{LineMatcher, MatchResult, SearchError};
use crate::source::LineSet;

/// True if some line equals `query` after trimming.
///
/// This is the reference semantics every exact strategy must reproduce.
pub fn contains<S: AsRef<str>>(lines: &[S], query: &str) -> bool {
    lines.iter().any(|line| line.as_ref().trim() == query)
}

/// Scans lines in order and stops at the first exact match.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearSearch;

impl LineMatcher for LinearSearch {
    fn find(&self, lines: &LineSet, query: &str) -> Result<MatchResult, SearchError> {
        Ok(contains(lines.lines(), query).into())
    }

    fn name(&self) -> &'static str {
        "linear"
    }
}

/// Linear semantics over a line set that is already resident in memory.
///
/// Only valid with a cached source; configuration validation rejects it in
/// reread mode, so no I/O ever happens on its behalf during a query.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreloadedSearch;

impl LineMatcher for PreloadedSearch {
    fn find(&self, lines: &LineSet, query: &str) -> Result<MatchResult, SearchError> {
        Ok(contains(lines.lines(), query).into())
    }

    fn name(&self) -> &'static str {
        "preloaded"
    }
}
