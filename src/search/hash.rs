//! Hash index lookup.

use crate::search::{LineMatcher, MatchResult, SearchError};
use crate::source::LineSet;

/// Looks the query up in the line set's hash index.
///
/// The index is built on the first query against a given set, so in cached
/// mode the cost is paid once per process. In reread mode every query builds
/// a fresh index and linear search is usually cheaper.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashSearch;

impl LineMatcher for HashSearch {
    fn find(&self, lines: &LineSet, query: &str) -> Result<MatchResult, SearchError> {
        Ok(lines.index().contains(query).into())
    }

    fn name(&self) -> &'static str {
        "hash"
    }
}
