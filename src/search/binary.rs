//! Binary search over sorted lines.
//!
//! The input must be sorted ascending by trimmed value. The free function
//! [`contains`] trusts its caller; [`BinarySearch`] checks the sortedness
//! flag recorded on the [`LineSet`] and refuses unsorted input rather than
//! returning a wrong answer.

use crate::search::{LineMatcher, MatchResult, SearchError};
use crate::source::LineSet;

/// True if some line equals `query` after trimming.
///
/// `lines` must be sorted ascending by trimmed value; on unsorted input the
/// result is unspecified.
pub fn contains<S: AsRef<str>>(lines: &[S], query: &str) -> bool {
    let idx = lines.partition_point(|line| line.as_ref().trim() < query);
    lines
        .get(idx)
        .is_some_and(|line| line.as_ref().trim() == query)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BinarySearch;

impl LineMatcher for BinarySearch {
    fn find(&self, lines: &LineSet, query: &str) -> Result<MatchResult, SearchError> {
        if !lines.is_sorted() {
            return Err(SearchError::Unsorted);
        }
        Ok(contains(lines.lines(), query).into())
    }

    fn name(&self) -> &'static str {
        "binary"
    }
}
