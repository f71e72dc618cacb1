//! Regular expression search.
//!
//! The query is compiled as a pattern and searched for within each trimmed
//! line; a line does not need to match in full. A pattern that fails to
//! compile is an error, never a "not found".

use regex::Regex;

use crate::search::{LineMatcher, MatchResult, SearchError};
use crate::source::LineSet;

/// True if `pattern` matches anywhere in some trimmed line.
pub fn contains<S: AsRef<str>>(lines: &[S], pattern: &Regex) -> bool {
    lines.iter().any(|line| pattern.is_match(line.as_ref().trim()))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RegexSearch;

impl LineMatcher for RegexSearch {
    fn find(&self, lines: &LineSet, query: &str) -> Result<MatchResult, SearchError> {
        let pattern = Regex::new(query)?;
        Ok(contains(lines.lines(), &pattern).into())
    }

    fn name(&self) -> &'static str {
        "regex"
    }
}
