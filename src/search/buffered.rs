//! Chunked linear scan.

use crate::search::{linear, LineMatcher, MatchResult, SearchError};
use crate::source::LineSet;

pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// True if some line equals `query` after trimming, testing `chunk_size`
/// contiguous lines at a time and stopping at the first chunk with a hit.
pub fn contains<S: AsRef<str>>(lines: &[S], query: &str, chunk_size: usize) -> bool {
    lines
        .chunks(chunk_size.max(1))
        .any(|chunk| linear::contains(chunk, query))
}

/// Linear semantics, processed in bounded groups of lines.
#[derive(Debug, Clone, Copy)]
pub struct BufferedSearch {
    chunk_size: usize,
}

impl BufferedSearch {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

impl Default for BufferedSearch {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl LineMatcher for BufferedSearch {
    fn find(&self, lines: &LineSet, query: &str) -> Result<MatchResult, SearchError> {
        Ok(contains(lines.lines(), query, self.chunk_size).into())
    }

    fn name(&self) -> &'static str {
        "buffered"
    }
}
