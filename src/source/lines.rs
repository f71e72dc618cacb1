//! In-memory line sets.

use std::collections::HashSet;
use std::sync::OnceLock;

/// An ordered sequence of whitespace-trimmed lines.
///
/// Sortedness is computed once at construction so strategies that depend on
/// ordering can check their precondition without rescanning. The hash index
/// used by the hash strategy is built on first use and then reused for the
/// lifetime of the set.
#[derive(Debug, Default)]
pub struct LineSet {
    lines: Vec<String>,
    sorted: bool,
    index: OnceLock<HashSet<String>>,
}

impl LineSet {
    /// Split text on line boundaries (`\n` or `\r\n`) and trim every line.
    pub fn parse(text: &str) -> Self {
        Self::from_lines(text.lines())
    }

    /// Like [`LineSet::parse`], but sorts the lines afterwards.
    pub fn parse_sorted(text: &str) -> Self {
        let mut lines: Vec<String> = text.lines().map(|line| line.trim().to_string()).collect();
        lines.sort_unstable();
        Self {
            lines,
            sorted: true,
            index: OnceLock::new(),
        }
    }

    /// Build a set from individual lines, trimming each and preserving order.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines: Vec<String> = lines.into_iter().map(|line| trimmed(line.into())).collect();
        let sorted = lines.windows(2).all(|pair| pair[0] <= pair[1]);
        Self {
            lines,
            sorted,
            index: OnceLock::new(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether the lines are in ascending order.
    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// Set of distinct lines, built on first call.
    pub fn index(&self) -> &HashSet<String> {
        self.index
            .get_or_init(|| self.lines.iter().cloned().collect())
    }
}

fn trimmed(line: String) -> String {
    if line.trim().len() == line.len() {
        line
    } else {
        line.trim().to_string()
    }
}
