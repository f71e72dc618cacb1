//! Wire protocol.
//!
//! One query per client write, at most one read buffer long. The server
//! answers every read with exactly one newline-terminated line.
//!
//! ```text
//! server → Hello, you are connected to the server!\n
//! client → beta
//! server → STRING EXISTS\n
//! client → delta
//! server → STRING NOT FOUND\n
//! client → (whitespace only)
//! server → ERROR: EMPTY QUERY\n
//! ```

use crate::search::{MatchResult, SearchError};
use crate::source::SourceError;

/// Sent once when a session starts.
pub const GREETING: &str = "Hello, you are connected to the server!";

/// Default per-read buffer size.
pub const DEFAULT_BUFFER_SIZE: usize = 1024;

/// The query bytes could not be turned into a usable query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("empty query")]
    Empty,

    #[error("query is not valid UTF-8")]
    InvalidEncoding,
}

/// Every line the server can send in answer to a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Exists,
    NotFound,
    EmptyQuery,
    InvalidEncoding,
    InvalidPattern,
    DataNotSorted,
    FileNotFound,
    FileUnreadable,
}

impl Response {
    /// Token text without the line terminator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Response::Exists => MatchResult::Exists.as_str(),
            Response::NotFound => MatchResult::NotFound.as_str(),
            Response::EmptyQuery => "ERROR: EMPTY QUERY",
            Response::InvalidEncoding => "ERROR: INVALID ENCODING",
            Response::InvalidPattern => "ERROR: INVALID PATTERN",
            Response::DataNotSorted => "ERROR: DATA NOT SORTED",
            Response::FileNotFound => "ERROR: FILE NOT FOUND",
            Response::FileUnreadable => "ERROR: FILE UNREADABLE",
        }
    }

    /// Bytes written to the stream.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.as_str().len() + 1);
        bytes.extend_from_slice(self.as_str().as_bytes());
        bytes.push(b'\n');
        bytes
    }

    pub fn is_error(&self) -> bool {
        !matches!(self, Response::Exists | Response::NotFound)
    }

    /// Parse a response line as sent by the server.
    pub fn parse(line: &str) -> Option<Self> {
        const ALL: [Response; 8] = [
            Response::Exists,
            Response::NotFound,
            Response::EmptyQuery,
            Response::InvalidEncoding,
            Response::InvalidPattern,
            Response::DataNotSorted,
            Response::FileNotFound,
            Response::FileUnreadable,
        ];
        let line = line.trim_end_matches(['\r', '\n']);
        ALL.into_iter().find(|r| r.as_str() == line)
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<MatchResult> for Response {
    fn from(result: MatchResult) -> Self {
        match result {
            MatchResult::Exists => Response::Exists,
            MatchResult::NotFound => Response::NotFound,
        }
    }
}

impl From<&QueryError> for Response {
    fn from(err: &QueryError) -> Self {
        match err {
            QueryError::Empty => Response::EmptyQuery,
            QueryError::InvalidEncoding => Response::InvalidEncoding,
        }
    }
}

impl From<&SearchError> for Response {
    fn from(err: &SearchError) -> Self {
        match err {
            SearchError::InvalidPattern(_) => Response::InvalidPattern,
            SearchError::Unsorted => Response::DataNotSorted,
        }
    }
}

impl From<&SourceError> for Response {
    fn from(err: &SourceError) -> Self {
        match err {
            SourceError::NotFound { .. } => Response::FileNotFound,
            SourceError::Unreadable { .. } | SourceError::InvalidEncoding { .. } => {
                Response::FileUnreadable
            }
        }
    }
}

/// Turn one read's worth of bytes into a query.
///
/// NUL padding and surrounding whitespace are stripped. What remains must be
/// non-empty UTF-8.
pub fn decode_query(bytes: &[u8]) -> Result<String, QueryError> {
    let text = std::str::from_utf8(bytes).map_err(|_| QueryError::InvalidEncoding)?;
    let query = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    if query.is_empty() {
        return Err(QueryError::Empty);
    }
    Ok(query.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_strips_padding_and_whitespace() {
        assert_eq!(decode_query(b"  beta\r\n").unwrap(), "beta");
        assert_eq!(decode_query(b"beta\0\0\0\0").unwrap(), "beta");
        assert_eq!(decode_query(b"\0 two words \n\0").unwrap(), "two words");
    }

    #[test]
    fn decode_rejects_empty_queries() {
        assert_eq!(decode_query(b""), Err(QueryError::Empty));
        assert_eq!(decode_query(b" \n\t"), Err(QueryError::Empty));
        assert_eq!(decode_query(b"\0\0\n"), Err(QueryError::Empty));
    }

    #[test]
    fn decode_rejects_invalid_utf8() {
        assert_eq!(decode_query(&[0x62, 0xff, 0x0a]), Err(QueryError::InvalidEncoding));
    }

    #[test]
    fn responses_are_newline_terminated() {
        assert_eq!(Response::Exists.to_wire(), b"STRING EXISTS\n");
        assert_eq!(Response::EmptyQuery.to_wire(), b"ERROR: EMPTY QUERY\n");
    }

    #[test]
    fn parse_recognizes_every_token() {
        assert_eq!(Response::parse("STRING NOT FOUND\n"), Some(Response::NotFound));
        assert_eq!(Response::parse("ERROR: FILE NOT FOUND\r\n"), Some(Response::FileNotFound));
        assert_eq!(Response::parse("something else"), None);
    }

    #[test]
    fn only_match_results_are_not_errors() {
        assert!(!Response::Exists.is_error());
        assert!(!Response::NotFound.is_error());
        assert!(Response::EmptyQuery.is_error());
        assert!(Response::InvalidPattern.is_error());
    }

    #[test]
    fn error_mapping() {
        let missing = SourceError::NotFound { path: "/x".into() };
        assert_eq!(Response::from(&missing), Response::FileNotFound);
        assert_eq!(Response::from(&SearchError::Unsorted), Response::DataNotSorted);
        assert_eq!(Response::from(&QueryError::Empty), Response::EmptyQuery);
    }
}
