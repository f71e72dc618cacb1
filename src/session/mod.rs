//! Session subsystem.
//!
//! # Data Flow
//! ```text
//! Accepted stream (plain or TLS)
//!     → handler.rs (greeting, read → process → respond loop)
//!     → protocol.rs (decode query, map outcome to response token)
//!     → DataSource::current_lines → LineMatcher::find
//! ```
//!
//! # Design Decisions
//! - Sessions share nothing mutable; the context is read-only
//! - Per-query failures become response tokens; only I/O errors end a session
//! - Queries within a session are answered strictly in order

pub mod handler;
pub mod protocol;

pub use handler::{CloseReason, Session, SessionContext, SessionError, SessionState};
pub use protocol::{decode_query, QueryError, Response, GREETING};
