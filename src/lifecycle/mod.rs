//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load source → Load TLS → Bind listener → Accept
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain sessions → Release socket
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: source first, then TLS, then listener
//! - Ordered shutdown: stop accept, drain, close
//! - Shutdown has timeout: sessions still open after the deadline are abandoned

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::StartupError;
