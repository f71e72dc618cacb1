//! Line search server library.

pub mod client;
pub mod config;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod search;
pub mod server;
pub mod session;
pub mod source;

pub use config::schema::ServerConfig;
pub use lifecycle::Shutdown;
pub use server::SearchServer;
