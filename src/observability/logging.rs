//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Choose between human-readable and JSON output
//!
//! # Design Decisions
//! - `RUST_LOG` overrides the configured level when set
//! - A bare level such as `debug` is scoped to this crate; anything else is
//!   treated as a full filter directive

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// Filter directive derived from the configured log level.
pub fn default_directive(log_level: &str) -> String {
    match log_level.trim().to_ascii_lowercase().as_str() {
        level @ ("trace" | "debug" | "info" | "warn" | "error") => {
            format!("line_search={level},warn")
        }
        _ => log_level.to_string(),
    }
}

/// Install the global subscriber. Errors if one is already installed.
pub fn init(config: &ObservabilityConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directive(&config.log_level).into());

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_levels_are_scoped_to_crate() {
        assert_eq!(default_directive("DEBUG"), "line_search=debug,warn");
        assert_eq!(default_directive(" info "), "line_search=info,warn");
    }

    #[test]
    fn directives_pass_through() {
        assert_eq!(default_directive("line_search::session=trace"), "line_search::session=trace");
    }
}
