//! Line search server.
//!
//! Answers whether a query string is present, as a whole line, in a
//! configured text file. Clients connect over TCP (optionally TLS), get a
//! greeting, and then send one query per write.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────────┐
//!                       │                  LINE SEARCH                     │
//!                       │                                                  │
//!     Client query      │  ┌─────────┐    ┌─────────┐    ┌─────────────┐   │
//!     ──────────────────┼─▶│   net   │───▶│ session │───▶│   search    │   │
//!                       │  │listener │    │ handler │    │  strategy   │   │
//!                       │  │ + tls   │    └────┬────┘    └──────┬──────┘   │
//!                       │  └─────────┘         │                │          │
//!     Response line     │                      │                ▼          │
//!     ◀─────────────────┼──────────────────────┘         ┌─────────────┐   │
//!                       │                                │   source    │   │
//!                       │                                │cached/reread│   │
//!                       │                                └─────────────┘   │
//!                       │  ┌────────────────────────────────────────────┐  │
//!                       │  │           Cross-Cutting Concerns           │  │
//!                       │  │  config · observability · lifecycle        │  │
//!                       │  └────────────────────────────────────────────┘  │
//!                       └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use line_search::config::load_config;
use line_search::lifecycle::startup;
use line_search::observability::logging;

#[derive(Parser)]
#[command(name = "line-search")]
#[command(about = "Exact and pattern line-search server", long_about = None)]
struct Cli {
    /// Path to the server configuration file
    #[arg(short, long, env = "LINE_SEARCH_CONFIG", default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("line-search: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init(&config.observability) {
        eprintln!("line-search: failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "line-search starting");

    match startup::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            ExitCode::FAILURE
        }
    }
}
