//! # genprov
//!
//! The main binary for the genprov provenance engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │          apps/genprov (THE BINARY)         │
//! │                                            │
//! │  ┌─────────────┐       ┌───────────────┐   │
//! │  │    CLI      │       │    config     │   │
//! │  │   (clap)    │◄──────│    (toml)     │   │
//! │  └──────┬──────┘       └───────────────┘   │
//! │         ▼                                  │
//! │  ┌──────────────┐                          │
//! │  │ genprov-core │                          │
//! │  │ (THE LOGIC)  │                          │
//! │  └──────────────┘                          │
//! └────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! genprov process -i event.bin -o records.redb
//! genprov inspect -i event.json --object 12
//! genprov validate -i event.bin
//! genprov convert -i event.json -o event.bin
//! ```

use clap::Parser;
use genprov::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    // GENPROV_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("GENPROV_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose { "genprov=debug" } else { "genprov=info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
