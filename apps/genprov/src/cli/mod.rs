//! # genprov CLI Module
//!
//! This module implements the CLI interface for genprov.
//!
//! ## Available Commands
//!
//! - `process` - Write one record per object of an event
//! - `inspect` - Dump the provenance of a single object
//! - `validate` - List malformed hierarchy nodes
//! - `convert` - Convert an event between JSON and binary

mod commands;

use crate::config::Config;
use clap::{Parser, Subcommand, ValueEnum};
use genprov_core::GenprovError;
use std::path::{Path, PathBuf};

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// genprov - provenance flattening & attribution
///
/// Resolves reconstructed objects to the generator particles that produced
/// them and splits their energy into primary and pileup contributions.
#[derive(Parser, Debug)]
#[command(name = "genprov")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a TOML configuration file (default: ./genprov.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Reject malformed hierarchies (overrides the configuration)
    #[arg(long, global = true)]
    pub strict: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Event file encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EventFormat {
    /// Header + postcard payload
    Binary,
    /// serde_json `SerializableEvent`
    Json,
}

impl EventFormat {
    /// Format implied by a file extension: `.json` is JSON, anything else binary.
    #[must_use]
    pub fn infer(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Binary,
        }
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write one record per object of an event
    Process {
        /// Event file
        #[arg(short, long)]
        input: PathBuf,

        /// Event format (inferred from the extension when omitted)
        #[arg(short, long, value_enum)]
        format: Option<EventFormat>,

        /// redb record database; records are printed as JSON when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Dump the provenance of a single object
    Inspect {
        /// Event file
        #[arg(short, long)]
        input: PathBuf,

        /// Event format (inferred from the extension when omitted)
        #[arg(short, long, value_enum)]
        format: Option<EventFormat>,

        /// Object id
        #[arg(long)]
        object: u64,
    },

    /// List malformed hierarchy nodes
    Validate {
        /// Event file
        #[arg(short, long)]
        input: PathBuf,

        /// Event format (inferred from the extension when omitted)
        #[arg(short, long, value_enum)]
        format: Option<EventFormat>,
    },

    /// Convert an event between JSON and binary (formats from extensions)
    Convert {
        /// Source event file
        #[arg(short, long)]
        input: PathBuf,

        /// Destination event file
        #[arg(short, long)]
        output: PathBuf,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), GenprovError> {
    let config = Config::resolve(cli.config.as_deref())?;
    let ctx = Context {
        strict: cli.strict || config.hierarchy.strict,
        json_mode: cli.json_mode,
        verbose: cli.verbose,
        config,
    };
    tracing::debug!(strict = ctx.strict, "Configuration loaded");

    match cli.command {
        Commands::Process {
            input,
            format,
            output,
        } => cmd_process(&ctx, &input, format, output.as_deref()),
        Commands::Inspect {
            input,
            format,
            object,
        } => cmd_inspect(&ctx, &input, format, object),
        Commands::Validate { input, format } => cmd_validate(&ctx, &input, format),
        Commands::Convert { input, output } => cmd_convert(&ctx, &input, &output),
    }
}

/// Settings shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: Config,
    pub strict: bool,
    pub json_mode: bool,
    pub verbose: bool,
}
