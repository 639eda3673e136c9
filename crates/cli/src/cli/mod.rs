// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

mod args;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

pub use args::PayloadArgs;

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "rpilot")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Submit expense records and receipts to ReportPilot, online or offline")]
#[command(
    long_about = "Submit expense records and receipts to ReportPilot.\n\n\
    Records created while the API is unreachable are kept in a local queue and \
    replayed in order once connectivity returns."
)]
pub struct Cli {
    /// Enable debug logging (RP_LOG takes precedence)
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Upload a receipt and wait for its data to be extracted
    #[command(after_help = "\
Examples:
  rpilot upload ticket.jpg          Upload a photo of a receipt
  rpilot upload invoice.pdf         Upload a PDF invoice")]
    Upload {
        /// Receipt file (csv, pdf, jpg, jpeg, png, jfif)
        file: PathBuf,
    },

    /// Create an expense record, queueing it if the API is unreachable
    #[command(after_help = "\
Examples:
  rpilot submit -j '{\"amount\": 12.5, \"category\": \"Verduras\"}'
  rpilot submit --json-file purchase.json
  rpilot submit -r /reports/generate -j '{\"period\": \"2026-10\"}'
  rpilot submit --offline -j '{\"amount\": 3}'   Queue without trying the API")]
    Submit {
        /// API endpoint for the record (default: sync.default_resource)
        #[arg(long, short = 'r', value_parser = non_empty_string)]
        resource: Option<String>,

        #[command(flatten)]
        payload: PayloadArgs,

        /// Queue the record without contacting the API
        #[arg(long)]
        offline: bool,
    },

    /// List records waiting to be synced
    Pending {
        /// Output format
        #[arg(long, short, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// Replay queued records now
    Sync,

    /// Drop a queued record without sending it
    Discard {
        /// Local id shown by 'rpilot pending'
        local_id: String,
    },

    /// Watch connectivity and sync queued records whenever the API is reachable
    Watch,

    /// Show the effective configuration
    Config {
        /// Write a default config.toml to the state directory
        #[arg(long)]
        init: bool,

        /// Overwrite an existing config.toml with --init
        #[arg(long, requires = "init")]
        force: bool,
    },
}

#[cfg(test)]
#[path = "../cli_tests/mod.rs"]
mod tests;
