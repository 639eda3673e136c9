// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared argument structs for CLI commands.

use std::path::PathBuf;

use clap::Args;

/// Where a record payload comes from. Exactly one source is required.
#[derive(Args, Clone, Debug, Default)]
#[group(required = true, multiple = false)]
pub struct PayloadArgs {
    /// Record as an inline JSON object
    #[arg(long, short = 'j', value_name = "json", value_parser = super::non_empty_string)]
    pub json: Option<String>,

    /// Read the record from a JSON file ('-' for stdin)
    #[arg(long, value_name = "path")]
    pub json_file: Option<PathBuf>,
}
