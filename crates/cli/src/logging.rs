// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Log output for the CLI.
//!
//! Logs go to stderr so stdout stays machine-readable. The filter comes
//! from `RP_LOG` (e.g. `rpsync=debug`), falling back to `info`, or `debug`
//! with `--verbose`.

use tracing_subscriber::EnvFilter;

use crate::env;

/// Returns the filter directive to use.
pub fn filter_directive(verbose: bool) -> String {
    env::log_filter().unwrap_or_else(|| default_directive(verbose).to_string())
}

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

/// Installs the global subscriber. Does nothing if one is already set.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_new(filter_directive(verbose))
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
