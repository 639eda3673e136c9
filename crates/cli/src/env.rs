// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! All runtime environment variables used by the CLI are defined here
//! with typed accessor functions. The variable name constants are generated
//! by `build.rs` and live in the [`vars`] submodule.

use std::path::PathBuf;

/// Generated environment variable name constants.
pub mod vars {
    include!(concat!(env!("OUT_DIR"), "/env_vars.rs"));
}

/// Returns the value of `RP_STATE_DIR` if set and non-empty.
pub fn state_dir() -> Option<PathBuf> {
    non_empty(vars::RP_STATE_DIR).map(PathBuf::from)
}

/// Returns the value of `RP_API_URL` if set and non-empty.
pub fn api_url() -> Option<String> {
    non_empty(vars::RP_API_URL)
}

/// Returns the bearer token from `RP_TOKEN` if set and non-empty.
pub fn token() -> Option<String> {
    non_empty(vars::RP_TOKEN)
}

/// Returns the log filter directive from `RP_LOG` if set.
pub fn log_filter() -> Option<String> {
    non_empty(vars::RP_LOG)
}

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
