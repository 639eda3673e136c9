// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// Nothing listens on the discard port, so requests fail fast.
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:9";

/// `rpilot` with its state in `state` and no ambient credentials.
pub fn rpilot(state: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("rpilot");
    cmd.env("RP_STATE_DIR", state.path())
        .env("RP_API_URL", UNREACHABLE_URL)
        .env("RP_LOG", "warn")
        .env_remove("RP_TOKEN");
    cmd
}

/// Queues a record offline and returns its local id.
pub fn queue_offline(state: &TempDir, json: &str) -> String {
    let output = rpilot(state)
        .args(["submit", "--offline", "--json", json])
        .output()
        .unwrap();
    assert!(output.status.success());

    String::from_utf8_lossy(&output.stdout)
        .trim()
        .trim_end_matches(')')
        .rsplit(' ')
        .next()
        .unwrap()
        .to_string()
}
