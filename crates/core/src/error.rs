// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for rp-core operations.
//!
//! Every variant here is a storage fault from the caller's point of view:
//! the durable queue could not be read or written.

use thiserror::Error;

/// All possible errors that can occur in rp-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted queue data: {0}\n  hint: move the file aside to start with an empty queue")]
    CorruptedData(String),
}

/// A specialized Result type for rp-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
