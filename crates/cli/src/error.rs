// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::sync::{RemoteError, SyncError, UploadError};

/// All possible errors that can occur in the rpsync library.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid local id: '{0}'\n  hint: run 'rpilot pending' to list queued ids")]
    InvalidLocalId(String),

    #[error("invalid record payload: {0}\n  hint: pass a JSON object with --json or --json-file")]
    InvalidPayload(String),

    #[error("{field} is required")]
    FieldRequired { field: &'static str },

    #[error("cannot read {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

/// A specialized Result type for rpsync operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<rp_core::Error> for Error {
    fn from(e: rp_core::Error) -> Self {
        match e {
            rp_core::Error::Io(e) => Error::Io(e),
            rp_core::Error::Json(e) => Error::Json(e),
            rp_core::Error::CorruptedData(s) => Error::CorruptedData(s),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
