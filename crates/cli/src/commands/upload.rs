// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use crate::error::{Error, Result};
use crate::sync::{ProgressUpdate, ReceiptFile};

use super::{shutdown_token, Context};

/// Uploads a receipt, reports progress on stderr and prints the outcome as JSON.
pub async fn run(ctx: &Context, file: &Path) -> Result<()> {
    let coordinator = ctx.coordinator()?;
    coordinator.validate_path(file)?;
    let receipt = ReceiptFile::from_path(file).map_err(|source| Error::ReadFile {
        path: file.display().to_string(),
        source,
    })?;
    let cancel = shutdown_token();

    let outcome = tokio::select! {
        outcome = coordinator.submit(&receipt, |update| eprintln!("{}", format_progress(update))) => outcome?,
        _ = cancel.cancelled() => return Err(Error::Cancelled),
    };

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

pub fn format_progress(update: &ProgressUpdate) -> String {
    format!(
        "processing job {}: {}% ({})",
        update.job_id, update.progress, update.status
    )
}

#[cfg(test)]
#[path = "upload_tests.rs"]
mod tests;
