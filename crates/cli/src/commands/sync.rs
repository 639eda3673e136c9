// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use crate::error::Result;
use crate::sync::DrainReport;

use super::{shutdown_token, Context};

/// Replays the queue once. Failed entries stay queued and do not fail the command.
pub async fn run(ctx: &Context) -> Result<()> {
    let scheduler = ctx.scheduler(true)?;
    let cancel = shutdown_token();

    let report = scheduler.drain(&cancel).await?;
    println!("{}", format_report(&report));
    if report.deferred > 0 {
        eprintln!("hint: set RP_TOKEN to replay queued submissions");
    }
    Ok(())
}

pub fn format_report(report: &DrainReport) -> String {
    let mut line = format!(
        "succeeded: {}, failed: {}, deferred: {}",
        report.succeeded, report.failed, report.deferred
    );
    if report.cancelled {
        line.push_str(" (cancelled)");
    }
    if report.busy {
        line.push_str(" (another sync is in progress)");
    }
    line
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
