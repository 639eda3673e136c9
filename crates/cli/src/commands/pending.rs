// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use rp_core::PendingSubmission;

use crate::cli::OutputFormat;
use crate::error::Result;

use super::Context;

const PAYLOAD_PREVIEW_CHARS: usize = 60;

/// Lists queued records in replay order.
pub fn run(ctx: &Context, output: OutputFormat) -> Result<()> {
    let entries = ctx.scheduler(false)?.pending()?;

    match output {
        OutputFormat::Text => print!("{}", format_text(&entries)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
    }
    Ok(())
}

pub fn format_text(entries: &[PendingSubmission]) -> String {
    if entries.is_empty() {
        return "no pending submissions\n".to_string();
    }

    let mut out = String::new();
    for entry in entries {
        out.push_str(&format!(
            "{}  {}  {}  {}\n",
            entry.local_id,
            entry.queued_at.format("%Y-%m-%d %H:%M:%S"),
            entry.resource,
            preview(&entry.payload)
        ));
    }
    let noun = if entries.len() == 1 {
        "submission"
    } else {
        "submissions"
    };
    out.push_str(&format!("{} pending {}\n", entries.len(), noun));
    out
}

fn preview(payload: &serde_json::Value) -> String {
    let text = payload.to_string();
    if text.chars().count() <= PAYLOAD_PREVIEW_CHARS {
        return text;
    }
    let cut: String = text.chars().take(PAYLOAD_PREVIEW_CHARS - 3).collect();
    format!("{cut}...")
}

#[cfg(test)]
#[path = "pending_tests.rs"]
mod tests;
