// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Read;
use std::path::Path;

use serde_json::Value;

use crate::cli::PayloadArgs;
use crate::error::{Error, Result};
use crate::sync::SubmitOutcome;

use super::Context;

/// Sends a record, or queues it when the API cannot be reached.
pub async fn run(
    ctx: &Context,
    resource: Option<String>,
    payload: PayloadArgs,
    offline: bool,
) -> Result<()> {
    let payload = read_payload(&payload)?;
    let resource = resource.unwrap_or_else(|| ctx.config().sync.default_resource.clone());
    let scheduler = ctx.scheduler(!offline)?;

    let outcome = scheduler.submit(&resource, payload).await?;
    println!("{}", describe(&outcome, &resource));
    Ok(())
}

/// Loads the record from whichever source was given.
pub fn read_payload(args: &PayloadArgs) -> Result<Value> {
    match (&args.json, &args.json_file) {
        (Some(text), _) => parse_payload(text),
        (None, Some(path)) => parse_payload(&read_source(path)?),
        (None, None) => Err(Error::FieldRequired {
            field: "--json or --json-file",
        }),
    }
}

/// Parses a record. Records must be JSON objects.
pub fn parse_payload(text: &str) -> Result<Value> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| Error::InvalidPayload(e.to_string()))?;
    if !value.is_object() {
        return Err(Error::InvalidPayload(format!(
            "expected a JSON object, got {}",
            kind(&value)
        )));
    }
    Ok(value)
}

pub fn describe(outcome: &SubmitOutcome, resource: &str) -> String {
    match outcome {
        SubmitOutcome::Sent => format!("sent to {resource}"),
        SubmitOutcome::Queued(local_id) => {
            format!("accepted, pending sync (local id {local_id})")
        }
    }
}

fn read_source(path: &Path) -> Result<String> {
    let read_err = |source: std::io::Error| Error::ReadFile {
        path: path.display().to_string(),
        source,
    };
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text).map_err(read_err)?;
        return Ok(text);
    }
    std::fs::read_to_string(path).map_err(read_err)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[path = "submit_tests.rs"]
mod tests;
