// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use rp_core::LocalId;

use crate::error::{Error, Result};

use super::Context;

/// Removes a queued record without sending it. Unknown ids are not an error.
pub fn run(ctx: &Context, local_id: &str) -> Result<()> {
    let id = parse_local_id(local_id)?;
    if ctx.scheduler(false)?.discard(id)? {
        println!("discarded {id}");
    } else {
        println!("no pending submission with local id {id}");
    }
    Ok(())
}

pub fn parse_local_id(input: &str) -> Result<LocalId> {
    input
        .parse()
        .map_err(|_| Error::InvalidLocalId(input.to_string()))
}

#[cfg(test)]
#[path = "discard_tests.rs"]
mod tests;
