// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Pending submissions buffered while the remote API is unreachable.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Locally generated submission identifier.
///
/// Time-derived (milliseconds since Unix epoch) but strictly increasing:
/// a new id is never lower than or equal to any id issued before it, even
/// when the wall clock goes backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalId(u64);

impl LocalId {
    pub fn new(value: u64) -> Self {
        LocalId(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    /// Returns the id to issue next, given the highest id ever issued.
    pub fn next(last_issued: Option<LocalId>, now_ms: u64) -> LocalId {
        match last_issued {
            Some(LocalId(last)) if now_ms <= last => LocalId(last.saturating_add(1)),
            _ => LocalId(now_ms),
        }
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LocalId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(LocalId)
    }
}

/// A user-authored record awaiting remote persistence.
///
/// Immutable once queued; only the queue store creates and destroys it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingSubmission {
    pub local_id: LocalId,
    /// Create-record endpoint the payload is replayed to (e.g. `/purchases`).
    pub resource: String,
    /// Opaque expense record, sent as the JSON request body.
    pub payload: serde_json::Value,
    pub queued_at: DateTime<Utc>,
}

impl PendingSubmission {
    pub fn new(
        local_id: LocalId,
        resource: impl Into<String>,
        payload: serde_json::Value,
        queued_at: DateTime<Utc>,
    ) -> Self {
        PendingSubmission { local_id, resource: resource.into(), payload, queued_at }
    }
}

#[cfg(test)]
#[path = "submission_tests.rs"]
mod tests;
