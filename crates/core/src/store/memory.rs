// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory queue store.

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use super::{DrainLock, QueueDocument, QueueStore};
use crate::clock::{ClockSource, SystemClock};
use crate::error::Result;
use crate::submission::{LocalId, PendingSubmission};

/// Queue store that lives only as long as the process.
#[derive(Debug)]
pub struct MemoryQueueStore<C: ClockSource = SystemClock> {
    clock: C,
    doc: Mutex<QueueDocument>,
    draining: Arc<AtomicBool>,
}

impl MemoryQueueStore<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for MemoryQueueStore<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ClockSource> MemoryQueueStore<C> {
    pub fn with_clock(clock: C) -> Self {
        MemoryQueueStore {
            clock,
            doc: Mutex::new(QueueDocument::default()),
            draining: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl<C: ClockSource> QueueStore for MemoryQueueStore<C> {
    fn enqueue(&self, resource: &str, payload: serde_json::Value) -> Result<PendingSubmission> {
        let mut doc = self.doc.lock().unwrap_or_else(|e| e.into_inner());
        Ok(doc.push(resource, payload, self.clock.now_ms(), self.clock.now_utc()))
    }

    fn list_pending(&self) -> Result<Vec<PendingSubmission>> {
        let doc = self.doc.lock().unwrap_or_else(|e| e.into_inner());
        Ok(doc.entries.clone())
    }

    fn remove(&self, local_id: LocalId) -> Result<bool> {
        let mut doc = self.doc.lock().unwrap_or_else(|e| e.into_inner());
        Ok(doc.remove(local_id))
    }

    fn try_lock_drain(&self) -> Result<Option<DrainLock>> {
        Ok(DrainLock::flag(&self.draining))
    }
}
