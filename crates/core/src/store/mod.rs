// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable submission queue.
//!
//! The queue is an ordered list of [`PendingSubmission`]s. Every mutation is
//! a read-modify-write of the whole list, so a reader never sees a half
//! applied change:
//!
//! - [`MemoryQueueStore`]: process-local, for tests and ephemeral use
//! - [`FileQueueStore`]: a single JSON document under [`QUEUE_KEY`], replaced
//!   atomically on each write

mod file;
mod memory;

pub use file::FileQueueStore;
pub use memory::MemoryQueueStore;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::submission::{LocalId, PendingSubmission};

/// Namespace key of the persisted queue.
pub const QUEUE_KEY: &str = "pending_submissions";

/// Ordered store of submissions awaiting replay.
///
/// Implementations must keep entries in enqueue order, never hand out the
/// same [`LocalId`] twice, and make `enqueue`/`remove` atomic with respect to
/// each other and to `list_pending`.
pub trait QueueStore: Send + Sync {
    /// Appends a submission with a fresh id and the current timestamp.
    fn enqueue(&self, resource: &str, payload: serde_json::Value) -> Result<PendingSubmission>;

    /// Returns all pending submissions in enqueue order.
    fn list_pending(&self) -> Result<Vec<PendingSubmission>>;

    /// Removes one submission.
    ///
    /// Returns `Ok(false)` if no entry has that id; removing twice is not an
    /// error.
    fn remove(&self, local_id: LocalId) -> Result<bool>;

    /// Claims the queue for one replay pass.
    ///
    /// Returns `Ok(None)` while another holder, possibly another process,
    /// is replaying the same queue. The claim lasts until the returned
    /// [`DrainLock`] is dropped.
    fn try_lock_drain(&self) -> Result<Option<DrainLock>>;

    fn len(&self) -> Result<usize> {
        Ok(self.list_pending()?.len())
    }

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl<S: QueueStore + ?Sized> QueueStore for Arc<S> {
    fn enqueue(&self, resource: &str, payload: serde_json::Value) -> Result<PendingSubmission> {
        (**self).enqueue(resource, payload)
    }

    fn list_pending(&self) -> Result<Vec<PendingSubmission>> {
        (**self).list_pending()
    }

    fn remove(&self, local_id: LocalId) -> Result<bool> {
        (**self).remove(local_id)
    }

    fn try_lock_drain(&self) -> Result<Option<DrainLock>> {
        (**self).try_lock_drain()
    }
}

/// Exclusive right to replay a queue. Released on drop.
#[derive(Debug)]
pub struct DrainLock {
    held: Held,
}

#[derive(Debug)]
enum Held {
    /// Advisory lock on an open file; closing the file releases it.
    File(#[allow(dead_code)] std::fs::File),
    Flag(Arc<AtomicBool>),
}

impl DrainLock {
    pub(crate) fn file(file: std::fs::File) -> Self {
        DrainLock { held: Held::File(file) }
    }

    /// Sets `flag` if it was clear. Returns `None` if it was already set.
    pub(crate) fn flag(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| DrainLock { held: Held::Flag(Arc::clone(flag)) })
    }
}

impl Drop for DrainLock {
    fn drop(&mut self) {
        if let Held::Flag(flag) = &self.held {
            flag.store(false, Ordering::Release);
        }
    }
}

/// Serialized form of the whole queue.
///
/// `last_local_id` is the high-water mark of issued ids; it survives the
/// queue being emptied so ids are never reused.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct QueueDocument {
    #[serde(default)]
    pub last_local_id: Option<LocalId>,
    #[serde(default)]
    pub entries: Vec<PendingSubmission>,
}

impl QueueDocument {
    /// Appends a new entry and returns a copy of it.
    pub fn push(
        &mut self,
        resource: &str,
        payload: serde_json::Value,
        now_ms: u64,
        queued_at: chrono::DateTime<chrono::Utc>,
    ) -> PendingSubmission {
        let local_id = LocalId::next(self.last_local_id, now_ms);
        self.last_local_id = Some(local_id);

        let entry = PendingSubmission::new(local_id, resource, payload, queued_at);
        self.entries.push(entry.clone());
        entry
    }

    /// Removes the entry with the given id, returning whether one existed.
    pub fn remove(&mut self, local_id: LocalId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.local_id != local_id);
        self.entries.len() != before
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
