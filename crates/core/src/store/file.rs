// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! File-backed queue store.
//!
//! The whole queue lives in `<dir>/pending_submissions.json`. Writers take an
//! in-process mutex plus an exclusive advisory lock on
//! `<dir>/pending_submissions.lock`, re-read the document, apply the change,
//! and replace the file via fsynced temp file + rename. Readers never lock:
//! the rename guarantees they see either the old or the new document.
//!
//! A replay pass additionally holds `<dir>/pending_submissions.drain.lock`
//! for its whole duration, so two processes never replay the same entries.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fs2::FileExt;
use tempfile::NamedTempFile;

use super::{DrainLock, QueueDocument, QueueStore, QUEUE_KEY};
use crate::clock::{ClockSource, SystemClock};
use crate::error::{Error, Result};
use crate::submission::{LocalId, PendingSubmission};

/// Durable queue store surviving process restarts.
#[derive(Debug)]
pub struct FileQueueStore<C: ClockSource = SystemClock> {
    dir: PathBuf,
    path: PathBuf,
    lock_path: PathBuf,
    drain_lock_path: PathBuf,
    clock: C,
    write_guard: Mutex<()>,
}

impl FileQueueStore<SystemClock> {
    /// Opens or creates the queue in the given directory.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_clock(dir, SystemClock)
    }
}

impl<C: ClockSource> FileQueueStore<C> {
    /// Opens the queue with a custom clock source.
    ///
    /// Fails with [`Error::CorruptedData`] if an existing document cannot be
    /// parsed, rather than starting over and losing entries.
    pub fn open_with_clock(dir: impl AsRef<Path>, clock: C) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let store = FileQueueStore {
            path: dir.join(format!("{QUEUE_KEY}.json")),
            lock_path: dir.join(format!("{QUEUE_KEY}.lock")),
            drain_lock_path: dir.join(format!("{QUEUE_KEY}.drain.lock")),
            dir,
            clock,
            write_guard: Mutex::new(()),
        };

        let doc = store.read_document()?;
        tracing::debug!(
            path = %store.path.display(),
            pending = doc.entries.len(),
            "opened submission queue"
        );

        Ok(store)
    }

    /// Returns the path of the queue document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<QueueDocument> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(QueueDocument::default());
            }
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(QueueDocument::default());
        }

        serde_json::from_str(&content)
            .map_err(|e| Error::CorruptedData(format!("{}: {}", self.path.display(), e)))
    }

    fn write_document(&self, doc: &QueueDocument) -> Result<()> {
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        serde_json::to_writer_pretty(&mut tmp, doc)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }

    /// Runs a read-modify-write cycle under both locks.
    ///
    /// The closure returns its result and whether the document changed; an
    /// unchanged document is not rewritten.
    fn update<T>(&self, f: impl FnOnce(&mut QueueDocument) -> (T, bool)) -> Result<T> {
        let _guard = self.write_guard.lock().unwrap_or_else(|e| e.into_inner());

        let lock_file =
            OpenOptions::new().create(true).truncate(false).write(true).open(&self.lock_path)?;
        lock_file.lock_exclusive()?;

        let mut doc = self.read_document()?;
        let (out, changed) = f(&mut doc);
        if changed {
            self.write_document(&doc)?;
        }

        // Dropping the file releases the advisory lock.
        drop(lock_file);
        Ok(out)
    }
}

impl<C: ClockSource> QueueStore for FileQueueStore<C> {
    fn enqueue(&self, resource: &str, payload: serde_json::Value) -> Result<PendingSubmission> {
        let now_ms = self.clock.now_ms();
        let queued_at = self.clock.now_utc();
        let entry = self.update(|doc| (doc.push(resource, payload, now_ms, queued_at), true))?;

        tracing::debug!(local_id = %entry.local_id, resource, "enqueued submission");
        Ok(entry)
    }

    fn list_pending(&self) -> Result<Vec<PendingSubmission>> {
        Ok(self.read_document()?.entries)
    }

    fn remove(&self, local_id: LocalId) -> Result<bool> {
        let removed = self.update(|doc| {
            let removed = doc.remove(local_id);
            (removed, removed)
        })?;

        if removed {
            tracing::debug!(%local_id, "removed submission");
        }
        Ok(removed)
    }

    fn try_lock_drain(&self) -> Result<Option<DrainLock>> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.drain_lock_path)?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(DrainLock::file(file))),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                tracing::debug!(path = %self.drain_lock_path.display(), "queue drain lock held elsewhere");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
