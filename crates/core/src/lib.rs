// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! rp-core: Shared library for the ReportPilot submission engine
//!
//! This crate provides the data model and the durable submission queue used
//! by the `rpilot` client: pending submissions, remote processing job
//! snapshots, the local id clock, and the [`QueueStore`] implementations.

pub mod clock;
pub mod error;
pub mod job;
pub mod store;
pub mod submission;

pub use clock::{ClockSource, ManualClock, SystemClock};
pub use error::{Error, Result};
pub use job::{ExtractedData, JobSnapshot, JobStatus};
pub use store::{DrainLock, FileQueueStore, MemoryQueueStore, QueueStore, QUEUE_KEY};
pub use submission::{LocalId, PendingSubmission};
