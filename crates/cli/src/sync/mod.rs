// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Submission and synchronization engine.
//!
//! Gets expense records and their receipts accepted by the ReportPilot API,
//! buffering records locally while the network is unavailable.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌─────────────┐     ┌─────────────┐
//! │    Upload    │────►│   Remote    │────►│  ReportPilot│
//! │ Coordinator  │◄────│   (trait)   │◄────│     API     │
//! └──────┬───────┘     └──────▲──────┘     └─────────────┘
//!        │                    │
//!        ▼                    │
//! ┌──────────────┐     ┌──────┴──────┐     ┌─────────────┐
//! │  JobTracker  │     │    Sync     │────►│ QueueStore  │
//! │ (PollMachine)│     │  Scheduler  │◄────│  (pending)  │
//! └──────────────┘     └──────▲──────┘     └─────────────┘
//!                             │
//!                      ┌──────┴──────┐
//!                      │Connectivity │
//!                      │  Monitor    │
//!                      └─────────────┘
//! ```
//!
//! # Features
//!
//! - Receipt upload with local file type validation
//! - Sequential polling of asynchronous extraction jobs with timeout
//! - Durable FIFO queue for records created while offline
//! - Replay on reconnect, on demand, or on a timer
//! - Injectable remote and credential traits for testing

mod connectivity;
mod remote;
mod scheduler;
mod tracker;
mod upload;

pub use connectivity::{spawn_probe, ConnectivityEvents, ConnectivityMonitor, Reachability, Transition};
pub use remote::{
    CredentialSource, EnvCredential, HttpRemote, Remote, RemoteError, RemoteFuture, RemoteResult,
    StaticCredential,
};
pub use scheduler::{DrainReport, SchedulerConfig, SubmitOutcome, SyncError, SyncScheduler};
pub use tracker::{
    JobResult, JobTracker, PollConfig, PollMachine, PollPhase, PollStep, ProgressUpdate,
    TrackError, MAX_IN_PROGRESS,
};
pub use upload::{FileTypePolicy, ReceiptFile, UploadCoordinator, UploadError, UploadOutcome};

#[cfg(test)]
mod test_helpers;




#[cfg(test)]
mod tracker_tests;
