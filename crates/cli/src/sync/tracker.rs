// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Processing job tracking.
//!
//! Polling is split in two layers:
//!
//! - [`PollMachine`] is a pure state machine. It decides how long to wait
//!   and what a status response means, but never sleeps or performs I/O.
//! - [`JobTracker`] drives a machine with `tokio::time` and a [`Remote`],
//!   one status check at a time, and enforces a single poll loop per job.
//!
//! ```text
//! Initiated ──start──► Polling ──observe──► Completed
//!                        │  ▲               Failed
//!                        └──┘ (in progress) TimedOut
//!                     cancel ──────────────► Cancelled
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use rp_core::{ExtractedData, JobSnapshot, JobStatus};

use super::remote::{Remote, RemoteError};
use crate::config::PollingConfig;

/// Progress reported while a job is still running never exceeds this value.
pub const MAX_IN_PROGRESS: u8 = 95;

/// Timing of a poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Wait before the first status check.
    pub initial_delay: Duration,
    /// Wait between subsequent checks.
    pub interval: Duration,
    /// Number of status checks before giving up.
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        PollConfig {
            initial_delay: Duration::from_secs(1),
            interval: Duration::from_secs(2),
            max_attempts: 60,
        }
    }
}

impl From<&PollingConfig> for PollConfig {
    fn from(config: &PollingConfig) -> Self {
        PollConfig {
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            interval: Duration::from_millis(config.interval_ms),
            max_attempts: config.max_attempts,
        }
    }
}

impl PollConfig {
    /// Upper bound on time spent waiting, excluding request time.
    pub fn ceiling(&self) -> Duration {
        self.initial_delay + self.interval * self.max_attempts.saturating_sub(1)
    }
}

/// Lifecycle phase of a poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    Initiated,
    Polling,
    Completed,
    Failed,
    TimedOut,
    Cancelled,
}

impl PollPhase {
    pub fn is_terminal(self) -> bool {
        !matches!(self, PollPhase::Initiated | PollPhase::Polling)
    }
}

/// Progress notification emitted after a status check.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub job_id: String,
    pub status: JobStatus,
    /// 1-based number of the status check that produced this update.
    pub attempt: u32,
    /// Synthetic percentage, 0 to 100.
    pub progress: u8,
}

/// Successful end of a processing job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobResult {
    pub job_id: String,
    pub status: JobStatus,
    pub storage_path: Option<String>,
    pub extracted_data: Option<ExtractedData>,
}

impl JobResult {
    pub fn from_snapshot(snapshot: JobSnapshot) -> Self {
        JobResult {
            job_id: snapshot.id,
            status: snapshot.status,
            storage_path: snapshot.storage_path,
            extracted_data: snapshot.extracted_data,
        }
    }
}

/// Ways a poll loop can end without a result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackError {
    #[error("lost contact while checking job {job_id}: {message}")]
    PollingTransport { job_id: String, message: String },

    #[error("the server failed to process job {job_id}\n  hint: check the file is a readable receipt and upload it again")]
    RemoteProcessingFailed { job_id: String },

    #[error("job {job_id} did not finish after {attempts} checks\n  hint: the server may still complete it; try again later")]
    ProcessingTimeout { job_id: String, attempts: u32 },

    #[error("job {0} is already being tracked")]
    AlreadyTracking(String),

    #[error("tracking of job {0} was cancelled")]
    Cancelled(String),
}

/// Result of feeding one status check into a [`PollMachine`].
#[derive(Debug, Clone, PartialEq)]
pub enum PollStep {
    /// The job is still running; check again after `next_check_in`.
    Continue {
        update: ProgressUpdate,
        next_check_in: Duration,
    },
    /// The loop ended. `final_update` reports the check that ended it, if
    /// the check got a status back.
    Finished {
        result: Result<JobResult, TrackError>,
        final_update: Option<ProgressUpdate>,
    },
    /// The machine is not polling, so the observation was discarded.
    Ignored,
}

/// Pure poll state machine for one job.
#[derive(Debug, Clone)]
pub struct PollMachine {
    job_id: String,
    config: PollConfig,
    phase: PollPhase,
    attempts: u32,
    progress: u8,
}

impl PollMachine {
    pub fn new(job_id: impl Into<String>, config: PollConfig) -> Self {
        PollMachine {
            job_id: job_id.into(),
            config,
            phase: PollPhase::Initiated,
            attempts: 0,
            progress: 0,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn phase(&self) -> PollPhase {
        self.phase
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// Enters polling and returns the delay before the first check.
    pub fn start(&mut self) -> Duration {
        if self.phase == PollPhase::Initiated {
            self.phase = PollPhase::Polling;
        }
        self.config.initial_delay
    }

    /// Stops the loop. Later observations are ignored.
    pub fn cancel(&mut self) {
        if !self.phase.is_terminal() {
            self.phase = PollPhase::Cancelled;
        }
    }

    /// Consumes the result of one status check.
    pub fn observe(&mut self, result: Result<JobSnapshot, RemoteError>) -> PollStep {
        if self.phase != PollPhase::Polling {
            return PollStep::Ignored;
        }
        self.attempts += 1;

        let snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.phase = PollPhase::Failed;
                return self.finish(Err(TrackError::PollingTransport {
                    job_id: self.job_id.clone(),
                    message: e.to_string(),
                }));
            }
        };

        if snapshot.status.is_completed() {
            self.phase = PollPhase::Completed;
            self.progress = 100;
            let update = self.update(snapshot.status.clone());
            let mut job = JobResult::from_snapshot(snapshot);
            job.job_id = self.job_id.clone();
            return PollStep::Finished {
                result: Ok(job),
                final_update: Some(update),
            };
        }

        if snapshot.status.is_failed() {
            self.phase = PollPhase::Failed;
            return PollStep::Finished {
                final_update: Some(self.update(snapshot.status)),
                result: Err(TrackError::RemoteProcessingFailed {
                    job_id: self.job_id.clone(),
                }),
            };
        }

        // Pending, processing and unrecognized statuses all mean "not done yet".
        self.progress = self.progress.max(self.synthetic_progress());
        if self.attempts >= self.config.max_attempts {
            self.phase = PollPhase::TimedOut;
            return PollStep::Finished {
                final_update: Some(self.update(snapshot.status)),
                result: Err(TrackError::ProcessingTimeout {
                    job_id: self.job_id.clone(),
                    attempts: self.attempts,
                }),
            };
        }

        PollStep::Continue {
            update: self.update(snapshot.status),
            next_check_in: self.config.interval,
        }
    }

    fn synthetic_progress(&self) -> u8 {
        let max = u64::from(self.config.max_attempts.max(1));
        let scaled = u64::from(self.attempts) * u64::from(MAX_IN_PROGRESS) / max;
        u8::try_from(scaled.min(u64::from(MAX_IN_PROGRESS))).unwrap_or(MAX_IN_PROGRESS)
    }

    fn update(&self, status: JobStatus) -> ProgressUpdate {
        ProgressUpdate {
            job_id: self.job_id.clone(),
            status,
            attempt: self.attempts,
            progress: self.progress,
        }
    }

    fn finish(&self, result: Result<JobResult, TrackError>) -> PollStep {
        PollStep::Finished {
            result,
            final_update: None,
        }
    }
}

struct ActiveJob {
    generation: u64,
    token: CancellationToken,
}

type ActiveMap = Arc<Mutex<HashMap<String, ActiveJob>>>;

/// Removes a job from the active map when its poll loop ends.
struct ActiveGuard {
    active: ActiveMap,
    job_id: String,
    generation: u64,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if active
            .get(&self.job_id)
            .is_some_and(|job| job.generation == self.generation)
        {
            active.remove(&self.job_id);
        }
    }
}

/// Drives [`PollMachine`]s against a [`Remote`].
#[derive(Clone)]
pub struct JobTracker {
    remote: Arc<dyn Remote>,
    config: PollConfig,
    active: ActiveMap,
    generation: Arc<AtomicU64>,
}

impl JobTracker {
    pub fn new(remote: Arc<dyn Remote>, config: PollConfig) -> Self {
        JobTracker {
            remote,
            config,
            active: Arc::new(Mutex::new(HashMap::new())),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Polls `job_id` until it reaches a terminal state.
    ///
    /// `on_update` is called after every check that returned a status,
    /// including the last one; on success it reports 100%.
    pub async fn track<F>(&self, job_id: &str, mut on_update: F) -> Result<JobResult, TrackError>
    where
        F: FnMut(&ProgressUpdate) + Send,
    {
        let (token, _guard) = self.register(job_id)?;
        self.drive(job_id, &token, &mut on_update).await
    }

    /// Spawns a poll loop and reports its end through `on_terminal`.
    ///
    /// `on_terminal` runs exactly once unless the job is cancelled, in which
    /// case it never runs. Fails immediately if the job is already tracked.
    pub fn start_tracking<U, T>(
        &self,
        job_id: &str,
        mut on_update: U,
        on_terminal: T,
    ) -> Result<JoinHandle<()>, TrackError>
    where
        U: FnMut(&ProgressUpdate) + Send + 'static,
        T: FnOnce(Result<JobResult, TrackError>) + Send + 'static,
    {
        let (token, guard) = self.register(job_id)?;
        let tracker = self.clone();
        let job_id = job_id.to_string();

        Ok(tokio::spawn(async move {
            let _guard = guard;
            let result = tracker.drive(&job_id, &token, &mut on_update).await;
            if matches!(result, Err(TrackError::Cancelled(_))) || token.is_cancelled() {
                debug!(%job_id, "terminal result suppressed after cancel");
                return;
            }
            on_terminal(result);
        }))
    }

    /// Stops the poll loop for `job_id`. Returns false if it was not tracked.
    pub fn cancel(&self, job_id: &str) -> bool {
        let removed = self
            .active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(job_id);
        match removed {
            Some(job) => {
                info!(%job_id, "cancelling job tracking");
                job.token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_tracking(&self, job_id: &str) -> bool {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(job_id)
    }

    /// Ids of all jobs with a running poll loop, sorted.
    pub fn active_jobs(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    fn register(&self, job_id: &str) -> Result<(CancellationToken, ActiveGuard), TrackError> {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if active.contains_key(job_id) {
            return Err(TrackError::AlreadyTracking(job_id.to_string()));
        }

        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        active.insert(
            job_id.to_string(),
            ActiveJob {
                generation,
                token: token.clone(),
            },
        );

        let guard = ActiveGuard {
            active: Arc::clone(&self.active),
            job_id: job_id.to_string(),
            generation,
        };
        Ok((token, guard))
    }

    async fn drive<F>(
        &self,
        job_id: &str,
        token: &CancellationToken,
        on_update: &mut F,
    ) -> Result<JobResult, TrackError>
    where
        F: FnMut(&ProgressUpdate) + Send,
    {
        let cancelled = || TrackError::Cancelled(job_id.to_string());
        let mut machine = PollMachine::new(job_id, self.config.clone());
        let mut delay = machine.start();
        info!(%job_id, "tracking processing job");

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => return Err(cancelled()),
                _ = tokio::time::sleep(delay) => {}
            }

            let response = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(cancelled()),
                response = self.remote.job_status(job_id) => response,
            };
            if token.is_cancelled() {
                machine.cancel();
                return Err(cancelled());
            }

            match machine.observe(response) {
                PollStep::Continue {
                    update,
                    next_check_in,
                } => {
                    debug!(%job_id, attempt = update.attempt, status = %update.status, progress = update.progress, "job still running");
                    on_update(&update);
                    delay = next_check_in;
                }
                PollStep::Finished {
                    result,
                    final_update,
                } => {
                    if let Some(update) = final_update {
                        on_update(&update);
                    }
                    match &result {
                        Ok(_) => info!(%job_id, attempts = machine.attempts(), "job completed"),
                        Err(e) => warn!(%job_id, error = %e, "job tracking ended"),
                    }
                    return result;
                }
                PollStep::Ignored => return Err(cancelled()),
            }
        }
    }
}
