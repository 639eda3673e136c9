// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Submission and replay of expense records.
//!
//! [`SyncScheduler::submit`] sends a record right away when the remote is
//! believed reachable and falls back to the durable queue otherwise.
//! [`SyncScheduler::drain`] replays the queue in enqueue order, removing
//! each entry only after the remote accepted it.
//!
//! Drains are triggered by a connectivity transition to online, by an
//! explicit [`SyncScheduler::sync_now`], or by an optional periodic timer.
//! Overlapping triggers share a single pass. Each pass also claims the
//! store's drain lock, so schedulers in other processes sharing the same
//! queue skip instead of replaying the same entries.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{watch, Notify};
use tokio::time::{Instant, Interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use rp_core::{LocalId, PendingSubmission, QueueStore};

use super::connectivity::{ConnectivityMonitor, Transition};
use super::remote::{CredentialSource, Remote, RemoteError};
use crate::config::SyncConfig;

/// Counts from one drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    /// Entries accepted by the remote and removed from the queue.
    pub succeeded: usize,
    /// Entries the remote did not accept; they stay queued.
    pub failed: usize,
    /// Entries not attempted because no credential was available.
    pub deferred: usize,
    /// True if cancellation stopped the pass before the end of the queue.
    pub cancelled: bool,
    /// True if another process was replaying the queue, so nothing was attempted.
    pub busy: bool,
}

impl DrainReport {
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// What happened to a submitted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The remote accepted the record.
    Sent,
    /// The record was queued for a later drain.
    Queued(LocalId),
}

/// Errors from the scheduler.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Storage(#[from] rp_core::Error),

    #[error("server rejected record with status {status}: {body}\n  hint: the record was not queued; fix it and submit again")]
    RemoteRejected { status: u16, body: String },

    #[error("invalid response from server: {0}")]
    InvalidResponse(String),

    /// A coalesced drain whose leading pass did not produce a report.
    #[error("drain failed: {0}")]
    DrainFailed(String),
}

/// Scheduler policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Skip replay entirely while no bearer credential is available.
    pub require_credential_for_replay: bool,
    /// Drain on a timer as well as on triggers.
    pub periodic_drain: Option<Duration>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            require_credential_for_replay: true,
            periodic_drain: None,
        }
    }
}

impl From<&SyncConfig> for SchedulerConfig {
    fn from(config: &SyncConfig) -> Self {
        SchedulerConfig {
            require_credential_for_replay: config.require_credential_for_replay,
            periodic_drain: (config.periodic_drain_secs > 0)
                .then(|| Duration::from_secs(config.periodic_drain_secs)),
        }
    }
}

type DrainSlot = Option<Result<DrainReport, String>>;

enum DrainRole {
    Leader(watch::Sender<DrainSlot>),
    Follower(watch::Receiver<DrainSlot>),
}

/// Clears the in-flight slot when the leading pass ends, even if dropped early.
struct InFlightGuard<'a> {
    slot: &'a Mutex<Option<watch::Receiver<DrainSlot>>>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

/// Coordinates immediate submission, queueing, and replay.
pub struct SyncScheduler {
    store: Arc<dyn QueueStore>,
    remote: Arc<dyn Remote>,
    connectivity: ConnectivityMonitor,
    credentials: Arc<dyn CredentialSource>,
    config: SchedulerConfig,
    trigger: Notify,
    in_flight: Mutex<Option<watch::Receiver<DrainSlot>>>,
}

impl SyncScheduler {
    pub fn new(
        store: Arc<dyn QueueStore>,
        remote: Arc<dyn Remote>,
        connectivity: ConnectivityMonitor,
        credentials: Arc<dyn CredentialSource>,
        config: SchedulerConfig,
    ) -> Self {
        SyncScheduler {
            store,
            remote,
            connectivity,
            credentials,
            config,
            trigger: Notify::new(),
            in_flight: Mutex::new(None),
        }
    }

    pub fn connectivity(&self) -> &ConnectivityMonitor {
        &self.connectivity
    }

    /// Queues a record for the next drain.
    pub fn enqueue_for_later_submission(
        &self,
        resource: &str,
        payload: serde_json::Value,
    ) -> Result<LocalId, SyncError> {
        let entry = self.store.enqueue(resource, payload)?;
        info!(local_id = %entry.local_id, resource, "queued submission for later");
        Ok(entry.local_id)
    }

    /// Sends a record now, or queues it when the remote cannot be reached.
    ///
    /// A record the remote rejects is returned as an error and never queued.
    pub async fn submit(
        &self,
        resource: &str,
        payload: serde_json::Value,
    ) -> Result<SubmitOutcome, SyncError> {
        if !self.connectivity.is_online() {
            debug!(resource, "offline, queueing submission");
            let local_id = self.enqueue_for_later_submission(resource, payload)?;
            return Ok(SubmitOutcome::Queued(local_id));
        }

        match self.remote.create_record(resource, &payload).await {
            Ok(()) => {
                info!(resource, "record created");
                Ok(SubmitOutcome::Sent)
            }
            Err(RemoteError::Transport(message)) => {
                warn!(resource, error = %message, "server unreachable, queueing submission");
                let local_id = self.enqueue_for_later_submission(resource, payload)?;
                Ok(SubmitOutcome::Queued(local_id))
            }
            Err(RemoteError::Rejected { status, body }) => {
                Err(SyncError::RemoteRejected { status, body })
            }
            Err(RemoteError::InvalidResponse(message)) => Err(SyncError::InvalidResponse(message)),
        }
    }

    /// Replays the queue once, in order.
    ///
    /// If a pass is already running in this scheduler, waits for it and
    /// returns its report instead of starting another. If `cancel` fires
    /// while waiting, returns a cancelled report and leaves that pass running.
    /// If another scheduler holds the queue, returns a `busy` report.
    pub async fn drain(&self, cancel: &CancellationToken) -> Result<DrainReport, SyncError> {
        let role = {
            let mut slot = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
            match slot.as_ref() {
                Some(rx) => DrainRole::Follower(rx.clone()),
                None => {
                    let (tx, rx) = watch::channel(None);
                    *slot = Some(rx);
                    DrainRole::Leader(tx)
                }
            }
        };

        match role {
            DrainRole::Follower(rx) => {
                debug!("drain already running, waiting for its report");
                Self::await_in_flight(rx, cancel).await
            }
            DrainRole::Leader(tx) => {
                let _guard = InFlightGuard {
                    slot: &self.in_flight,
                };
                let result = self.drain_pass(cancel).await;
                tx.send_replace(Some(
                    result.as_ref().map(|report| *report).map_err(|e| e.to_string()),
                ));
                result
            }
        }
    }

    /// Requests a drain from the running [`SyncScheduler::run`] loop.
    pub fn sync_now(&self) {
        self.trigger.notify_one();
    }

    /// Drains on every trigger until `cancel` fires.
    ///
    /// Runs one drain at startup when already online. Drain failures are
    /// logged and the loop keeps waiting for the next trigger.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut events = self.connectivity.subscribe();
        let mut periodic = self
            .config
            .periodic_drain
            .map(|period| tokio::time::interval_at(Instant::now() + period, period));

        info!("sync scheduler started");
        if self.connectivity.is_online() {
            self.drain_logged("startup", &cancel).await;
        }

        loop {
            let reason = tokio::select! {
                _ = cancel.cancelled() => break,
                transition = events.next() => match transition {
                    Some(Transition::CameOnline) => "came online",
                    Some(Transition::WentOffline) => {
                        debug!("went offline");
                        continue;
                    }
                    None => break,
                },
                _ = self.trigger.notified() => "sync requested",
                _ = next_tick(&mut periodic) => "periodic",
            };
            self.drain_logged(reason, &cancel).await;
        }
        info!("sync scheduler stopped");
    }

    /// Entries waiting for replay, in enqueue order.
    pub fn pending(&self) -> Result<Vec<PendingSubmission>, SyncError> {
        Ok(self.store.list_pending()?)
    }

    /// Drops a queued entry without sending it.
    pub fn discard(&self, local_id: LocalId) -> Result<bool, SyncError> {
        let removed = self.store.remove(local_id)?;
        if removed {
            info!(%local_id, "discarded queued submission");
        }
        Ok(removed)
    }

    async fn drain_logged(&self, reason: &str, cancel: &CancellationToken) {
        debug!(reason, "drain triggered");
        match self.drain(cancel).await {
            Ok(report) if report.attempted() > 0 || report.deferred > 0 => info!(
                reason,
                succeeded = report.succeeded,
                failed = report.failed,
                deferred = report.deferred,
                "drain finished"
            ),
            Ok(report) if report.busy => info!(reason, "drain skipped, queue busy"),
            Ok(_) => debug!(reason, "queue empty"),
            Err(e) => error!(reason, error = %e, "drain failed"),
        }
    }

    async fn await_in_flight(
        mut rx: watch::Receiver<DrainSlot>,
        cancel: &CancellationToken,
    ) -> Result<DrainReport, SyncError> {
        let outcome = tokio::select! {
            _ = cancel.cancelled() => {
                debug!("stopped waiting for running drain");
                return Ok(DrainReport {
                    cancelled: true,
                    ..Default::default()
                });
            }
            waited = rx.wait_for(Option::is_some) => waited
                .map_err(|_| SyncError::DrainFailed("drain was abandoned".to_string()))?
                .clone(),
        };

        match outcome {
            Some(Ok(report)) => Ok(report),
            Some(Err(message)) => Err(SyncError::DrainFailed(message)),
            None => Err(SyncError::DrainFailed("drain was abandoned".to_string())),
        }
    }

    async fn drain_pass(&self, cancel: &CancellationToken) -> Result<DrainReport, SyncError> {
        let Some(_drain_lock) = self.store.try_lock_drain()? else {
            info!("queue is being replayed by another process, skipping");
            return Ok(DrainReport {
                busy: true,
                ..Default::default()
            });
        };

        let pending = self.store.list_pending()?;
        let mut report = DrainReport::default();
        if pending.is_empty() {
            return Ok(report);
        }

        if self.config.require_credential_for_replay && self.credentials.bearer_token().is_none() {
            info!(count = pending.len(), "no credential available, deferring replay");
            report.deferred = pending.len();
            return Ok(report);
        }

        info!(count = pending.len(), "replaying queued submissions");
        for entry in &pending {
            if cancel.is_cancelled() {
                info!(remaining = pending.len() - report.attempted(), "drain cancelled");
                report.cancelled = true;
                break;
            }

            match self.remote.create_record(&entry.resource, &entry.payload).await {
                Ok(()) => {
                    self.store.remove(entry.local_id)?;
                    debug!(local_id = %entry.local_id, "replayed submission");
                    report.succeeded += 1;
                }
                Err(e) => {
                    warn!(local_id = %entry.local_id, error = %e, "replay failed, keeping entry");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}

async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
