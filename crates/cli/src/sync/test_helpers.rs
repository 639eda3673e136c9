// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use rp_core::{JobSnapshot, JobStatus};
use serde_json::Value;

use super::connectivity::Reachability;
use super::remote::{Remote, RemoteError, RemoteFuture, RemoteResult};
use super::upload::ReceiptFile;

/// Scripted remote for testing without a server.
///
/// Responses are consumed in order. When the status script runs out, the
/// fallback status is returned; record creation defaults to success.
pub struct MockRemote {
    uploads: Mutex<VecDeque<RemoteResult<JobSnapshot>>>,
    statuses: Mutex<VecDeque<RemoteResult<JobSnapshot>>>,
    fallback_status: Mutex<Option<RemoteResult<JobSnapshot>>>,
    creates: Mutex<VecDeque<RemoteResult<()>>>,
    create_delay: Mutex<Option<Duration>>,
    created: Mutex<Vec<(String, Value)>>,
    upload_calls: AtomicUsize,
    status_calls: AtomicUsize,
}

impl MockRemote {
    pub fn new() -> Self {
        MockRemote {
            uploads: Mutex::new(VecDeque::new()),
            statuses: Mutex::new(VecDeque::new()),
            fallback_status: Mutex::new(None),
            creates: Mutex::new(VecDeque::new()),
            create_delay: Mutex::new(None),
            created: Mutex::new(Vec::new()),
            upload_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
        }
    }

    pub fn push_upload(&self, response: RemoteResult<JobSnapshot>) {
        self.uploads.lock().unwrap().push_back(response);
    }

    pub fn push_status(&self, response: RemoteResult<JobSnapshot>) {
        self.statuses.lock().unwrap().push_back(response);
    }

    /// Status returned once the scripted statuses are exhausted.
    pub fn set_fallback_status(&self, response: RemoteResult<JobSnapshot>) {
        *self.fallback_status.lock().unwrap() = Some(response);
    }

    pub fn push_create(&self, response: RemoteResult<()>) {
        self.creates.lock().unwrap().push_back(response);
    }

    /// Makes every record creation take `delay` of (virtual) time.
    pub fn set_create_delay(&self, delay: Duration) {
        *self.create_delay.lock().unwrap() = Some(delay);
    }

    /// Records the remote accepted, in order.
    pub fn created(&self) -> Vec<(String, Value)> {
        self.created.lock().unwrap().clone()
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

impl Remote for MockRemote {
    fn initiate_upload<'a>(&'a self, _file: &'a ReceiptFile) -> RemoteFuture<'a, JobSnapshot> {
        Box::pin(async move {
            self.upload_calls.fetch_add(1, Ordering::SeqCst);
            self.uploads
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(RemoteError::Transport("no scripted upload".into())))
        })
    }

    fn job_status<'a>(&'a self, _job_id: &'a str) -> RemoteFuture<'a, JobSnapshot> {
        Box::pin(async move {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            let scripted = self.statuses.lock().unwrap().pop_front();
            scripted.unwrap_or_else(|| {
                self.fallback_status
                    .lock()
                    .unwrap()
                    .clone()
                    .unwrap_or_else(|| Err(RemoteError::Transport("no scripted status".into())))
            })
        })
    }

    fn create_record<'a>(&'a self, resource: &'a str, payload: &'a Value) -> RemoteFuture<'a, ()> {
        Box::pin(async move {
            let delay = *self.create_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            let response = self.creates.lock().unwrap().pop_front().unwrap_or(Ok(()));
            if response.is_ok() {
                self.created
                    .lock()
                    .unwrap()
                    .push((resource.to_string(), payload.clone()));
            }
            response
        })
    }
}

/// Reachability probe with a switchable answer.
pub struct SwitchReachability {
    reachable: AtomicBool,
    probes: AtomicUsize,
}

impl SwitchReachability {
    pub fn new(reachable: bool) -> Self {
        SwitchReachability {
            reachable: AtomicBool::new(reachable),
            probes: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

impl Reachability for SwitchReachability {
    fn probe(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(async move {
            self.probes.fetch_add(1, Ordering::SeqCst);
            self.reachable.load(Ordering::SeqCst)
        })
    }
}

pub fn snapshot(id: &str, status: &str) -> JobSnapshot {
    JobSnapshot::new(id, JobStatus::parse(status))
}

pub fn transport_error() -> RemoteError {
    RemoteError::Transport("connection refused".into())
}

pub fn rejected(status: u16) -> RemoteError {
    RemoteError::Rejected {
        status,
        body: "{\"detail\":\"bad request\"}".into(),
    }
}
