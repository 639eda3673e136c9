// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connectivity monitoring.
//!
//! The monitor owns a single boolean. Observations are pushed in with
//! [`ConnectivityMonitor::set_online`]; subscribers receive a
//! [`Transition`] only when the value actually changes.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// A change of connectivity state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    CameOnline,
    WentOffline,
}

impl Transition {
    fn from_state(online: bool) -> Self {
        if online {
            Transition::CameOnline
        } else {
            Transition::WentOffline
        }
    }
}

/// Source of truth for whether the remote is believed reachable.
///
/// Cloning is cheap; all clones share the same state.
#[derive(Clone)]
pub struct ConnectivityMonitor {
    state: Arc<watch::Sender<bool>>,
}

impl ConnectivityMonitor {
    pub fn new(initially_online: bool) -> Self {
        let (tx, _rx) = watch::channel(initially_online);
        ConnectivityMonitor { state: Arc::new(tx) }
    }

    pub fn is_online(&self) -> bool {
        *self.state.borrow()
    }

    /// Records an observation. Returns true if the state changed.
    pub fn set_online(&self, online: bool) -> bool {
        let changed = self.state.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
        if changed {
            info!(online, "connectivity changed");
        }
        changed
    }

    /// Subscribes to future transitions.
    pub fn subscribe(&self) -> ConnectivityEvents {
        let rx = self.state.subscribe();
        let last = *rx.borrow();
        ConnectivityEvents { rx, last }
    }
}

/// Stream of connectivity transitions for one subscriber.
pub struct ConnectivityEvents {
    rx: watch::Receiver<bool>,
    last: bool,
}

impl ConnectivityEvents {
    /// Waits for the next transition.
    ///
    /// Returns `None` once every monitor handle has been dropped. Rapid
    /// flips that land back on the last seen state are not reported.
    pub async fn next(&mut self) -> Option<Transition> {
        loop {
            self.rx.changed().await.ok()?;
            let current = *self.rx.borrow_and_update();
            if current != self.last {
                self.last = current;
                return Some(Transition::from_state(current));
            }
        }
    }
}

/// A cheap check of whether the remote can be reached.
pub trait Reachability: Send + Sync {
    fn probe(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>>;
}

/// Spawns a background task that probes reachability every `interval` and
/// feeds the result into `monitor` until `cancel` fires.
pub fn spawn_probe<R>(
    monitor: ConnectivityMonitor,
    probe: Arc<R>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()>
where
    R: Reachability + ?Sized + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("connectivity probe stopped");
                    break;
                }
                _ = ticker.tick() => {
                    let reachable = tokio::select! {
                        _ = cancel.cancelled() => break,
                        reachable = probe.probe() => reachable,
                    };
                    debug!(reachable, "connectivity probe");
                    monitor.set_online(reachable);
                }
            }
        }
    })
}
