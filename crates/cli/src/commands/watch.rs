// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use tracing::{info, warn};

use crate::error::Result;
use crate::sync::{spawn_probe, ConnectivityMonitor};

use super::{shutdown_token, Context};

/// Probes the API and replays the queue whenever it becomes reachable,
/// until interrupted.
pub async fn run(ctx: &Context) -> Result<()> {
    let remote = ctx.remote()?;
    let monitor = ConnectivityMonitor::new(false);
    let scheduler = ctx.scheduler_with(remote.clone(), monitor.clone())?;
    let cancel = shutdown_token();

    let interval = Duration::from_secs(ctx.config().sync.probe_interval_secs);
    let probe = spawn_probe(monitor, remote, interval, cancel.clone());
    info!(
        base_url = %ctx.config().remote.base_url,
        state_dir = %ctx.state_dir().display(),
        interval_secs = interval.as_secs(),
        "watching for connectivity"
    );
    eprintln!(
        "watching {} (press Ctrl-C to stop)",
        ctx.config().remote.base_url
    );

    scheduler.run(cancel).await;
    if let Err(e) = probe.await {
        warn!(error = %e, "connectivity probe ended abnormally");
    }
    Ok(())
}
