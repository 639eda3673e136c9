// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod config;
pub mod discard;
pub mod pending;
pub mod submit;
pub mod sync;
pub mod upload;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rp_core::FileQueueStore;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::{state_dir, Config};
use crate::error::Result;
use crate::sync::{
    ConnectivityMonitor, CredentialSource, EnvCredential, FileTypePolicy, HttpRemote, JobTracker,
    PollConfig, SchedulerConfig, SyncScheduler, UploadCoordinator,
};

/// Everything a command needs: where state lives and how to reach the API.
pub struct Context {
    state_dir: PathBuf,
    config: Config,
    credentials: Arc<dyn CredentialSource>,
}

impl Context {
    /// Loads configuration from the state directory.
    pub fn load() -> Result<Self> {
        let state_dir = state_dir();
        let config = Config::load(&state_dir)?;
        debug!(state_dir = %state_dir.display(), "loaded configuration");
        Ok(Context::new(state_dir, config, Arc::new(EnvCredential)))
    }

    pub fn new(state_dir: PathBuf, config: Config, credentials: Arc<dyn CredentialSource>) -> Self {
        Context {
            state_dir,
            config,
            credentials,
        }
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn open_store(&self) -> Result<Arc<FileQueueStore>> {
        Ok(Arc::new(FileQueueStore::open(&self.state_dir)?))
    }

    pub fn remote(&self) -> Result<Arc<HttpRemote>> {
        Ok(Arc::new(HttpRemote::new(
            &self.config.remote,
            Arc::clone(&self.credentials),
        )?))
    }

    /// Builds a scheduler whose connectivity monitor starts at `online`.
    pub fn scheduler(&self, online: bool) -> Result<SyncScheduler> {
        self.scheduler_with(self.remote()?, ConnectivityMonitor::new(online))
    }

    pub fn scheduler_with(
        &self,
        remote: Arc<HttpRemote>,
        monitor: ConnectivityMonitor,
    ) -> Result<SyncScheduler> {
        Ok(SyncScheduler::new(
            self.open_store()?,
            remote,
            monitor,
            Arc::clone(&self.credentials),
            SchedulerConfig::from(&self.config.sync),
        ))
    }

    pub fn coordinator(&self) -> Result<UploadCoordinator> {
        let remote = self.remote()?;
        let tracker = JobTracker::new(remote.clone(), PollConfig::from(&self.config.polling));
        Ok(UploadCoordinator::new(
            remote,
            tracker,
            FileTypePolicy::from(&self.config.upload),
        ))
    }
}

/// Returns a token that is cancelled on Ctrl-C.
pub fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("interrupt received, shutting down");
            trigger.cancel();
        }
    });
    token
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
