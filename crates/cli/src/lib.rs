// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! rpsync - Offline-tolerant submission client for ReportPilot.
//!
//! This crate provides the functionality behind the `rpilot` CLI: it uploads
//! receipts to the ReportPilot API, follows their asynchronous extraction
//! jobs, and creates expense records, queueing them durably whenever the
//! API cannot be reached and replaying them once it can.
//!
//! # Main Components
//!
//! - [`sync::UploadCoordinator`] - receipt validation, upload and job tracking
//! - [`sync::SyncScheduler`] - immediate submission, queue fallback and replay
//! - [`sync::ConnectivityMonitor`] - online/offline state and transitions
//! - [`Config`] - client configuration (`config.toml` in the state directory)
//! - [`Error`] - error types for all operations
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rpsync::sync::{ConnectivityMonitor, EnvCredential, HttpRemote, SchedulerConfig, SyncScheduler};
//!
//! let config = rpsync::Config::load(&rpsync::config::state_dir())?;
//! let remote = Arc::new(HttpRemote::new(&config.remote, Arc::new(EnvCredential))?);
//! let store = Arc::new(rp_core::FileQueueStore::open(rpsync::config::state_dir())?);
//! let scheduler = SyncScheduler::new(
//!     store,
//!     remote,
//!     ConnectivityMonitor::new(true),
//!     Arc::new(EnvCredential),
//!     SchedulerConfig::from(&config.sync),
//! );
//! scheduler.submit("/purchases", serde_json::json!({"amount": 12.5})).await?;
//! ```

mod cli;
mod commands;
mod logging;

pub mod config;
pub mod env;
pub mod error;
pub mod sync;

pub use cli::{Cli, Command, OutputFormat, PayloadArgs};
pub use config::Config;
pub use error::{Error, Result};

use commands::Context;

/// Execute a parsed command line. This is the main entry point for library
/// users and provides a testable way to run commands without process execution.
pub fn run(cli: Cli) -> Result<()> {
    logging::init(cli.verbose);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(dispatch(cli.command))
}

async fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Config { init, force } => commands::config::run(init, force),
        Command::Upload { file } => commands::upload::run(&Context::load()?, &file).await,
        Command::Submit {
            resource,
            payload,
            offline,
        } => commands::submit::run(&Context::load()?, resource, payload, offline).await,
        Command::Pending { output } => commands::pending::run(&Context::load()?, output),
        Command::Sync => commands::sync::run(&Context::load()?).await,
        Command::Discard { local_id } => commands::discard::run(&Context::load()?, &local_id),
        Command::Watch => commands::watch::run(&Context::load()?).await,
    }
}
