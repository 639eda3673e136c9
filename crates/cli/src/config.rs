// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration management.
//!
//! Configuration is stored in `<state_dir>/config.toml`. Every field has a
//! default, so a missing file or a partial file is valid:
//! - `[remote]`: API base URL, request timeout and endpoint paths
//! - `[polling]`: job status polling cadence
//! - `[sync]`: queue replay policy
//! - `[upload]`: accepted receipt file types
//!
//! `RP_API_URL` overrides `remote.base_url` after loading.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::env;
use crate::error::{Error, Result};

const STATE_DIR_NAME: &str = "reportpilot";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Client configuration stored in `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub remote: RemoteConfig,
    pub polling: PollingConfig,
    pub sync: SyncConfig,
    pub upload: UploadConfig,
}

/// ReportPilot API connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the API, without a trailing path.
    pub base_url: String,
    /// Per-request timeout in seconds (default: 60).
    pub timeout_secs: u64,
    /// Multipart receipt upload endpoint.
    pub upload_path: String,
    /// Prefix of the job status endpoint; the job id is appended.
    pub jobs_path: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 60,
            upload_path: "/receipts/upload".to_string(),
            jobs_path: "/receipts".to_string(),
        }
    }
}

/// Job status polling cadence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub initial_delay_ms: u64,
    pub interval_ms: u64,
    pub max_attempts: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        PollingConfig {
            initial_delay_ms: 1000,
            interval_ms: 2000,
            max_attempts: 60,
        }
    }
}

/// Queue replay settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Endpoint used by `rpilot submit` when `--resource` is omitted.
    pub default_resource: String,
    /// Seconds between reachability probes in `rpilot watch`.
    pub probe_interval_secs: u64,
    /// Seconds between fallback drains. 0 = disabled.
    pub periodic_drain_secs: u64,
    /// Keep entries queued while no bearer token is available.
    pub require_credential_for_replay: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            default_resource: "/purchases".to_string(),
            probe_interval_secs: 15,
            periodic_drain_secs: 0,
            require_credential_for_replay: true,
        }
    }
}

/// Accepted receipt file types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub allowed_extensions: Vec<String>,
    pub allowed_media_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        UploadConfig {
            allowed_extensions: ["csv", "pdf", "jpg", "jpeg", "png", "jfif"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            allowed_media_types: [
                "text/csv",
                "application/pdf",
                "image/jpeg",
                "image/jpg",
                "image/png",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl Config {
    /// Loads configuration from `state_dir`, falling back to defaults when
    /// no config file exists. Environment overrides are applied afterwards.
    pub fn load(state_dir: &Path) -> Result<Self> {
        let config_path = config_path(state_dir);
        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .map_err(|e| Error::Config(format!("failed to read config: {}", e)))?;
            Config::parse(&content)?
        } else {
            Config::default()
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML document without applying environment overrides.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("failed to parse config: {}", e)))
    }

    /// Saves configuration to `state_dir`, creating it if needed.
    pub fn save(&self, state_dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(state_dir)?;
        let config_path = config_path(state_dir);
        fs::write(&config_path, self.to_toml()?)?;
        Ok(config_path)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))
    }

    fn apply_env(&mut self) {
        if let Some(url) = env::api_url() {
            self.remote.base_url = url;
        }
    }

    /// Rejects settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        let url = self.remote.base_url.as_str();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "invalid base_url '{}': must start with http:// or https://",
                url
            )));
        }
        if self.remote.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be greater than 0".to_string()));
        }
        if self.polling.max_attempts == 0 {
            return Err(Error::Config("max_attempts must be greater than 0".to_string()));
        }
        if self.sync.probe_interval_secs == 0 {
            return Err(Error::Config(
                "probe_interval_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Returns the state directory: `RP_STATE_DIR`, or the platform data dir.
pub fn state_dir() -> PathBuf {
    if let Some(dir) = env::state_dir() {
        return dir;
    }
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(STATE_DIR_NAME)
}

pub fn config_path(state_dir: &Path) -> PathBuf {
    state_dir.join(CONFIG_FILE_NAME)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
