// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Receipt upload coordination.
//!
//! Validates a receipt file locally, hands it to the remote extraction
//! service, and follows the resulting job through the [`JobTracker`] when
//! the service processes it asynchronously.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use rp_core::ExtractedData;

use super::remote::{Remote, RemoteError};
use super::tracker::{JobResult, JobTracker, ProgressUpdate, TrackError};
use crate::config::UploadConfig;

/// A receipt file ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptFile {
    pub file_name: String,
    pub media_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ReceiptFile {
    pub fn new(file_name: impl Into<String>, media_type: Option<String>, bytes: Vec<u8>) -> Self {
        ReceiptFile {
            file_name: file_name.into(),
            media_type,
            bytes,
        }
    }

    /// Reads a file from disk, guessing its media type from the extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let (file_name, media_type) = Self::name_and_type(path);
        Ok(ReceiptFile::new(file_name, media_type, bytes))
    }

    /// File name and guessed media type of `path`. Does not touch the file.
    pub fn name_and_type(path: &Path) -> (String, Option<String>) {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let media_type = mime_guess::from_path(path)
            .first()
            .map(|mime| mime.essence_str().to_string());
        (file_name, media_type)
    }

    /// Lower-cased extension, without the dot.
    pub fn extension(&self) -> Option<String> {
        extension_of(&self.file_name)
    }
}

fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// Which receipt files are accepted for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTypePolicy {
    extensions: Vec<String>,
    media_types: Vec<String>,
}

impl Default for FileTypePolicy {
    fn default() -> Self {
        FileTypePolicy::new(
            ["csv", "pdf", "jpg", "jpeg", "png", "jfif"],
            [
                "text/csv",
                "application/pdf",
                "image/jpeg",
                "image/jpg",
                "image/png",
            ],
        )
    }
}

impl From<&UploadConfig> for FileTypePolicy {
    fn from(config: &UploadConfig) -> Self {
        FileTypePolicy::new(
            config.allowed_extensions.iter().map(String::as_str),
            config.allowed_media_types.iter().map(String::as_str),
        )
    }
}

impl FileTypePolicy {
    pub fn new<'a>(
        extensions: impl IntoIterator<Item = &'a str>,
        media_types: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        FileTypePolicy {
            extensions: extensions
                .into_iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            media_types: media_types.into_iter().map(str::to_lowercase).collect(),
        }
    }

    /// A file is accepted when its extension or its declared media type is allowed.
    pub fn accepts(&self, file: &ReceiptFile) -> bool {
        self.accepts_name(&file.file_name, file.media_type.as_deref())
    }

    pub fn accepts_name(&self, file_name: &str, media_type: Option<&str>) -> bool {
        let by_extension =
            extension_of(file_name).is_some_and(|ext| self.extensions.contains(&ext));
        let by_media_type =
            media_type.is_some_and(|mime| self.media_types.contains(&mime.to_lowercase()));
        by_extension || by_media_type
    }

    /// Allowed extensions, comma separated, for error hints.
    pub fn describe(&self) -> String {
        self.extensions.join(", ")
    }
}

/// Errors from [`UploadCoordinator::submit`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("unsupported file type: {file_name}\n  hint: allowed types are: {allowed}")]
    InvalidFileType { file_name: String, allowed: String },

    #[error("file is empty: {0}")]
    EmptyFile(String),

    #[error("upload rejected with status {status}: {body}")]
    RemoteRejected { status: u16, body: String },

    #[error("could not reach server: {0}\n  hint: check your connection and try again")]
    Transport(String),

    #[error("invalid response from server: {0}")]
    InvalidResponse(String),

    #[error("lost contact while checking job {job_id}: {message}")]
    PollingTransport { job_id: String, message: String },

    #[error("the server failed to process job {job_id}\n  hint: check the file is a readable receipt and upload it again")]
    RemoteProcessingFailed { job_id: String },

    #[error("job {job_id} did not finish after {attempts} checks\n  hint: the server may still complete it; try again later")]
    ProcessingTimeout { job_id: String, attempts: u32 },

    #[error("job {0} is already being tracked")]
    AlreadyTracking(String),

    #[error("upload of job {0} was cancelled")]
    Cancelled(String),
}

impl From<RemoteError> for UploadError {
    fn from(e: RemoteError) -> Self {
        match e {
            RemoteError::Transport(message) => UploadError::Transport(message),
            RemoteError::Rejected { status, body } => UploadError::RemoteRejected { status, body },
            RemoteError::InvalidResponse(message) => UploadError::InvalidResponse(message),
        }
    }
}

impl From<TrackError> for UploadError {
    fn from(e: TrackError) -> Self {
        match e {
            TrackError::PollingTransport { job_id, message } => {
                UploadError::PollingTransport { job_id, message }
            }
            TrackError::RemoteProcessingFailed { job_id } => {
                UploadError::RemoteProcessingFailed { job_id }
            }
            TrackError::ProcessingTimeout { job_id, attempts } => {
                UploadError::ProcessingTimeout { job_id, attempts }
            }
            TrackError::AlreadyTracking(job_id) => UploadError::AlreadyTracking(job_id),
            TrackError::Cancelled(job_id) => UploadError::Cancelled(job_id),
        }
    }
}

/// Successful upload with its extracted data.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct UploadOutcome {
    pub job_id: String,
    pub storage_path: Option<String>,
    pub extracted_data: Option<ExtractedData>,
}

/// Runs the upload flow for receipt files.
pub struct UploadCoordinator {
    remote: Arc<dyn Remote>,
    tracker: JobTracker,
    policy: FileTypePolicy,
}

impl UploadCoordinator {
    pub fn new(remote: Arc<dyn Remote>, tracker: JobTracker, policy: FileTypePolicy) -> Self {
        UploadCoordinator {
            remote,
            tracker,
            policy,
        }
    }

    pub fn policy(&self) -> &FileTypePolicy {
        &self.policy
    }

    /// Checks a file against the policy without touching the network.
    pub fn validate(&self, file: &ReceiptFile) -> Result<(), UploadError> {
        self.check_type(&file.file_name, file.media_type.as_deref())?;
        if file.bytes.is_empty() {
            return Err(UploadError::EmptyFile(file.file_name.clone()));
        }
        Ok(())
    }

    /// Checks the type of the file at `path` from its name alone, so a
    /// disallowed file is rejected before it is read.
    pub fn validate_path(&self, path: &Path) -> Result<(), UploadError> {
        let (file_name, media_type) = ReceiptFile::name_and_type(path);
        self.check_type(&file_name, media_type.as_deref())
    }

    fn check_type(&self, file_name: &str, media_type: Option<&str>) -> Result<(), UploadError> {
        if self.policy.accepts_name(file_name, media_type) {
            return Ok(());
        }
        Err(UploadError::InvalidFileType {
            file_name: file_name.to_string(),
            allowed: self.policy.describe(),
        })
    }

    /// Uploads `file` and waits for its extraction to finish.
    ///
    /// Nothing is queued on failure; receipt uploads are interactive.
    pub async fn submit<F>(
        &self,
        file: &ReceiptFile,
        on_update: F,
    ) -> Result<UploadOutcome, UploadError>
    where
        F: FnMut(&ProgressUpdate) + Send,
    {
        self.validate(file)?;

        info!(file = %file.file_name, size = file.bytes.len(), "uploading receipt");
        let initiated = self.remote.initiate_upload(file).await?;
        debug!(job_id = %initiated.id, status = %initiated.status, "upload accepted");

        let initial_path = initiated.storage_path.clone();
        let result = if initiated.status.is_in_progress() {
            self.tracker.track(&initiated.id, on_update).await?
        } else if initiated.status.is_failed() {
            return Err(UploadError::RemoteProcessingFailed {
                job_id: initiated.id,
            });
        } else {
            JobResult::from_snapshot(initiated)
        };

        Ok(UploadOutcome {
            job_id: result.job_id,
            storage_path: result.storage_path.or(initial_path),
            extracted_data: result.extracted_data,
        })
    }

    /// Stops tracking an in-flight job. Returns false if it was not tracked.
    pub fn cancel(&self, job_id: &str) -> bool {
        self.tracker.cancel(job_id)
    }
}
