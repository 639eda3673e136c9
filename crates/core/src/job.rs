// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Remote processing job snapshots.
//!
//! A [`JobSnapshot`] is a read-only projection of the remote extraction job,
//! as returned by both the upload endpoint and the job status endpoint. The
//! two endpoints name some fields differently (`file_path` vs `storage_path`,
//! `extracted_data` vs `parsed_data`); both spellings are accepted.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Status reported by the remote service for a processing job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Pending,
    Processing,
    /// Terminal success. Also reported as `PROCESSED`.
    Completed,
    Failed,
    /// Any status string the client does not know.
    Other(String),
}

impl JobStatus {
    /// Parses a status string. Matching is case-insensitive; unknown values
    /// are preserved in [`JobStatus::Other`].
    pub fn parse(s: &str) -> JobStatus {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => JobStatus::Pending,
            "PROCESSING" => JobStatus::Processing,
            "COMPLETED" | "PROCESSED" => JobStatus::Completed,
            "FAILED" => JobStatus::Failed,
            _ => JobStatus::Other(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Processing => "PROCESSING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
            JobStatus::Other(s) => s,
        }
    }

    /// Returns true while the remote is still working on the job.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Processing)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, JobStatus::Completed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, JobStatus::Failed)
    }
}

impl From<String> for JobStatus {
    fn from(s: String) -> Self {
        JobStatus::parse(&s)
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured fields extracted from a receipt.
///
/// Known fields are typed; anything else the service returns is kept in
/// `extra` so callers can forward it untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Job-shaped payload returned by the upload and status endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawJobSnapshot")]
pub struct JobSnapshot {
    pub id: String,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_data: Option<ExtractedData>,
}

impl JobSnapshot {
    pub fn new(id: impl Into<String>, status: JobStatus) -> Self {
        JobSnapshot { id: id.into(), status, storage_path: None, extracted_data: None }
    }

    pub fn with_storage_path(mut self, path: impl Into<String>) -> Self {
        self.storage_path = Some(path.into());
        self
    }

    pub fn with_extracted_data(mut self, data: ExtractedData) -> Self {
        self.extracted_data = Some(data);
        self
    }
}

/// Wire form accepting every field spelling the service uses.
#[derive(Deserialize)]
struct RawJobSnapshot {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    status: JobStatus,
    #[serde(default)]
    storage_path: Option<String>,
    #[serde(default)]
    file_path: Option<String>,
    #[serde(default)]
    extracted_data: Option<ExtractedData>,
    #[serde(default)]
    parsed_data: Option<ExtractedData>,
}

impl From<RawJobSnapshot> for JobSnapshot {
    fn from(raw: RawJobSnapshot) -> Self {
        JobSnapshot {
            id: raw.id,
            status: raw.status,
            storage_path: raw.storage_path.or(raw.file_path),
            extracted_data: raw.extracted_data.or(raw.parsed_data),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
