// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Remote API abstraction.
//!
//! Provides a trait-based client layer that enables:
//! - Real HTTP requests to the ReportPilot API for production
//! - Scripted mock remotes for unit testing
//!
//! Three endpoints are consumed:
//! - `POST {upload_path}` (multipart `file`) starts an extraction job
//! - `GET {jobs_path}/{id}` reports job status
//! - `POST {resource}` (JSON body) creates a record; any 2xx is success

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use rp_core::JobSnapshot;

use super::connectivity::Reachability;
use super::upload::ReceiptFile;
use crate::config::RemoteConfig;

/// Error type for remote operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The request never produced an HTTP response.
    #[error("could not reach server: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status.
    #[error("server rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The server answered 2xx but the body was not the expected shape.
    #[error("invalid response from server: {0}")]
    InvalidResponse(String),
}

impl RemoteError {
    /// Returns true for connectivity-class failures.
    pub fn is_transport(&self) -> bool {
        matches!(self, RemoteError::Transport(_))
    }
}

/// Result type for remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Boxed future returned by [`Remote`] methods.
pub type RemoteFuture<'a, T> = Pin<Box<dyn Future<Output = RemoteResult<T>> + Send + 'a>>;

/// Remote API used by the upload coordinator, job tracker and scheduler.
///
/// This trait abstracts over the actual HTTP client, allowing for easy
/// testing with mock implementations.
pub trait Remote: Send + Sync {
    /// Uploads a receipt file and starts its extraction job.
    fn initiate_upload<'a>(&'a self, file: &'a ReceiptFile) -> RemoteFuture<'a, JobSnapshot>;

    /// Fetches the current state of a processing job.
    fn job_status<'a>(&'a self, job_id: &'a str) -> RemoteFuture<'a, JobSnapshot>;

    /// Creates a record by posting `payload` to `resource`.
    fn create_record<'a>(
        &'a self,
        resource: &'a str,
        payload: &'a serde_json::Value,
    ) -> RemoteFuture<'a, ()>;
}

/// Supplies the opaque bearer credential of the current session.
pub trait CredentialSource: Send + Sync {
    /// Returns the bearer token, if a session is available.
    fn bearer_token(&self) -> Option<String>;
}

/// Credential fixed at construction time.
#[derive(Debug, Clone, Default)]
pub struct StaticCredential(Option<String>);

impl StaticCredential {
    pub fn new(token: Option<String>) -> Self {
        StaticCredential(token.filter(|t| !t.trim().is_empty()))
    }

    pub fn anonymous() -> Self {
        StaticCredential(None)
    }
}

impl CredentialSource for StaticCredential {
    fn bearer_token(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Credential read from `RP_TOKEN` on every request, so a token exported
/// after startup is picked up by the next replay.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredential;

impl CredentialSource for EnvCredential {
    fn bearer_token(&self) -> Option<String> {
        crate::env::token()
    }
}

/// HTTP implementation of [`Remote`] using reqwest.
pub struct HttpRemote {
    client: Client,
    base_url: String,
    upload_path: String,
    jobs_path: String,
    credentials: Arc<dyn CredentialSource>,
}

impl HttpRemote {
    pub fn new(config: &RemoteConfig, credentials: Arc<dyn CredentialSource>) -> RemoteResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RemoteError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(HttpRemote {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            upload_path: normalize_path(&config.upload_path),
            jobs_path: normalize_path(&config.jobs_path),
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, normalize_path(path))
    }

    /// Status URL of a job. The id is escaped as a single path segment.
    pub fn job_url(&self, job_id: &str) -> RemoteResult<Url> {
        let mut url = Url::parse(&self.build_url(&self.jobs_path))
            .map_err(|e| RemoteError::Transport(format!("invalid job status url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| RemoteError::Transport("job status url cannot take a path".to_string()))?
            .pop_if_empty()
            .push(job_id);
        Ok(url)
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match self.credentials.bearer_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Sends a request and returns the response if its status is 2xx.
    async fn send(&self, request: RequestBuilder) -> RemoteResult<reqwest::Response> {
        let response = self
            .apply_auth(request)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Rejected { status: status.as_u16(), body });
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> RemoteResult<T> {
        let response = self.send(request).await?;
        let bytes = response.bytes().await.map_err(|e| RemoteError::Transport(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| RemoteError::InvalidResponse(e.to_string()))
    }
}

impl Remote for HttpRemote {
    fn initiate_upload<'a>(&'a self, file: &'a ReceiptFile) -> RemoteFuture<'a, JobSnapshot> {
        Box::pin(async move {
            let form = Form::new().part("file", file_part(file));
            let request = self.client.post(self.build_url(&self.upload_path)).multipart(form);
            self.send_json(request).await
        })
    }

    fn job_status<'a>(&'a self, job_id: &'a str) -> RemoteFuture<'a, JobSnapshot> {
        Box::pin(async move {
            let url = self.job_url(job_id)?;
            self.send_json(self.client.get(url)).await
        })
    }

    fn create_record<'a>(
        &'a self,
        resource: &'a str,
        payload: &'a serde_json::Value,
    ) -> RemoteFuture<'a, ()> {
        Box::pin(async move {
            let request = self.client.post(self.build_url(resource)).json(payload);
            self.send(request).await?;
            Ok(())
        })
    }
}

impl Reachability for HttpRemote {
    fn probe(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(async move {
            // Any HTTP answer, even an error status, proves the server is reachable.
            self.client.head(&self.base_url).send().await.is_ok()
        })
    }
}

/// Builds the multipart part for a receipt, with its media type when valid.
fn file_part(file: &ReceiptFile) -> Part {
    let part = || Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());

    match file.media_type.as_deref() {
        Some(mime) => part().mime_str(mime).unwrap_or_else(|_| part()),
        None => part(),
    }
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}
