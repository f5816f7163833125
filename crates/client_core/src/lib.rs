use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use shared::{
    domain::{InputMode, TaskId},
    protocol::{ResumeRequest, SubmitResponse, TaskStatusResponse},
};
use tracing::{debug, info};
use url::Url;

pub mod error;
pub use error::ClientError;

pub type Result<T> = std::result::Result<T, ClientError>;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// An image picked by the user for upload mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub filename: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionInput {
    Upload(SelectedFile),
    Manual { words: String },
    /// The server resolves the linked Untappd account from its own session.
    UntappdHistory,
}

impl SubmissionInput {
    pub fn mode(&self) -> InputMode {
        match self {
            SubmissionInput::Upload(_) => InputMode::Upload,
            SubmissionInput::Manual { .. } => InputMode::Manual,
            SubmissionInput::UntappdHistory => InputMode::Untappd,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub style: String,
    pub model_provider: String,
    pub theme: String,
    pub input: SubmissionInput,
}

impl Submission {
    pub fn mode(&self) -> InputMode {
        self.input.mode()
    }

    fn into_form(self) -> Result<Form> {
        let form = Form::new()
            .text("style", self.style)
            .text("model_provider", self.model_provider)
            .text("theme", self.theme);

        let form = match self.input {
            SubmissionInput::Upload(file) => {
                let mut part = Part::bytes(file.bytes).file_name(file.filename);
                if let Some(mime_type) = file.mime_type {
                    part = part
                        .mime_str(&mime_type)
                        .map_err(|err| ClientError::InvalidUpload(err.to_string()))?;
                }
                form.part("file", part)
            }
            SubmissionInput::Manual { words } => form.text("words", words),
            SubmissionInput::UntappdHistory => form,
        };
        Ok(form)
    }
}

/// The HTTP contract the wizard depends on.
#[async_trait]
pub trait ArtBackend: Send + Sync {
    async fn submit(&self, submission: Submission) -> Result<TaskId>;
    async fn fetch_status(&self, task_id: &TaskId) -> Result<TaskStatusResponse>;
    async fn resume(&self, task_id: &TaskId, words: &str) -> Result<()>;
}

pub struct ArtClient {
    http: Client,
    base_url: Url,
}

impl ArtClient {
    pub fn new(server_url: &str) -> Result<Self> {
        Self::with_timeout(server_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(server_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = parse_base_url(server_url)?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ClientError::Transport)?;
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl {
                url: self.base_url.to_string(),
                reason: "url cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

fn parse_base_url(server_url: &str) -> Result<Url> {
    let trimmed = server_url.trim();
    let url = Url::parse(trimmed).map_err(|err| ClientError::InvalidUrl {
        url: trimmed.to_string(),
        reason: err.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ClientError::InvalidUrl {
            url: trimmed.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    Ok(url)
}

/// Turns a non-2xx response into [`ClientError::Request`], keeping the body text.
async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Request {
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or_default().to_string(),
        body,
    })
}

#[async_trait]
impl ArtBackend for ArtClient {
    async fn submit(&self, submission: Submission) -> Result<TaskId> {
        let mode = submission.mode();
        let url = self.endpoint(&[mode.endpoint()])?;
        debug!(%url, %mode, "submitting generation request");

        let response = self
            .http
            .post(url)
            .multipart(submission.into_form()?)
            .send()
            .await
            .map_err(ClientError::Transport)?;
        let body: SubmitResponse = ensure_success(response).await?.json().await?;

        info!(task_id = %body.task_id, %mode, "generation task accepted");
        Ok(body.task_id)
    }

    async fn fetch_status(&self, task_id: &TaskId) -> Result<TaskStatusResponse> {
        let url = self.endpoint(&["status", task_id.as_str()])?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(ClientError::Transport)?;
        Ok(ensure_success(response).await?.json().await?)
    }

    async fn resume(&self, task_id: &TaskId, words: &str) -> Result<()> {
        let url = self.endpoint(&["resume_task"])?;
        let response = self
            .http
            .post(url)
            .json(&ResumeRequest {
                task_id: task_id.clone(),
                words: words.to_string(),
            })
            .send()
            .await
            .map_err(ClientError::Transport)?;
        ensure_success(response).await?;
        info!(%task_id, "resume request accepted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
