//! Upload of the document to a GitHub repository through the contents API.
//!
//! One `PUT /repos/{owner}/{repo}/contents/{path}{filename}` per upload. No
//! blob SHA is looked up or sent, so the call creates files only; GitHub
//! rejects it when the path already exists on the target branch.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const USER_AGENT: &str = concat!("textpad/", env!("CARGO_PKG_VERSION"));
const ACCEPT: &str = "application/vnd.github.v3+json";
const FALLBACK_ERROR: &str = "Error uploading the file";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Please fill in the GitHub owner, repository and token")]
    MissingSettings,
    #[error("{message}")]
    Remote { status: u16, message: String },
    #[error("request to GitHub failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl UploadError {
    /// Validation failures never reached the network.
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::MissingSettings)
    }
}

/// Everything needed for one upload.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub owner: String,
    pub repo: String,
    /// Directory prefix inside the repository, concatenated verbatim in
    /// front of the filename (include the trailing `/`).
    pub path: String,
    pub filename: String,
    pub content: String,
    pub token: String,
}

impl UploadRequest {
    /// # Errors
    /// Returns [`UploadError::MissingSettings`] if owner, repo or token is empty.
    pub fn validate(&self) -> Result<(), UploadError> {
        if self.owner.is_empty() || self.repo.is_empty() || self.token.is_empty() {
            return Err(UploadError::MissingSettings);
        }
        Ok(())
    }

    pub fn commit_message(&self) -> String {
        format!("Upload file {}", self.filename)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContentsPayload {
    pub message: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Base64 of the UTF-8 bytes, as the contents API expects.
pub fn encode_content(text: &str) -> String {
    BASE64.encode(text.as_bytes())
}

#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    api_base: String,
}

impl GitHubClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_base: impl Into<String>) -> Result<Self, UploadError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn contents_url(&self, request: &UploadRequest) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}{}",
            self.api_base, request.owner, request.repo, request.path, request.filename
        )
    }

    /// Create the file described by `request`.
    ///
    /// # Errors
    /// Validation errors are returned before any request is made; a non-2xx
    /// response carries GitHub's `message` when it sent one.
    pub fn upload(&self, request: &UploadRequest) -> Result<(), UploadError> {
        request.validate()?;

        let url = self.contents_url(request);
        let payload = ContentsPayload {
            message: request.commit_message(),
            content: encode_content(&request.content),
        };
        debug!(%url, bytes = request.content.len(), "uploading to github");

        let response = self
            .http
            .put(&url)
            .header("Authorization", format!("token {}", request.token))
            .header("Accept", ACCEPT)
            .json(&payload)
            .send()?;

        let status = response.status();
        if status.is_success() {
            info!(%url, status = status.as_u16(), "upload accepted");
            return Ok(());
        }

        let message = response
            .json::<ErrorBody>()
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| FALLBACK_ERROR.to_string());
        warn!(%url, status = status.as_u16(), %message, "upload rejected");
        Err(UploadError::Remote {
            status: status.as_u16(),
            message,
        })
    }
}
