use crate::{config::Config, model::StoredImageReference};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::{header::AUTHORIZATION, StatusCode, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Object name under which an upload is stored.
pub fn stored_filename(timestamp_millis: i64, original_filename: &str) -> String {
    format!("{timestamp_millis}-{original_filename}")
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Content store is not configured")]
    NotConfigured,
    #[error("Content store request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Content store responded with {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("Content store response had no download URL")]
    MissingDownloadUrl,
    #[error("Invalid content store URL: {0}")]
    InvalidUrl(String),
}

/// Durable storage for uploaded images. Every call creates one new object.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn put(&self, filename: &str, bytes: &[u8]) -> Result<StoredImageReference, StoreError>;
}

/// Stores images as files in a GitHub repository through the contents API.
pub struct GitHubStore {
    http: reqwest::Client,
    api_url: String,
    token: String,
    repo: String,
    branch: String,
    path_prefix: String,
}

#[derive(Serialize)]
struct CreateContentRequest<'a> {
    message: String,
    content: String,
    branch: &'a str,
}

#[derive(Deserialize)]
struct CreateContentResponse {
    content: Option<ContentRecord>,
}

#[derive(Deserialize)]
struct ContentRecord {
    download_url: Option<String>,
}

impl GitHubStore {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            api_url: config.github_api_url.clone(),
            token: config.github_token.clone(),
            repo: config.github_repo.clone(),
            branch: config.github_branch.clone(),
            path_prefix: config.github_path_prefix.clone(),
        }
    }

    fn content_url(&self, filename: &str) -> Result<Url, StoreError> {
        let mut url =
            Url::parse(&self.api_url).map_err(|_| StoreError::InvalidUrl(self.api_url.clone()))?;

        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidUrl(self.api_url.clone()))?
            .pop_if_empty()
            .push("repos")
            .extend(self.repo.split('/'))
            .push("contents")
            .extend(self.path_prefix.split('/').filter(|s| !s.is_empty()))
            .push(filename);

        Ok(url)
    }
}

#[async_trait]
impl ContentStore for GitHubStore {
    async fn put(&self, filename: &str, bytes: &[u8]) -> Result<StoredImageReference, StoreError> {
        if self.token.is_empty() || self.repo.is_empty() {
            return Err(StoreError::NotConfigured);
        }

        let url = self.content_url(filename)?;
        debug!("Uploading {} bytes to {url}", bytes.len());

        let body = CreateContentRequest {
            message: format!("Upload plant image: {filename}"),
            content: STANDARD.encode(bytes),
            branch: &self.branch,
        };

        let response = self
            .http
            .put(url)
            .header(AUTHORIZATION, format!("token {}", self.token))
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status { status, body });
        }

        let record: CreateContentResponse = response.json().await?;
        let download_url = record
            .content
            .and_then(|content| content.download_url)
            .filter(|url| !url.is_empty())
            .ok_or(StoreError::MissingDownloadUrl)?;

        Ok(StoredImageReference {
            filename: filename.to_owned(),
            download_url,
        })
    }
}
