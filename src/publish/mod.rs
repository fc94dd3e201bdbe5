//! Publishing finished videos to the external hosting platform.

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com";

const UPLOAD_PATH: &str = "/upload/youtube/v3/videos";

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Platform rejected the request ({status}): {body}")]
    Rejected { status: StatusCode, body: String },
    #[error("Platform did not return an upload location")]
    MissingUploadLocation,
    #[error("Malformed platform response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    #[default]
    Unlisted,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Unlisted => "unlisted",
            Visibility::Private => "private",
        }
    }
}

pub struct PublishRequest {
    pub bytes: Vec<u8>,
    pub title: String,
    pub description: String,
    pub visibility: Visibility,
    /// Caller-supplied OAuth access token; used for this request only.
    pub access_token: String,
}

#[async_trait]
pub trait Publisher: Send + Sync {
    /// Uploads the video and returns the platform's id for it.
    async fn publish(&self, request: PublishRequest) -> Result<String, PublishError>;
}

#[derive(Deserialize)]
struct UploadedVideo {
    id: String,
}

/// Resumable upload against the video-hosting data API: a metadata POST opens
/// an upload session, the bytes go to the returned `Location` in one PUT.
pub struct HttpPublisher {
    client: reqwest::Client,
    api_base: String,
}

impl HttpPublisher {
    pub fn new(api_base: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    fn session_url(&self) -> String {
        format!(
            "{}{}?uploadType=resumable&part=snippet,status",
            self.api_base, UPLOAD_PATH
        )
    }

    async fn open_session(&self, request: &PublishRequest) -> Result<String, PublishError> {
        let metadata = json!({
            "snippet": {
                "title": request.title,
                "description": request.description,
            },
            "status": {
                "privacyStatus": request.visibility.as_str(),
            },
        });

        let response = self
            .client
            .post(self.session_url())
            .bearer_auth(&request.access_token)
            .header("X-Upload-Content-Type", "video/*")
            .header("X-Upload-Content-Length", request.bytes.len().to_string())
            .json(&metadata)
            .send()
            .await?;

        let response = ensure_success(response).await?;
        response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or(PublishError::MissingUploadLocation)
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, PublishError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(PublishError::Rejected { status, body })
}

#[async_trait]
impl Publisher for HttpPublisher {
    async fn publish(&self, request: PublishRequest) -> Result<String, PublishError> {
        let upload_url = self.open_session(&request).await?;
        log::debug!("Opened upload session for '{}'", request.title);

        let response = self
            .client
            .put(upload_url)
            .bearer_auth(&request.access_token)
            .header(CONTENT_TYPE, "video/*")
            .body(request.bytes)
            .send()
            .await?;

        let response = ensure_success(response).await?;
        let uploaded: UploadedVideo = response
            .json()
            .await
            .map_err(|e| PublishError::MalformedResponse(e.to_string()))?;

        log::info!("Published '{}' as external video {}", request.title, uploaded.id);
        Ok(uploaded.id)
    }
}
