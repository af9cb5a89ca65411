//! Thin client for the third-party video-hosting upload API. The service
//! pulls a source URL server-side and answers with a file code that maps to
//! embeddable player and download pages.

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::UploaderConfig;

const PLAYER_BASE: &str = "https://dsvplay.com";

#[derive(Debug, Error)]
pub enum StreamHostError {
    #[error("Upload API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Upload API rejected the request: {0}")]
    Rejected(String),
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    status: i32,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    result: Option<UploadResult>,
}

#[derive(Debug, Deserialize)]
struct UploadResult {
    #[serde(default)]
    filecode: Option<String>,
}

/// Links produced by one successful remote upload.
#[derive(Debug, Clone)]
pub struct HostedVideo {
    pub embed_url: String,
    pub download_url: String,
}

#[derive(Clone)]
pub struct StreamHostClient {
    client: Client,
    api_url: String,
    api_key: String,
}

impl StreamHostClient {
    /// Remote uploads are slow on the upstream side, so this client carries
    /// its own timeout instead of the shared default.
    pub fn new(config: &UploaderConfig, api_key: String) -> Result<Self, StreamHostError> {
        let client = Client::builder()
            .user_agent(concat!("Aozora/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(
                config.request_timeout_seconds,
            ))
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Ask the host to ingest `video_url`, returning the resulting mirror
    /// links. An upstream error message is surfaced verbatim to the caller.
    pub async fn upload_by_url(&self, video_url: &str) -> Result<HostedVideo, StreamHostError> {
        let request_url = format!(
            "{}/upload/url?key={}&url={}",
            self.api_url,
            self.api_key,
            urlencoding::encode(video_url)
        );

        debug!("Requesting remote upload for {}", video_url);
        let response: UploadResponse = self
            .client
            .get(&request_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.status != 200 {
            return Err(StreamHostError::Rejected(
                response
                    .msg
                    .unwrap_or_else(|| "upload was not accepted".to_string()),
            ));
        }

        let file_code = response
            .result
            .and_then(|r| r.filecode)
            .ok_or_else(|| {
                StreamHostError::Rejected("response carried no file code".to_string())
            })?;

        Ok(HostedVideo {
            embed_url: format!("{PLAYER_BASE}/e/{file_code}"),
            download_url: format!("{PLAYER_BASE}/d/{file_code}"),
        })
    }
}
