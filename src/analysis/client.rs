use super::response::{AnalysisResult, PredictResponse};
use crate::audio::AudioAsset;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::multipart;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Fixed inference endpoint of the local emotion-analysis service
pub const DEFAULT_ENDPOINT_URL: &str = "http://127.0.0.1:5000/Predict";

/// Multipart field name the endpoint expects the audio under
const SPEECH_FIELD: &str = "Speechfile";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from one analysis round-trip
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("server error (status {0})")]
    Server(u16),

    #[error("malformed response body: {0}")]
    Malformed(String),
}

/// Submits one audio asset for emotion analysis.
///
/// Exactly one round-trip per call; failures propagate to the caller, no
/// retries. Trait object so the controller and its tests can swap in
/// scripted analyzers.
#[async_trait]
pub trait EmotionAnalyzer: Send + Sync {
    async fn submit(&self, asset: &AudioAsset) -> Result<AnalysisResult, AnalysisError>;
}

/// HTTP client for the inference endpoint
pub struct AnalysisClient {
    http: reqwest::Client,
    endpoint_url: String,
}

impl AnalysisClient {
    pub fn new(endpoint_url: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            endpoint_url: endpoint_url.into(),
        })
    }

    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }
}

#[async_trait]
impl EmotionAnalyzer for AnalysisClient {
    async fn submit(&self, asset: &AudioAsset) -> Result<AnalysisResult, AnalysisError> {
        let part = multipart::Part::bytes(asset.bytes.clone())
            .file_name(asset.file_name.clone())
            .mime_str(&asset.mime)?;
        let form = multipart::Form::new().part(SPEECH_FIELD, part);

        debug!(
            "submitting {} byte asset ({}) to {}",
            asset.bytes.len(),
            asset.mime,
            self.endpoint_url
        );

        let response = self
            .http
            .post(&self.endpoint_url)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::Server(status.as_u16()));
        }

        let body = response.text().await?;
        let parsed: PredictResponse =
            serde_json::from_str(&body).map_err(|e| AnalysisError::Malformed(e.to_string()))?;

        info!("analysis response received");
        Ok(parsed.into())
    }
}
