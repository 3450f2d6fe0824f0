//! Client of the remote article-extraction service.
//!
//! The service takes a page URL and answers with the readable article
//! (title, byline, markdown content). Every failure maps onto one
//! [`ExtractionError`] kind so the shell can show a single message for it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::types::article::ExtractedArticle;
use crate::types::errors::ExtractionError;
use crate::types::settings::ExtractionSettings;

const USER_AGENT: &str = concat!("readlater/", env!("CARGO_PKG_VERSION"));

/// Anything that can turn a URL into an extracted article.
#[async_trait]
pub trait Extractor {
    async fn extract(&self, url: &str) -> Result<ExtractedArticle, ExtractionError>;
}

/// Checks that `input` is an absolute http(s) URL with a host.
///
/// Runs before any network call; surrounding whitespace is ignored.
pub fn validate_url(input: &str) -> Result<Url, ExtractionError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ExtractionError::InvalidUrl("empty URL".to_string()));
    }
    let url = Url::parse(trimmed).map_err(|e| ExtractionError::InvalidUrl(format!("{}: {}", trimmed, e)))?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ExtractionError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                other
            )))
        }
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(ExtractionError::InvalidUrl(format!("{}: missing host", trimmed)));
    }
    Ok(url)
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// Maps a non-success status of the extraction endpoint to an error kind.
pub fn error_for_status(status: StatusCode, detail: String) -> ExtractionError {
    match status {
        StatusCode::BAD_REQUEST => ExtractionError::InvalidUrl(detail),
        StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY => ExtractionError::NoContent,
        StatusCode::BAD_GATEWAY | StatusCode::GATEWAY_TIMEOUT | StatusCode::SERVICE_UNAVAILABLE => {
            ExtractionError::FetchFailed(detail)
        }
        other => ExtractionError::Unexpected(format!("status {}: {}", other.as_u16(), detail)),
    }
}

/// reqwest-based [`Extractor`] talking to an HTTP endpoint.
pub struct HttpExtractor {
    client: Client,
    endpoint: String,
}

impl HttpExtractor {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ExtractionError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ExtractionError::Unexpected(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn from_settings(settings: &ExtractionSettings) -> Result<Self, ExtractionError> {
        Self::new(&settings.endpoint, Duration::from_secs(settings.timeout_secs.max(1)))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Extractor for HttpExtractor {
    async fn extract(&self, url: &str) -> Result<ExtractedArticle, ExtractionError> {
        let target = validate_url(url)?;

        debug!(url = %target, endpoint = %self.endpoint, "requesting extraction");
        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "url": target.as_str() }))
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "extraction request failed");
                if e.is_timeout() || e.is_connect() || e.is_request() {
                    ExtractionError::FetchFailed(e.to_string())
                } else {
                    ExtractionError::Unexpected(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ExtractionError::FetchFailed(e.to_string()))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
            warn!(status = status.as_u16(), detail = %detail, "extraction service returned an error");
            return Err(error_for_status(status, detail));
        }

        let article: ExtractedArticle = serde_json::from_str(&body)
            .map_err(|e| ExtractionError::Unexpected(format!("Malformed extraction response: {}", e)))?;

        if article.content.trim().is_empty() {
            return Err(ExtractionError::NoContent);
        }

        debug!(title = %article.title, "extraction succeeded");
        Ok(article)
    }
}
