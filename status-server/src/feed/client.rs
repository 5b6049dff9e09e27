//! HTTP client for the live status feed.

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};

use super::error::FeedError;
use crate::domain::{StationCode, StationInfo};

/// Default request timeout in seconds.
///
/// This bounds how long degraded mode takes to kick in when the feed is
/// unreachable but not actively refusing connections.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// How much of an undecodable response body to keep in the error.
const BODY_SNIPPET_CHARS: usize = 500;

/// Configuration for the live feed client.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL of the status service, without a trailing slash
    pub base_url: String,
    /// Optional API key, sent as an `x-apikey` header
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl RemoteConfig {
    /// Create a configuration for the given feed URL with default settings.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set the API key to send with every request.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Client for the live platform status endpoint.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
    base_url: String,
}

impl RemoteClient {
    /// Create a new client from the given configuration.
    pub fn new(config: RemoteConfig) -> Result<Self, FeedError> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &config.api_key {
            let value = HeaderValue::from_str(api_key).map_err(|_| FeedError::Config {
                message: "API key is not a valid header value".to_string(),
            })?;
            headers.insert("x-apikey", value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
        })
    }

    /// Fetch the platform status snapshot for a station.
    ///
    /// The payload is decoded and validated before being handed out, so a
    /// feed that answers 200 with nonsense still surfaces as an error
    /// rather than as a broken board.
    pub async fn platform_status(&self, code: &StationCode) -> Result<StationInfo, FeedError> {
        let url = format!("{}/api/stations/platform-status", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[("code", code.as_str())])
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(FeedError::Api {
                status: status.as_u16(),
                message: format!("no status available for station {code}"),
            });
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(FeedError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        decode_snapshot(&body)
    }
}

/// Decode and validate a snapshot document.
///
/// Split from the request path so payload handling is testable without a
/// live server.
fn decode_snapshot(body: &str) -> Result<StationInfo, FeedError> {
    let info: StationInfo = serde_json::from_str(body).map_err(|e| FeedError::Json {
        message: e.to_string(),
        body: Some(body.chars().take(BODY_SNIPPET_CHARS).collect()),
    })?;

    info.validate()?;

    Ok(info)
}
