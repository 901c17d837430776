//! Diff service client.
//!
//! The remote service accepts `{"original": ..., "modified": ...}` and answers
//! with `{"data": {"link": ...}}`, where the link points at a rendered
//! comparison. The primary entry point is [`DiffClient`]; orchestration code
//! depends on the [`DiffService`] trait so that it can run against fakes.
//!
//! # Example
//!
//! ```ignore
//! use coldiff_api::DiffClient;
//! use coldiff_types::DiffRequest;
//! use coldiff_util::ColdiffConfig;
//!
//! async fn run() -> anyhow::Result<()> {
//!     let client = DiffClient::from_config(&ColdiffConfig::default())?;
//!     let link = client.send_post_request(client.endpoint(), &DiffRequest::new("a", "b")).await?;
//!     println!("{link}");
//!     Ok(())
//! }
//! ```

mod error;

pub use error::DiffError;
pub use reqwest::StatusCode;

use std::time::Instant;

use async_trait::async_trait;
use coldiff_types::{DIFF_LINK_POINTER, DiffRequest};
use coldiff_util::{ColdiffConfig, char_len, log_preview, redact_sensitive};
use reqwest::{Client, header};
use serde_json::Value;
use tracing::{debug, error, warn};

/// Upper bound for response bodies copied into logs and errors.
const BODY_PREVIEW_LIMIT: usize = 500;

/// Anything that can turn a pair of texts into a diff link.
#[async_trait]
pub trait DiffService: Send + Sync {
    /// Submit one comparison and return the result link.
    async fn compare(&self, request: &DiffRequest) -> Result<String, DiffError>;
}

/// Thin wrapper around a configured `reqwest::Client` bound to one endpoint.
///
/// No timeout, retry or backoff is configured: every call is a single attempt
/// with the client's defaults.
#[derive(Debug, Clone)]
pub struct DiffClient {
    endpoint: String,
    http: Client,
}

impl DiffClient {
    /// Build a client for `endpoint` sending `user_agent` with every request.
    pub fn new(endpoint: impl Into<String>, user_agent: &str) -> Result<Self, DiffError> {
        let mut default_headers = header::HeaderMap::new();
        if let Ok(value) = header::HeaderValue::from_str(user_agent) {
            default_headers.insert(header::USER_AGENT, value);
        }
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(default_headers)
            .build()
            .map_err(DiffError::ClientBuild)?;

        Ok(Self {
            endpoint: endpoint.into(),
            http,
        })
    }

    /// Build a client from resolved configuration.
    pub fn from_config(config: &ColdiffConfig) -> Result<Self, DiffError> {
        Self::new(config.endpoint.clone(), &config.user_agent)
    }

    /// The URL [`DiffService::compare`] posts to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST `data` as JSON to `url` and return `data.link` from the response.
    ///
    /// Non-2xx responses log the status and body; transport failures log the
    /// error message. Both are returned to the caller unchanged in kind.
    pub async fn send_post_request(&self, url: &str, data: &DiffRequest) -> Result<String, DiffError> {
        let start = Instant::now();
        debug!(
            %url,
            original_chars = char_len(&data.original),
            modified_chars = char_len(&data.modified),
            "diff request started"
        );

        let response = match self.http.post(url).json(data).send().await {
            Ok(response) => response,
            Err(source) => {
                error!(%url, error = %source, "diff request could not be sent");
                return Err(DiffError::Transport(source));
            }
        };

        let status = response.status();
        let body_text = match response.text().await {
            Ok(text) => text,
            Err(source) => {
                error!(%url, %status, error = %source, "diff response body could not be read");
                return Err(DiffError::Transport(source));
            }
        };
        let preview = log_preview(&redact_sensitive(&body_text), BODY_PREVIEW_LIMIT);

        if !status.is_success() {
            error!(
                %url,
                status = status.as_u16(),
                body = %preview,
                duration_ms = start.elapsed().as_millis(),
                "diff request failed"
            );
            return Err(DiffError::Status { status, body: preview });
        }

        debug!(
            %url,
            status = status.as_u16(),
            body = %preview,
            duration_ms = start.elapsed().as_millis(),
            "diff request succeeded"
        );
        extract_link(&body_text).ok_or_else(|| {
            warn!(%url, body = %preview, "diff response has no data.link");
            DiffError::MalformedResponse { body: preview }
        })
    }
}

#[async_trait]
impl DiffService for DiffClient {
    async fn compare(&self, request: &DiffRequest) -> Result<String, DiffError> {
        self.send_post_request(&self.endpoint, request).await
    }
}

/// Read the string at `data.link` of a JSON response body.
pub fn extract_link(body: &str) -> Option<String> {
    let payload: Value = serde_json::from_str(body).ok()?;
    payload.pointer(DIFF_LINK_POINTER)?.as_str().map(str::to_string)
}
