//! Upstream sources
//!
//! Raw payload acquisition over a pluggable HTTP-get capability. Nothing in
//! here interprets the payloads beyond deciding, from the content type,
//! whether a body is JSON or opaque bytes.

pub mod fetcher;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use std::time::Duration;

use crate::utils::error::{FetchCause, ParseError};

pub use fetcher::SourceFetcher;

/// A successful GET response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// `Content-Type` header value, empty when absent
    pub content_type: String,
    /// Response body
    pub body: Bytes,
}

impl HttpResponse {
    /// Create a response
    pub fn new(content_type: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            content_type: content_type.into(),
            body: body.into(),
        }
    }
}

/// Single-round-trip GET capability
///
/// Implementations must not retry and must report any non-2xx status as
/// [`FetchCause::Status`].
#[async_trait]
pub trait HttpGet: Send + Sync {
    /// GET `url`
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchCause>;
}

/// Body of an upstream response after content-type dispatch
#[derive(Debug, Clone, PartialEq)]
pub enum RawPayload {
    /// Structured JSON document
    Json(serde_json::Value),
    /// Opaque bytes (images, unknown types)
    Bytes(Bytes),
}

impl RawPayload {
    /// Classify a response body by its content type
    ///
    /// JSON types are parsed; image and octet-stream bodies stay raw; other
    /// types (e.g. `text/plain` from static hosts) are tried as JSON first.
    pub fn from_response(response: HttpResponse) -> Result<Self, FetchCause> {
        let content_type = response.content_type.to_lowercase();

        if content_type.contains("json") {
            return serde_json::from_slice(&response.body)
                .map(Self::Json)
                .map_err(|e| FetchCause::Decode(format!("Invalid JSON body: {e}")));
        }

        if content_type.starts_with("image/") || content_type.contains("octet-stream") {
            return Ok(Self::Bytes(response.body));
        }

        Ok(serde_json::from_slice(&response.body)
            .map(Self::Json)
            .unwrap_or(Self::Bytes(response.body)))
    }

    /// Borrow the JSON document
    pub fn as_json(&self) -> Result<&serde_json::Value, ParseError> {
        match self {
            Self::Json(value) => Ok(value),
            Self::Bytes(_) => Err(ParseError::UnexpectedPayload {
                expected: "JSON document",
            }),
        }
    }
}

/// [`HttpGet`] backed by a reqwest client
pub struct ReqwestHttp {
    client: Client,
}

impl ReqwestHttp {
    /// Create a client with the given timeout and user agent
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, FetchCause> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .gzip(true)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpGet for ReqwestHttp {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchCause> {
        tracing::debug!(url = %url, "Fetching URL");

        let parsed = reqwest::Url::parse(url)
            .map_err(|e| FetchCause::InvalidUrl(format!("{url}: {e}")))?;

        let response = self.client.get(parsed).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchCause::Timeout
            } else {
                FetchCause::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchCause::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .unwrap_or_default();

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                FetchCause::Timeout
            } else {
                FetchCause::Decode(format!("Failed to read response body: {e}"))
            }
        })?;

        Ok(HttpResponse { content_type, body })
    }
}
