//! Chat platform channel over HTTP
//!
//! Posts a multipart message to `{api_base}/channels/{id}/messages`:
//!
//! - `payload_json`: `{"content": "<rendered text>"}`
//! - `files[0]`: the companion image
//!
//! Rate limiting (429) and server errors are retried with exponential backoff
//! up to `max_retries`; any other non-success status fails immediately.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

use super::{DeliveryChannel, DeliveryResult};
use crate::config::DeliveryConfig;
use crate::models::DestinationId;
use crate::utils::error::DeliveryError;
use crate::utils::retry::{with_retry_if, RetryConfig};
use crate::utils::truncate_text;

/// HTTP delivery channel
pub struct HttpChannel {
    client: Client,
    api_base: String,
    auth_token: Option<String>,
    headers: BTreeMap<String, String>,
    image_filename: String,
    retry: RetryConfig,
}

impl HttpChannel {
    /// Create a channel from the delivery configuration
    pub fn new(config: &DeliveryConfig) -> DeliveryResult<Self> {
        Url::parse(&config.api_base)
            .map_err(|e| DeliveryError::InvalidConfig(format!("api_base: {e}")))?;

        if config.timeout_secs == 0 {
            return Err(DeliveryError::InvalidConfig(
                "timeout must be greater than 0".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
            headers: config.headers.clone(),
            image_filename: config.image_filename.clone(),
            retry: RetryConfig::new(config.max_retries),
        })
    }

    /// Override the backoff schedule
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Message endpoint for a destination
    pub fn endpoint(&self, destination: DestinationId) -> String {
        format!("{}/channels/{destination}/messages", self.api_base)
    }

    fn build_form(&self, text: &str, image: &[u8]) -> DeliveryResult<Form> {
        let payload = serde_json::to_string(&serde_json::json!({ "content": text }))?;
        let payload = Part::text(payload).mime_str("application/json")?;
        let file = Part::bytes(image.to_vec())
            .file_name(self.image_filename.clone())
            .mime_str("image/png")?;

        Ok(Form::new()
            .part("payload_json", payload)
            .part("files[0]", file))
    }

    async fn send_once(
        &self,
        destination: DestinationId,
        text: &str,
        image: &[u8],
    ) -> DeliveryResult<()> {
        let mut request = self
            .client
            .post(self.endpoint(destination))
            .multipart(self.build_form(text, image)?);

        if let Some(token) = &self.auth_token {
            request = request.header(reqwest::header::AUTHORIZATION, token);
        }

        for (key, value) in &self.headers {
            request = request.header(key, value);
        }

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(());
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown")
                .to_string();
            return Err(DeliveryError::RateLimited(format!(
                "retry after {retry_after}"
            )));
        }

        if status.is_server_error() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            return Err(DeliveryError::Unavailable(format!(
                "HTTP {status}: {}",
                truncate_text(&body, 200)
            )));
        }

        Err(DeliveryError::Rejected(status.as_u16()))
    }
}

fn is_retryable(error: &DeliveryError) -> bool {
    match error {
        DeliveryError::RateLimited(_) | DeliveryError::Unavailable(_) => true,
        DeliveryError::Http(e) => e.is_timeout() || e.is_connect(),
        _ => false,
    }
}

#[async_trait]
impl DeliveryChannel for HttpChannel {
    async fn deliver(
        &self,
        destination: DestinationId,
        text: &str,
        image: &[u8],
    ) -> DeliveryResult<()> {
        with_retry_if(
            &self.retry,
            || self.send_once(destination, text, image),
            is_retryable,
        )
        .await
    }
}
