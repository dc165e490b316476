//! Fetcher for the daily challenge endpoints
//!
//! One GET per call; retry policy belongs to the publish cycle. Every failure
//! is tagged with the resource and URL it happened on so the cycle can log it
//! without further context.

use bytes::Bytes;
use std::sync::Arc;

use super::{HttpGet, RawPayload};
use crate::config::SourceConfig;
use crate::utils::error::{FetchError, Resource};

/// Retrieves raw upstream payloads
#[derive(Clone)]
pub struct SourceFetcher {
    http: Arc<dyn HttpGet>,
    challenge_url: String,
    companion_url: String,
}

impl SourceFetcher {
    /// Create a fetcher for explicit endpoints
    pub fn new(
        http: Arc<dyn HttpGet>,
        challenge_url: impl Into<String>,
        companion_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            challenge_url: challenge_url.into(),
            companion_url: companion_url.into(),
        }
    }

    /// Create a fetcher for the configured endpoints
    pub fn from_config(http: Arc<dyn HttpGet>, config: &SourceConfig) -> Self {
        Self::new(http, &config.challenge_url, &config.companion_url)
    }

    /// Fetch the day's challenge set
    ///
    /// # Errors
    ///
    /// Returns `FetchError` tagged [`Resource::ChallengeSet`] on any transport,
    /// status or decoding failure
    pub async fn fetch_challenge_set(&self) -> Result<RawPayload, FetchError> {
        self.fetch_payload(Resource::ChallengeSet, &self.challenge_url)
            .await
    }

    /// Fetch the companion location pointer
    ///
    /// # Errors
    ///
    /// Returns `FetchError` tagged [`Resource::CompanionPointer`]
    pub async fn fetch_companion_pointer(&self) -> Result<RawPayload, FetchError> {
        self.fetch_payload(Resource::CompanionPointer, &self.companion_url)
            .await
    }

    /// Fetch raw image bytes, whatever the content type
    ///
    /// # Errors
    ///
    /// Returns `FetchError` tagged [`Resource::Image`]
    pub async fn fetch_image(&self, url: &str) -> Result<Bytes, FetchError> {
        let response = self
            .http
            .get(url)
            .await
            .map_err(|cause| FetchError::new(Resource::Image, url, cause))?;

        tracing::debug!(url = %url, bytes = response.body.len(), "Fetched companion image");
        Ok(response.body)
    }

    async fn fetch_payload(&self, resource: Resource, url: &str) -> Result<RawPayload, FetchError> {
        let response = self
            .http
            .get(url)
            .await
            .map_err(|cause| FetchError::new(resource, url, cause))?;

        RawPayload::from_response(response).map_err(|cause| FetchError::new(resource, url, cause))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::HttpResponse;
    use crate::utils::error::FetchCause;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Recorder {
        requested: Mutex<Vec<String>>,
        fail_status: Option<u16>,
    }

    #[async_trait]
    impl HttpGet for Recorder {
        async fn get(&self, url: &str) -> Result<HttpResponse, FetchCause> {
            self.requested.lock().unwrap().push(url.to_string());
            match self.fail_status {
                Some(status) => Err(FetchCause::Status(status)),
                None => Ok(HttpResponse::new("application/json", r#"{"ok": true}"#)),
            }
        }
    }

    fn fetcher(fail_status: Option<u16>) -> (Arc<Recorder>, SourceFetcher) {
        let http = Arc::new(Recorder {
            requested: Mutex::new(Vec::new()),
            fail_status,
        });
        let fetcher = SourceFetcher::new(
            http.clone(),
            "https://api.example.com/challenges.json",
            "https://api.example.com/nazar.json",
        );
        (http, fetcher)
    }

    #[tokio::test]
    async fn test_each_call_is_one_request() {
        let (http, fetcher) = fetcher(None);

        fetcher.fetch_challenge_set().await.unwrap();
        fetcher.fetch_companion_pointer().await.unwrap();
        fetcher
            .fetch_image("https://img.example.com/a.png")
            .await
            .unwrap();

        assert_eq!(
            *http.requested.lock().unwrap(),
            vec![
                "https://api.example.com/challenges.json".to_string(),
                "https://api.example.com/nazar.json".to_string(),
                "https://img.example.com/a.png".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_is_tagged_with_resource() {
        let (http, fetcher) = fetcher(Some(503));

        let err = fetcher.fetch_companion_pointer().await.unwrap_err();
        assert_eq!(err.resource, Resource::CompanionPointer);
        assert_eq!(err.url, "https://api.example.com/nazar.json");
        assert!(matches!(err.cause, FetchCause::Status(503)));
        assert_eq!(http.requested.lock().unwrap().len(), 1);
    }
}
