//! Companion location resolution
//!
//! The companion pointer endpoint names where the companion is today. It comes
//! in a few shapes:
//!
//! - a bare id: `"cholla_springs"` or `7`
//! - an object with `id`: `{"id": "cholla_springs"}`
//! - a nested location: `{"location": {"id": "cholla_springs"}}`
//! - any of the above wrapped in `{"data": ...}`
//!
//! A direct `image` URL in the object wins over the id. Otherwise the id is
//! looked up in the configured location → image URL table.

use bytes::Bytes;
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;

use crate::error::Result;
use crate::source::RawPayload;
use crate::utils::error::{FetchError, ParseError};

/// Where the companion image for a pointer can be downloaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompanionTarget {
    /// URL given directly by the pointer
    DirectUrl(String),
    /// Location id resolved through the configured table
    Location { id: String, url: String },
}

impl CompanionTarget {
    /// URL to download
    pub fn url(&self) -> &str {
        match self {
            Self::DirectUrl(url) => url,
            Self::Location { url, .. } => url,
        }
    }
}

/// Resolves companion pointers to image bytes
#[derive(Debug, Clone, Default)]
pub struct CompanionResolver {
    location_images: BTreeMap<String, String>,
}

impl CompanionResolver {
    /// Create a resolver over a location id → image URL table
    pub fn new(location_images: BTreeMap<String, String>) -> Self {
        Self { location_images }
    }

    /// Decide which URL holds the image for a pointer
    ///
    /// # Errors
    ///
    /// - `ParseError::UnexpectedPayload` if the pointer is not JSON
    /// - `ParseError::MissingLocation` if it carries neither id nor image
    /// - `ParseError::UnknownLocation` if the id has no configured image
    pub fn target(&self, pointer: &RawPayload) -> std::result::Result<CompanionTarget, ParseError> {
        let value = unwrap_data(pointer.as_json()?);

        if let Some(url) = value.get("image").and_then(Value::as_str) {
            return Ok(CompanionTarget::DirectUrl(url.to_string()));
        }

        let id = location_id(value).ok_or(ParseError::MissingLocation)?;
        let url = self
            .location_images
            .get(&id)
            .cloned()
            .ok_or_else(|| ParseError::UnknownLocation(id.clone()))?;

        Ok(CompanionTarget::Location { id, url })
    }

    /// Resolve a pointer to image bytes using `fetch_image` for the download
    ///
    /// # Errors
    ///
    /// Returns the `ParseError` from [`Self::target`] or the `FetchError`
    /// from `fetch_image`
    pub async fn resolve_companion_image<F, Fut>(
        &self,
        pointer: &RawPayload,
        fetch_image: F,
    ) -> Result<Bytes>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = std::result::Result<Bytes, FetchError>>,
    {
        let target = self.target(pointer)?;
        if let CompanionTarget::Location { id, .. } = &target {
            tracing::debug!(location = %id, "Resolved companion location");
        }
        Ok(fetch_image(target.url().to_string()).await?)
    }
}

fn unwrap_data(value: &Value) -> &Value {
    match value.get("data") {
        Some(inner) if !inner.is_null() => inner,
        _ => value,
    }
}

fn location_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map
            .get("id")
            .and_then(location_id)
            .or_else(|| map.get("location").and_then(location_id)),
        _ => None,
    }
}
