//! Error types for the announcer
//!
//! One enum per failure domain of the publish cycle. The cycle decides how to
//! react based on which of these it receives: fetch and parse failures are
//! retried on the next poll tick, delivery failures stay pending for the next
//! cycle, and persistence failures block the cycle until the save succeeds.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Upstream resource a fetch was aimed at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// The daily challenge set
    ChallengeSet,
    /// The companion location pointer
    CompanionPointer,
    /// The companion location image
    Image,
}

impl Resource {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChallengeSet => "challenge set",
            Self::CompanionPointer => "companion pointer",
            Self::Image => "companion image",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Underlying reason a single HTTP round trip failed
#[derive(Error, Debug)]
pub enum FetchCause {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Non-success status code
    #[error("Server responded with status {0}")]
    Status(u16),

    /// Body could not be read or decoded
    #[error("Decoding error: {0}")]
    Decode(String),

    /// URL could not be built
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Errors that can occur while fetching an upstream resource
#[derive(Error, Debug)]
#[error("Failed to fetch {resource} from {url}: {cause}")]
pub struct FetchError {
    /// Which resource was requested
    pub resource: Resource,
    /// Requested URL
    pub url: String,
    /// What went wrong
    #[source]
    pub cause: FetchCause,
}

impl FetchError {
    /// Create a fetch error for a resource
    pub fn new(resource: Resource, url: impl Into<String>, cause: FetchCause) -> Self {
        Self {
            resource,
            url: url.into(),
            cause,
        }
    }

    /// Whether the failure is worth retrying on the next poll tick
    pub fn is_transient(&self) -> bool {
        match &self.cause {
            FetchCause::Http(_) | FetchCause::Timeout => true,
            FetchCause::Status(status) => matches!(status, 408 | 429 | 500..=599),
            FetchCause::Decode(_) | FetchCause::InvalidUrl(_) => false,
        }
    }
}

/// Errors that can occur while normalizing upstream payloads
#[derive(Error, Debug)]
pub enum ParseError {
    /// Payload was not in the expected representation
    #[error("Unexpected payload: expected {expected}")]
    UnexpectedPayload { expected: &'static str },

    /// Required field missing from the payload
    #[error("Missing field: {0}")]
    MissingField(String),

    /// Upstream category role with no known mapping
    #[error("Unknown category role: {0}")]
    UnknownRole(String),

    /// Epoch timestamp outside the representable range
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(i64),

    /// Challenge set contained no categories
    #[error("Challenge set is empty")]
    EmptyChallengeSet,

    /// Companion pointer carried neither an id nor an image URL
    #[error("Companion pointer has no location")]
    MissingLocation,

    /// Location id with no configured image URL
    #[error("No image configured for location: {0}")]
    UnknownLocation(String),

    /// Malformed JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ParseError {
    /// Whether this signals an upstream schema change rather than a bad payload
    pub fn is_schema_drift(&self) -> bool {
        matches!(self, Self::UnknownRole(_) | Self::UnknownLocation(_))
    }
}

/// Errors that can occur while delivering to a single destination
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Destination rejected the message
    #[error("Destination rejected message with status {0}")]
    Rejected(u16),

    /// Rate limit exceeded after retries
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Channel temporarily unavailable
    #[error("Channel temporarily unavailable: {0}")]
    Unavailable(String),

    /// Invalid channel configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors that can occur while reading or writing persisted state
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Filesystem failure
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Record could not be serialized
    #[error("Failed to encode record: {0}")]
    Encode(#[source] serde_json::Error),

    /// Record on disk could not be decoded
    #[error("Corrupt record in {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    /// Rejected write to the destination registry
    #[error("Invalid registry entry: {0}")]
    InvalidEntry(String),
}

impl PersistenceError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
