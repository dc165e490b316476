//! Unified error handling for the announcer
//!
//! Domain errors live next to the code that raises them; this module wraps
//! them into one [`Error`] enum for crossing module boundaries, and
//! classifies them so the publish cycle can pick a reaction per category.
//!
//! # Architecture
//!
//! - [`DailiesErrorTrait`] - common interface implemented by the error types
//! - [`ErrorCategory`] - classification of errors for handling strategies
//! - [`Error`] - unified error enum wrapping the domain errors

use thiserror::Error;

pub use crate::scheduler::error::SchedulerError;
pub use crate::utils::error::{DeliveryError, FetchCause, FetchError, ParseError, PersistenceError};

/// Common trait for the crate's error types
pub trait DailiesErrorTrait: std::error::Error {
    /// Check if this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network-related errors (HTTP, timeout, status)
    Network,
    /// Upstream payload did not match expectations
    Parsing,
    /// Upstream schema changed in a way the parser does not know
    SchemaDrift,
    /// Sending to a destination failed
    Delivery,
    /// Storage and I/O errors
    Storage,
    /// Configuration and validation errors
    Config,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Parsing => "parsing",
            Self::SchemaDrift => "schema_drift",
            Self::Delivery => "delivery",
            Self::Storage => "storage",
            Self::Config => "config",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for the crate
#[derive(Error, Debug)]
pub enum Error {
    /// Fetch-specific errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Parse-specific errors
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Delivery errors
    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// Persistence errors
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Scheduler and timing errors
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl DailiesErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch(_) => true,
            // Upstream may fix its payload; the cycle retries on the next tick
            Self::Parse(_) => true,
            Self::Delivery(_) => true,
            Self::Persistence(e) => !matches!(e, PersistenceError::InvalidEntry(_)),
            Self::Scheduler(_) => false,
            Self::Other { .. } => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch(_) => ErrorCategory::Network,
            Self::Parse(e) if e.is_schema_drift() => ErrorCategory::SchemaDrift,
            Self::Parse(_) => ErrorCategory::Parsing,
            Self::Delivery(_) => ErrorCategory::Delivery,
            Self::Persistence(_) => ErrorCategory::Storage,
            Self::Scheduler(_) => ErrorCategory::Config,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
