//! Error types for the scheduler module

use thiserror::Error;

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler-specific errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// Publish time could not be parsed
    #[error("Invalid publish time '{value}'. Expected HH:MM:SS or HH:MM")]
    InvalidPublishTime { value: String },

    /// Interval configured as zero
    #[error("Interval '{field}' must be greater than zero")]
    ZeroInterval { field: String },
}

impl SchedulerError {
    /// Create an invalid publish time error
    pub fn invalid_publish_time(value: impl Into<String>) -> Self {
        Self::InvalidPublishTime {
            value: value.into(),
        }
    }

    /// Create a zero interval error
    pub fn zero_interval(field: impl Into<String>) -> Self {
        Self::ZeroInterval {
            field: field.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SchedulerError::invalid_publish_time("25:00");
        assert!(err.to_string().contains("25:00"));

        let err = SchedulerError::zero_interval("poll_interval_secs");
        assert!(err.to_string().contains("poll_interval_secs"));
    }
}
