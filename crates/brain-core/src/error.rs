//! Error types for backend operations.

use thiserror::Error;

/// Errors that can occur while asking a backend for text.
#[derive(Debug, Error)]
pub enum BrainError {
    /// The backend is temporarily unavailable.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The request could not be processed.
    #[error("processing failed: {0}")]
    ProcessingFailed(String),

    /// The backend has been shut down.
    #[error("backend shut down")]
    ShutDown,

    /// The call did not finish in time.
    #[error("generation timed out")]
    Timeout,

    /// The backend is misconfigured.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A transport-level failure.
    #[error("network error: {0}")]
    Network(String),
}

impl BrainError {
    /// Whether retrying later could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BrainError::Unavailable(_) | BrainError::Timeout | BrainError::Network(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(BrainError::Timeout.is_transient());
        assert!(BrainError::Network("reset".into()).is_transient());
        assert!(!BrainError::Configuration("no key".into()).is_transient());
        assert!(!BrainError::ShutDown.is_transient());
    }

    #[test]
    fn test_error_display() {
        let err = BrainError::Unavailable("maintenance".into());
        assert_eq!(err.to_string(), "backend unavailable: maintenance");
    }
}
