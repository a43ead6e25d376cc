//! Failing brain implementation - every call errors.

use std::sync::atomic::{AtomicUsize, Ordering};

use brain_core::{async_trait, Brain, BrainError, Generation, GenerationRequest};

/// A brain whose backend is always down.
///
/// Useful for exercising fallback and degraded-response paths.
#[derive(Debug, Default)]
pub struct FailingBrain {
    reason: String,
    calls: AtomicUsize,
}

impl FailingBrain {
    /// Create a brain that fails with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `generate` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Brain for FailingBrain {
    async fn generate(&self, _request: GenerationRequest) -> Result<Generation, BrainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(BrainError::Unavailable(self.reason.clone()))
    }

    fn name(&self) -> &str {
        "FailingBrain"
    }

    async fn is_ready(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_always_fails() {
        let brain = FailingBrain::new("connection refused");
        let err = brain
            .generate(GenerationRequest::new("s", "u"))
            .await
            .unwrap_err();

        assert!(matches!(err, BrainError::Unavailable(ref r) if r == "connection refused"));
        assert_eq!(brain.calls(), 1);
        assert!(!brain.is_ready().await);
    }
}
