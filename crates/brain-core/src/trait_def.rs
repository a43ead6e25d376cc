//! The Brain trait definition.

use async_trait::async_trait;

use crate::error::BrainError;
use crate::request::{Generation, GenerationRequest};

/// A text-generation backend.
///
/// Implementations range from canned test doubles to remote model APIs.
/// Callers must treat every implementation as untrusted and possibly slow:
/// apply their own timeouts and have a fallback for every error.
///
/// This trait is object-safe and can be used with `Arc<dyn Brain>`.
#[async_trait]
pub trait Brain: Send + Sync {
    /// Generate text for the given system prompt and user text.
    async fn generate(&self, request: GenerationRequest) -> Result<Generation, BrainError>;

    /// Get a human-readable name for this backend.
    fn name(&self) -> &str;

    /// Check if the backend is ready to accept requests.
    ///
    /// Default implementation always returns true.
    async fn is_ready(&self) -> bool {
        true
    }

    /// Gracefully shut down the backend.
    ///
    /// Default implementation does nothing.
    async fn shutdown(&self) -> Result<(), BrainError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct UpperBrain;

    #[async_trait]
    impl Brain for UpperBrain {
        async fn generate(&self, request: GenerationRequest) -> Result<Generation, BrainError> {
            Ok(Generation::new(request.user_text.to_uppercase()))
        }

        fn name(&self) -> &str {
            "UpperBrain"
        }
    }

    #[tokio::test]
    async fn test_trait_object_dispatch() {
        let brain: Arc<dyn Brain> = Arc::new(UpperBrain);
        let out = brain
            .generate(GenerationRequest::new("", "hello"))
            .await
            .unwrap();

        assert_eq!(out.text, "HELLO");
        assert!(brain.is_ready().await);
        assert!(brain.shutdown().await.is_ok());
        assert_eq!(brain.name(), "UpperBrain");
    }
}
