//! Delayed brain implementation - wraps another brain with artificial delay.

use std::time::Duration;

use brain_core::{async_trait, Brain, BrainError, Generation, GenerationRequest};
use tokio::time::sleep;

/// A brain that wraps another brain and adds artificial delay.
///
/// Useful for testing timeout handling and simulating model latency.
pub struct DelayedBrain<B: Brain> {
    inner: B,
    delay: Duration,
}

impl<B: Brain> DelayedBrain<B> {
    /// Create a new DelayedBrain wrapping the given brain with the specified delay.
    pub fn new(inner: B, delay: Duration) -> Self {
        Self { inner, delay }
    }

    /// Create a brain with a delay in milliseconds.
    pub fn with_millis(inner: B, millis: u64) -> Self {
        Self::new(inner, Duration::from_millis(millis))
    }

    /// Create a brain with a delay in seconds.
    pub fn with_secs(inner: B, secs: u64) -> Self {
        Self::new(inner, Duration::from_secs(secs))
    }

    /// The wrapped brain.
    pub fn inner(&self) -> &B {
        &self.inner
    }
}

#[async_trait]
impl<B: Brain> Brain for DelayedBrain<B> {
    async fn generate(&self, request: GenerationRequest) -> Result<Generation, BrainError> {
        sleep(self.delay).await;
        self.inner.generate(request).await
    }

    fn name(&self) -> &str {
        "DelayedBrain"
    }

    async fn is_ready(&self) -> bool {
        self.inner.is_ready().await
    }

    async fn shutdown(&self) -> Result<(), BrainError> {
        self.inner.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScriptedBrain;
    use std::time::Instant;

    #[tokio::test]
    async fn test_delayed_brain() {
        let brain = DelayedBrain::with_millis(ScriptedBrain::echo(), 100);

        let start = Instant::now();
        let out = brain
            .generate(GenerationRequest::new("s", "test"))
            .await
            .unwrap();
        let elapsed = start.elapsed();

        assert_eq!(out.text, "test");
        assert!(elapsed >= Duration::from_millis(100));
        assert_eq!(brain.inner().calls(), 1);
    }

    #[tokio::test]
    async fn test_delayed_brain_times_out_under_timeout() {
        let brain = DelayedBrain::with_secs(ScriptedBrain::echo(), 5);
        let result = tokio::time::timeout(
            Duration::from_millis(20),
            brain.generate(GenerationRequest::new("s", "slow")),
        )
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_concurrent_calls_do_not_serialize() {
        let brain = DelayedBrain::with_millis(ScriptedBrain::echo(), 100);

        let start = Instant::now();
        let calls = (0..5).map(|i| brain.generate(GenerationRequest::new("s", format!("{i}"))));
        let results = futures::future::join_all(calls).await;
        let elapsed = start.elapsed();

        assert!(results.iter().all(|r| r.is_ok()));
        assert!(elapsed < Duration::from_millis(450));
    }

    #[tokio::test]
    async fn test_brain_name() {
        let brain = DelayedBrain::with_millis(ScriptedBrain::echo(), 0);
        assert_eq!(brain.name(), "DelayedBrain");
    }
}
