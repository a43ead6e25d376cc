//! Time-bounded backend calls shared by all handlers.

use std::sync::Arc;
use std::time::Duration;

use brain_core::{Brain, BrainError, Generation, GenerationRequest, ModelParams};
use tracing::debug;

use crate::config::HandlerConfig;

/// A backend plus the timeout and parameters every handler call uses.
#[derive(Clone)]
pub struct Generator {
    brain: Arc<dyn Brain>,
    timeout: Duration,
    params: ModelParams,
}

impl Generator {
    pub fn new(brain: Arc<dyn Brain>, config: &HandlerConfig) -> Self {
        Self {
            brain,
            timeout: config.backend_timeout,
            params: config.model_params(),
        }
    }

    pub fn backend_name(&self) -> &str {
        self.brain.name()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run one generation. Elapsed timeouts become [`BrainError::Timeout`].
    pub async fn generate(
        &self,
        system_prompt: &str,
        user_text: String,
    ) -> Result<Generation, BrainError> {
        let request =
            GenerationRequest::new(system_prompt, user_text).with_params(self.params.clone());

        match tokio::time::timeout(self.timeout, self.brain.generate(request)).await {
            Ok(Ok(generation)) if generation.text.trim().is_empty() => Err(
                BrainError::ProcessingFailed("backend returned empty text".to_string()),
            ),
            Ok(result) => result,
            Err(_) => {
                debug!(
                    backend = self.brain.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "BACKEND_TIMEOUT"
                );
                Err(BrainError::Timeout)
            }
        }
    }
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("backend", &self.brain.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}
