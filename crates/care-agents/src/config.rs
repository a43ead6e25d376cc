//! Configuration for handler backend calls.

use std::env;
use std::time::Duration;

use brain_core::ModelParams;

/// Default backend timeout in seconds.
pub const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 30;

/// Default sampling temperature for handler responses.
pub const DEFAULT_HANDLER_TEMPERATURE: f32 = 0.1;

/// Default token limit for handler responses.
pub const DEFAULT_HANDLER_MAX_TOKENS: u32 = 1024;

/// Settings shared by every specialist handler.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerConfig {
    /// Upper bound on one backend call. Exceeding it triggers the handler's fallback.
    pub backend_timeout: Duration,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            backend_timeout: Duration::from_secs(DEFAULT_BACKEND_TIMEOUT_SECS),
            temperature: DEFAULT_HANDLER_TEMPERATURE,
            max_tokens: DEFAULT_HANDLER_MAX_TOKENS,
        }
    }
}

impl HandlerConfig {
    /// Create a config from environment variables.
    ///
    /// - `CARE_BACKEND_TIMEOUT_SECS` - backend timeout (default: 30)
    /// - `CARE_HANDLER_TEMPERATURE` - sampling temperature (default: 0.1)
    /// - `CARE_HANDLER_MAX_TOKENS` - response token limit (default: 1024)
    pub fn from_env() -> Self {
        let backend_timeout = env::var("CARE_BACKEND_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_BACKEND_TIMEOUT_SECS));

        let temperature = env::var("CARE_HANDLER_TEMPERATURE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_HANDLER_TEMPERATURE);

        let max_tokens = env::var("CARE_HANDLER_MAX_TOKENS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_HANDLER_MAX_TOKENS);

        Self {
            backend_timeout,
            temperature,
            max_tokens,
        }
    }

    /// Set the backend timeout.
    pub fn with_backend_timeout(mut self, timeout: Duration) -> Self {
        self.backend_timeout = timeout;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Model parameters for handler generation calls.
    pub fn model_params(&self) -> ModelParams {
        ModelParams {
            model: None,
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
        }
    }
}
