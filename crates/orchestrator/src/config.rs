//! Orchestrator configuration.

use std::env;

use care_agents::HandlerConfig;

/// Pipeline settings.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    /// Ask the backend to refine the keyword classification.
    pub classify_with_backend: bool,
    pub handler: HandlerConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            classify_with_backend: true,
            handler: HandlerConfig::default(),
        }
    }
}

impl OrchestratorConfig {
    /// Create a config from environment variables.
    ///
    /// - `CARE_CLASSIFY_WITH_BACKEND` - backend-assisted classification (default: true)
    /// - plus everything [`HandlerConfig::from_env`] reads
    pub fn from_env() -> Self {
        let classify_with_backend = env::var("CARE_CLASSIFY_WITH_BACKEND")
            .ok()
            .and_then(|s| parse_flag(&s))
            .unwrap_or(true);

        Self {
            classify_with_backend,
            handler: HandlerConfig::from_env(),
        }
    }

    pub fn with_classify_with_backend(mut self, enabled: bool) -> Self {
        self.classify_with_backend = enabled;
        self
    }

    pub fn with_handler(mut self, handler: HandlerConfig) -> Self {
        self.handler = handler;
        self
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
