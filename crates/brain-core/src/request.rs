//! Request and response types for a single generation call.

use serde::{Deserialize, Serialize};

/// Per-call model overrides.
///
/// `None` fields fall back to the backend's configured defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    /// Model name override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ModelParams {
    /// Deterministic, short output. Used for classification calls.
    pub fn deterministic(max_tokens: u32) -> Self {
        Self {
            model: None,
            temperature: Some(0.0),
            max_tokens: Some(max_tokens),
        }
    }
}

/// One call to a text-generation backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Instructions for the model.
    pub system_prompt: String,
    /// The (already redacted) user text.
    pub user_text: String,
    /// Model overrides for this call.
    #[serde(default)]
    pub params: ModelParams,
}

impl GenerationRequest {
    /// Create a request with default model parameters.
    pub fn new(system_prompt: impl Into<String>, user_text: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_text: user_text.into(),
            params: ModelParams::default(),
        }
    }

    /// Set the model parameters for this request.
    pub fn with_params(mut self, params: ModelParams) -> Self {
        self.params = params;
        self
    }
}

/// Text produced by a backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    /// The generated text.
    pub text: String,
    /// The model that produced it, if reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Generation {
    /// Create a generation without model information.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: None,
        }
    }

    /// Attach the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = GenerationRequest::new("system", "user")
            .with_params(ModelParams::deterministic(128));

        assert_eq!(request.system_prompt, "system");
        assert_eq!(request.user_text, "user");
        assert_eq!(request.params.temperature, Some(0.0));
        assert_eq!(request.params.max_tokens, Some(128));
        assert!(request.params.model.is_none());
    }

    #[test]
    fn test_params_skip_empty_fields() {
        let json = serde_json::to_string(&ModelParams::default()).unwrap();
        assert_eq!(json, "{}");
    }
}
