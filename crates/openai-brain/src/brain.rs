//! OpenAiBrain implementation using a chat-completions API.

use brain_core::{async_trait, Brain, BrainError, Generation, GenerationRequest, ModelParams};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::api_types::{ApiError, ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use crate::config::OpenAiBrainConfig;

/// A backend that calls an OpenAI-compatible chat-completions endpoint.
///
/// Per-request [`ModelParams`] override the configured defaults.
pub struct OpenAiBrain {
    client: Client,
    config: OpenAiBrainConfig,
}

impl OpenAiBrain {
    /// Create a new OpenAiBrain with the given configuration.
    pub fn new(config: OpenAiBrainConfig) -> Result<Self, BrainError> {
        if config.api_key.is_empty() {
            return Err(BrainError::Configuration("API key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| BrainError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            "OpenAiBrain initialized with model: {}, url: {}",
            config.model, config.api_url
        );

        Ok(Self { client, config })
    }

    /// Create an OpenAiBrain from environment variables.
    ///
    /// See [`OpenAiBrainConfig::from_env`] for required environment variables.
    pub fn from_env() -> Result<Self, BrainError> {
        Self::new(OpenAiBrainConfig::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &OpenAiBrainConfig {
        &self.config
    }

    fn build_request(&self, request: &GenerationRequest) -> ChatCompletionRequest {
        let ModelParams {
            model,
            temperature,
            max_tokens,
        } = &request.params;

        ChatCompletionRequest {
            model: model.clone().unwrap_or_else(|| self.config.model.clone()),
            messages: vec![
                ChatMessage::system(request.system_prompt.clone()),
                ChatMessage::user(request.user_text.clone()),
            ],
            max_tokens: max_tokens.or(self.config.max_tokens),
            temperature: temperature.or(self.config.temperature),
        }
    }

    async fn chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, BrainError> {
        let url = format!("{}/v1/chat/completions", self.config.api_url);

        debug!(model = %request.model, "Sending chat completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BrainError::Timeout
                } else {
                    BrainError::Network(format!("Failed to send request: {}", e))
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            if let Ok(api_error) = serde_json::from_str::<ApiError>(&error_text) {
                return Err(BrainError::ProcessingFailed(format!(
                    "API error ({}): {}",
                    status.as_u16(),
                    api_error.error.message
                )));
            }

            if status.is_server_error() {
                return Err(BrainError::Unavailable(format!(
                    "API error ({})",
                    status.as_u16()
                )));
            }

            return Err(BrainError::ProcessingFailed(format!(
                "API error ({}): {}",
                status.as_u16(),
                error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| BrainError::ProcessingFailed(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl Brain for OpenAiBrain {
    async fn generate(&self, request: GenerationRequest) -> Result<Generation, BrainError> {
        let completion = self.chat_completion(self.build_request(&request)).await?;

        if let Some(usage) = &completion.usage {
            debug!(
                "Token usage - prompt: {}, completion: {}, total: {}",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        let choice = completion.choices.first();
        if let Some(reason) = choice.and_then(|c| c.finish_reason.as_deref()) {
            if reason != "stop" {
                warn!(finish_reason = %reason, "Completion did not finish normally");
            }
        }

        let text = choice
            .and_then(|c| c.message.content.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| BrainError::ProcessingFailed("No content in response".to_string()))?;

        let generation = Generation::new(text);
        Ok(match completion.model {
            Some(model) => generation.with_model(model),
            None => generation,
        })
    }

    fn name(&self) -> &str {
        "OpenAiBrain"
    }

    async fn is_ready(&self) -> bool {
        !self.config.api_key.is_empty()
    }
}
