//! Scripted brain implementation - canned replies keyed on the system prompt.

use std::sync::atomic::{AtomicUsize, Ordering};

use brain_core::{async_trait, Brain, BrainError, Generation, GenerationRequest};
use tokio::sync::Mutex;

/// A brain that answers from a script.
///
/// Rules are checked in insertion order; the first rule whose needle occurs
/// in the system prompt supplies the reply. Without a matching rule the
/// default reply is used, or the user text is echoed back when no default
/// is set. Every request is recorded so tests can inspect what the backend saw.
#[derive(Debug, Default)]
pub struct ScriptedBrain {
    rules: Vec<(String, String)>,
    default_reply: Option<String>,
    calls: AtomicUsize,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedBrain {
    /// Create a brain that echoes the user text.
    pub fn echo() -> Self {
        Self::default()
    }

    /// Create a brain that always answers with `reply`.
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            default_reply: Some(reply.into()),
            ..Self::default()
        }
    }

    /// Add a rule: when the system prompt contains `needle`, answer `reply`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mock_brain::ScriptedBrain;
    ///
    /// let brain = ScriptedBrain::replying("general advice")
    ///     .with_rule("classify", r#"{"primary_intent": "medication"}"#);
    /// ```
    pub fn with_rule(mut self, needle: impl Into<String>, reply: impl Into<String>) -> Self {
        self.rules.push((needle.into(), reply.into()));
        self
    }

    /// Number of `generate` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// All requests received so far.
    pub async fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().await.clone()
    }

    fn reply_for(&self, request: &GenerationRequest) -> String {
        self.rules
            .iter()
            .find(|(needle, _)| request.system_prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone())
            .or_else(|| self.default_reply.clone())
            .unwrap_or_else(|| request.user_text.clone())
    }
}

#[async_trait]
impl Brain for ScriptedBrain {
    async fn generate(&self, request: GenerationRequest) -> Result<Generation, BrainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = self.reply_for(&request);
        self.requests.lock().await.push(request);
        Ok(Generation::new(text).with_model("scripted"))
    }

    fn name(&self) -> &str {
        "ScriptedBrain"
    }
}
