//! Query classification and handler routing.

use std::env;
use std::path::Path;

use brain_core::fingerprint;
use care_agents::{Generator, HandlerKind};
use care_core::{classify, Classification, CulturalContext, Intent, QueryContext};
use serde::Deserialize;
use tracing::{debug, info, trace, warn};

use crate::error::OrchestratorError;

/// Default path for the supervisor prompt file.
pub const DEFAULT_SUPERVISOR_PROMPT_FILE: &str = "SUPERVISOR_PROMPT.md";

/// Urgency at or above which every query goes to the emergency handler.
pub const EMERGENCY_ROUTING_THRESHOLD: f32 = 0.8;

/// Urgency at or above which a query is reported as moderate.
pub const MODERATE_THRESHOLD: f32 = 0.5;

/// Default supervisor system prompt (fallback if file not found).
pub const DEFAULT_SUPERVISOR_SYSTEM_PROMPT: &str = r#"You are a healthcare query supervisor. Classify the patient's message. Identifiers have already been removed.

Output a single JSON object with these fields:
- "primary_intent": one of "emergency", "medication", "culturally_localized", "clinical", "general"
- "urgency": number from 0.0 (routine) to 1.0 (life-threatening)
- "cultural_context": "traditional", "modern", "mixed" or null
- "confidence": number from 0.0 to 1.0
- "reasoning": one short sentence

Guidelines:
- "emergency": possible life threat right now (chest pain, cannot breathe, stroke signs, heavy bleeding, overdose, suicidal thoughts).
- "medication": questions about drugs, doses, timing, side effects or interactions.
- "culturally_localized": Vietnamese traditional medicine (thuốc nam, đông y, herbs, cạo gió, giác hơi) or culturally specific care.
- "clinical": symptoms, conditions, tests or diagnoses that are not emergencies.
- "general": anything else about health.
- When unsure between two intents, pick the more urgent one.

The input format is:
[CONTEXT: known conditions and medications, if any]
[MESSAGE: the patient's message]

Examples:

[MESSAGE: when should I take my metformin]
→ {"primary_intent": "medication", "urgency": 0.2, "cultural_context": null, "confidence": 0.9, "reasoning": "dosing time question"}

[MESSAGE: đau ngực dữ dội, khó thở]
→ {"primary_intent": "emergency", "urgency": 0.95, "cultural_context": null, "confidence": 0.95, "reasoning": "severe chest pain with breathlessness"}

[MESSAGE: bà tôi uống thuốc nam trị ho có được không]
→ {"primary_intent": "culturally_localized", "urgency": 0.2, "cultural_context": "traditional", "confidence": 0.85, "reasoning": "traditional remedy question"}

Respond with JSON only. No explanation."#;

/// Load the supervisor system prompt.
///
/// Priority:
/// 1. `SUPERVISOR_SYSTEM_PROMPT` env var (if set)
/// 2. Contents of prompt file (`SUPERVISOR_PROMPT_FILE` or default `SUPERVISOR_PROMPT.md`)
/// 3. Embedded default prompt
pub fn load_supervisor_prompt() -> String {
    if let Ok(prompt) = env::var("SUPERVISOR_SYSTEM_PROMPT") {
        info!("Using supervisor prompt from SUPERVISOR_SYSTEM_PROMPT env var");
        return prompt;
    }

    let prompt_file = env::var("SUPERVISOR_PROMPT_FILE")
        .unwrap_or_else(|_| DEFAULT_SUPERVISOR_PROMPT_FILE.to_string());

    if let Some(prompt) = load_prompt_file(&prompt_file) {
        info!("Loaded supervisor prompt from {}", prompt_file);
        return prompt;
    }

    info!("Using embedded default supervisor prompt");
    DEFAULT_SUPERVISOR_SYSTEM_PROMPT.to_string()
}

/// Returns `Some(content)` if the file exists and is not blank.
fn load_prompt_file(path: impl AsRef<Path>) -> Option<String> {
    let content = std::fs::read_to_string(path.as_ref()).ok()?;
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// What the backend returns.
#[derive(Debug, Clone, Deserialize)]
struct BackendClassification {
    #[serde(alias = "intent")]
    primary_intent: String,
    urgency: f32,
    #[serde(default)]
    cultural_context: Option<String>,
    #[serde(default)]
    confidence: Option<f32>,
    #[serde(default)]
    reasoning: Option<String>,
}

/// Classifies queries and picks a handler.
///
/// Keyword classification always runs. When a backend is configured its
/// answer is merged in and can only raise intent priority and urgency.
pub struct Supervisor {
    generator: Option<Generator>,
    prompt: String,
    prompt_hash: String,
}

impl Supervisor {
    /// Create a supervisor. `None` disables backend-assisted classification.
    pub fn new(generator: Option<Generator>) -> Self {
        Self::with_prompt(generator, load_supervisor_prompt())
    }

    pub fn with_prompt(generator: Option<Generator>, prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        let prompt_hash = fingerprint(&prompt);
        if generator.is_some() {
            info!("Supervisor prompt fingerprint: {}", prompt_hash);
        }
        Self {
            generator,
            prompt,
            prompt_hash,
        }
    }

    /// Keyword-only supervisor.
    pub fn rule_based() -> Self {
        Self::with_prompt(None, DEFAULT_SUPERVISOR_SYSTEM_PROMPT)
    }

    pub fn prompt_hash(&self) -> &str {
        &self.prompt_hash
    }

    pub fn uses_backend(&self) -> bool {
        self.generator.is_some()
    }

    /// Classify redacted text. Never fails.
    pub async fn classify(&self, text: &str, context: &QueryContext) -> Classification {
        let deterministic = classify(text, context);
        let Some(generator) = &self.generator else {
            return deterministic;
        };

        let input = Self::format_supervisor_input(text, context);
        trace!(formatted_input = %input, "SUPERVISOR_INPUT");

        let parsed = match generator.generate(&self.prompt, input).await {
            Ok(generation) => {
                trace!(raw_response = %generation.text, "SUPERVISOR_RAW_RESPONSE");
                Self::parse_classification(&generation.text)
            }
            Err(e) => Err(OrchestratorError::from(e)),
        };

        match parsed {
            Ok(backend) => Self::merge(deterministic, backend),
            Err(e) => {
                warn!(error = %e, "SUPERVISOR_BACKEND_ERROR");
                Self::fallback(deterministic)
            }
        }
    }

    /// Handler for a classification.
    ///
    /// Urgency at or above [`EMERGENCY_ROUTING_THRESHOLD`] always goes to the
    /// emergency handler. General queries go to the clinical handler.
    pub fn route(&self, classification: &Classification) -> HandlerKind {
        if classification.urgency >= EMERGENCY_ROUTING_THRESHOLD {
            return HandlerKind::Emergency;
        }
        match classification.primary_intent {
            Intent::Emergency => HandlerKind::Emergency,
            Intent::Medication => HandlerKind::Medication,
            Intent::CulturallyLocalized => HandlerKind::CulturallyLocalized,
            Intent::Clinical | Intent::General => HandlerKind::Clinical,
        }
    }

    /// Short label for logs and audit.
    pub fn routing_summary(classification: &Classification) -> &'static str {
        if classification.urgency >= EMERGENCY_ROUTING_THRESHOLD {
            "high priority"
        } else if classification.urgency >= MODERATE_THRESHOLD {
            "moderate"
        } else {
            "routine"
        }
    }

    pub fn format_supervisor_input(text: &str, context: &QueryContext) -> String {
        let mut known = Vec::new();
        if !context.conditions.is_empty() {
            known.push(format!("conditions: {}", context.conditions.join(", ")));
        }
        if !context.current_medications.is_empty() {
            known.push(format!("medications: {}", context.current_medications.join(", ")));
        }

        let mut parts = Vec::new();
        if !known.is_empty() {
            parts.push(format!("[CONTEXT: {}]", known.join(" | ")));
        }
        parts.push(format!("[MESSAGE: {}]", text));
        parts.join("\n")
    }

    /// Combine keyword and backend results: higher-priority intent, maximum urgency.
    fn merge(mut deterministic: Classification, backend: BackendClassification) -> Classification {
        let backend_intent = match backend.primary_intent.parse::<Intent>() {
            Ok(intent) => intent,
            Err(e) => {
                debug!(error = %e, "SUPERVISOR_UNKNOWN_INTENT");
                Intent::General
            }
        };
        let backend_urgency = if backend.urgency.is_finite() {
            backend.urgency.clamp(0.0, 1.0)
        } else {
            0.0
        };

        let intent = deterministic.primary_intent.max_priority(backend_intent);
        let urgency = deterministic.urgency.max(backend_urgency);

        if intent != deterministic.primary_intent {
            deterministic
                .reasoning
                .push(format!("backend raised intent to {intent}"));
        }
        if urgency > deterministic.urgency {
            deterministic
                .reasoning
                .push(format!("backend raised urgency to {urgency:.2}"));
        }
        if let Some(reason) = backend.reasoning.filter(|r| !r.trim().is_empty()) {
            deterministic.reasoning.push(format!("backend: {}", reason.trim()));
        }

        deterministic.cultural_context = deterministic.cultural_context.or_else(|| {
            backend
                .cultural_context
                .as_deref()
                .and_then(CulturalContext::from_preference)
        });
        if let Some(confidence) = backend.confidence.filter(|c| c.is_finite()) {
            deterministic.confidence = deterministic.confidence.max(confidence.clamp(0.0, 1.0));
        }

        debug!(intent = %intent, urgency, "SUPERVISOR_MERGED");
        deterministic.primary_intent = intent;
        deterministic.urgency = urgency;
        deterministic
    }

    /// General / 0.3, with keyword emergencies and scorer urgency kept on top.
    fn fallback(deterministic: Classification) -> Classification {
        let mut classification = Classification::fallback();
        if deterministic.primary_intent == Intent::Emergency {
            classification.primary_intent = Intent::Emergency;
            classification
                .reasoning
                .push("emergency keywords still apply".to_string());
        }
        classification.urgency = classification.urgency.max(deterministic.urgency);
        classification.language = deterministic.language;
        classification.cultural_context = deterministic.cultural_context;
        classification.entities = deterministic.entities;
        classification.signals = deterministic.signals;
        classification
    }

    fn parse_classification(response: &str) -> Result<BackendClassification, OrchestratorError> {
        let json_str = Self::extract_json(response);
        serde_json::from_str::<BackendClassification>(json_str).map_err(|e| {
            OrchestratorError::InvalidClassification(format!("parse error: {}", e))
        })
    }

    /// Extract JSON from a response that may contain markdown or other text.
    fn extract_json(response: &str) -> &str {
        let trimmed = response.trim();

        if trimmed.starts_with('{') {
            return Self::extract_balanced_json(trimmed);
        }

        if let Some(start) = trimmed.find("```json") {
            let json_start = start + 7;
            if let Some(end) = trimmed[json_start..].find("```") {
                let extracted = trimmed[json_start..json_start + end].trim();
                return Self::extract_balanced_json(extracted);
            }
        }

        if let Some(start) = trimmed.find("```") {
            let after_backticks = &trimmed[start + 3..];
            // Skip optional language identifier
            let json_start = after_backticks.find('\n').map(|i| i + 1).unwrap_or(0);
            if let Some(end) = after_backticks[json_start..].find("```") {
                let extracted = after_backticks[json_start..json_start + end].trim();
                return Self::extract_balanced_json(extracted);
            }
        }

        if let Some(start) = trimmed.find('{') {
            return Self::extract_balanced_json(&trimmed[start..]);
        }

        trimmed
    }

    /// Trim a string starting with '{' to its first balanced object.
    ///
    /// `{"urgency": 0.2}}}` becomes `{"urgency": 0.2}`.
    fn extract_balanced_json(s: &str) -> &str {
        if !s.starts_with('{') {
            return s;
        }

        let mut depth = 0;
        let mut in_string = false;
        let mut escape_next = false;

        for (i, ch) in s.char_indices() {
            if escape_next {
                escape_next = false;
                continue;
            }

            match ch {
                '\\' if in_string => escape_next = true,
                '"' => in_string = !in_string,
                '{' if !in_string => depth += 1,
                '}' if !in_string => {
                    depth -= 1;
                    if depth == 0 {
                        return &s[..=i];
                    }
                }
                _ => {}
            }
        }

        s
    }
}
