//! The closed set of specialist handlers and the pipeline stages they share.

use std::fmt;

use care_core::{Capability, Classification, Language, QueryContext};
use serde::{Deserialize, Serialize};

use crate::clinical::ClinicalHandler;
use crate::cultural::CulturalHandler;
use crate::emergency::EmergencyHandler;
use crate::envelope::ResponseEnvelope;
use crate::error::{CapabilityRejection, HandlerError};
use crate::medication::MedicationHandler;

/// Identity of a specialist handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerKind {
    Medication,
    Emergency,
    Clinical,
    CulturallyLocalized,
}

impl HandlerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            HandlerKind::Medication => "medication",
            HandlerKind::Emergency => "emergency",
            HandlerKind::Clinical => "clinical",
            HandlerKind::CulturallyLocalized => "culturally_localized",
        }
    }

    /// Language the handler is tuned for.
    pub fn primary_language(self) -> Language {
        match self {
            HandlerKind::CulturallyLocalized => Language::Vietnamese,
            _ => Language::English,
        }
    }
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input to a handler: redacted text plus the enhanced context.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    /// Redacted query text. Handlers never see the raw text.
    pub text: String,
    pub context: QueryContext,
    pub classification: Classification,
}

impl HandlerRequest {
    pub fn new(text: impl Into<String>, context: QueryContext, classification: Classification) -> Self {
        Self {
            text: text.into(),
            context,
            classification,
        }
    }

    pub fn language(&self) -> &Language {
        &self.classification.language
    }
}

/// A specialist handler.
#[derive(Debug, Clone)]
pub enum Handler {
    Medication(MedicationHandler),
    Emergency(EmergencyHandler),
    Clinical(ClinicalHandler),
    CulturallyLocalized(CulturalHandler),
}

impl Handler {
    pub fn kind(&self) -> HandlerKind {
        match self {
            Handler::Medication(_) => HandlerKind::Medication,
            Handler::Emergency(_) => HandlerKind::Emergency,
            Handler::Clinical(_) => HandlerKind::Clinical,
            Handler::CulturallyLocalized(_) => HandlerKind::CulturallyLocalized,
        }
    }

    pub fn capabilities(&self) -> &[Capability] {
        match self {
            Handler::Medication(h) => h.capabilities(),
            Handler::Emergency(h) => h.capabilities(),
            Handler::Clinical(h) => h.capabilities(),
            Handler::CulturallyLocalized(h) => h.capabilities(),
        }
    }

    /// Highest severity any capability accepts.
    pub fn max_severity(&self) -> f32 {
        self.capabilities()
            .iter()
            .map(|c| c.max_severity)
            .fold(0.0, f32::max)
    }

    /// Reject queries whose language or urgency is outside every capability.
    ///
    /// Each language the query needs must be supported by at least one
    /// capability, and urgency must not exceed the largest maximum severity.
    pub fn check_capability(&self, language: &Language, urgency: f32) -> Result<(), HandlerError> {
        let capabilities = self.capabilities();

        for required in language.required() {
            if !capabilities.iter().any(|c| c.supports_language(&required)) {
                return Err(HandlerError::CapabilityExceeded {
                    handler: self.kind(),
                    reason: CapabilityRejection::UnsupportedLanguage(language.clone()),
                });
            }
        }

        if !capabilities.iter().any(|c| c.can_handle_severity(urgency)) {
            return Err(HandlerError::CapabilityExceeded {
                handler: self.kind(),
                reason: CapabilityRejection::SeverityTooHigh {
                    urgency,
                    max_severity: self.max_severity(),
                },
            });
        }

        Ok(())
    }

    /// Merge the classification's extracted entities into the context.
    ///
    /// Never removes anything already present.
    pub fn enhance_context(&self, context: &QueryContext, classification: &Classification) -> QueryContext {
        context.merged(&classification.entities)
    }

    /// Run the handler's domain processing.
    ///
    /// Never fails: backend errors produce a degraded response, or the
    /// safety fallback on the emergency path.
    pub async fn handle(&self, request: &HandlerRequest) -> ResponseEnvelope {
        let envelope = match self {
            Handler::Medication(h) => h.handle(request).await,
            Handler::Emergency(h) => h.handle(request).await,
            Handler::Clinical(h) => h.handle(request).await,
            Handler::CulturallyLocalized(h) => h.handle(request).await,
        };

        if envelope.metadata.degraded {
            return envelope;
        }
        let confidence = adjust_confidence(
            envelope.confidence,
            self.kind(),
            self.capabilities(),
            request,
        );
        envelope.with_confidence(confidence)
    }
}

/// Shared confidence adjustment.
///
/// -0.1 when the query language differs from the handler's primary
/// language, +0.1 when an extracted entity falls under a declared specialty.
pub fn adjust_confidence(
    base: f32,
    kind: HandlerKind,
    capabilities: &[Capability],
    request: &HandlerRequest,
) -> f32 {
    let mut confidence = base;

    if *request.language() != kind.primary_language() {
        confidence -= 0.1;
    }

    let specialty_hit = request
        .classification
        .entities
        .all()
        .any(|entity| capabilities.iter().any(|c| c.covers(entity)));
    if specialty_hit {
        confidence += 0.1;
    }

    confidence.clamp(0.0, 1.0)
}
