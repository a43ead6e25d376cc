//! The response envelope handed back to callers and collaborators.

use care_core::{CulturalContext, Language, MedicalEntities};
use phi_redactor::{IdentifierType, RedactionResult, RiskTier};
use serde::{Deserialize, Serialize};

use crate::clinical::ClinicalAssessment;
use crate::cultural::CulturalGuidance;
use crate::emergency::TriageAssessment;
use crate::handler::HandlerKind;
use crate::medication::MedicationAnalysis;

/// What the redactor found, without the identifier values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RedactionFlags {
    pub phi_detected: bool,
    pub identifier_types: Vec<IdentifierType>,
    pub identifier_count: usize,
    pub risk_tier: RiskTier,
    pub confidence: f64,
}

impl From<&RedactionResult> for RedactionFlags {
    fn from(result: &RedactionResult) -> Self {
        Self {
            phi_detected: result.has_phi(),
            identifier_types: result.identifier_types(),
            identifier_count: result.identifiers.len(),
            risk_tier: result.risk_tier,
            confidence: result.confidence,
        }
    }
}

/// Handler-specific structured output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HandlerDetails {
    Medication(MedicationAnalysis),
    Emergency(TriageAssessment),
    Clinical(ClinicalAssessment),
    CulturallyLocalized(CulturalGuidance),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeMetadata {
    pub redaction: RedactionFlags,
    pub entities: MedicalEntities,
    pub language: Option<Language>,
    pub cultural_context: Option<CulturalContext>,
    pub cultural_notes: Vec<String>,
    /// Labels of the urgency signals that fired.
    pub urgency_signals: Vec<String>,
    pub classification_reasoning: Vec<String>,
    /// Handler the router picked before a severity re-route.
    pub rerouted_from: Option<HandlerKind>,
    pub disclaimer_added: bool,
    /// Set when the backend failed and a rule-based response was used.
    pub degraded: bool,
    pub model: Option<String>,
    pub latency_ms: u64,
    pub details: Option<HandlerDetails>,
}

/// One handled query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub handler: HandlerKind,
    pub text: String,
    pub confidence: f32,
    pub urgency: f32,
    pub requires_escalation: bool,
    pub metadata: EnvelopeMetadata,
}

impl ResponseEnvelope {
    pub fn new(handler: HandlerKind, text: impl Into<String>) -> Self {
        Self {
            handler,
            text: text.into(),
            confidence: 0.0,
            urgency: 0.0,
            requires_escalation: false,
            metadata: EnvelopeMetadata::default(),
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_urgency(mut self, urgency: f32) -> Self {
        self.urgency = urgency.clamp(0.0, 1.0);
        self
    }

    pub fn with_escalation(mut self, requires_escalation: bool) -> Self {
        self.requires_escalation = requires_escalation;
        self
    }

    pub fn with_details(mut self, details: HandlerDetails) -> Self {
        self.metadata.details = Some(details);
        self
    }

    /// Mark as a rule-based response produced without the backend.
    pub fn degraded(mut self) -> Self {
        self.metadata.degraded = true;
        self
    }

    pub fn triage(&self) -> Option<&TriageAssessment> {
        match &self.metadata.details {
            Some(HandlerDetails::Emergency(t)) => Some(t),
            _ => None,
        }
    }

    pub fn medication(&self) -> Option<&MedicationAnalysis> {
        match &self.metadata.details {
            Some(HandlerDetails::Medication(m)) => Some(m),
            _ => None,
        }
    }

    pub fn clinical(&self) -> Option<&ClinicalAssessment> {
        match &self.metadata.details {
            Some(HandlerDetails::Clinical(c)) => Some(c),
            _ => None,
        }
    }

    pub fn cultural(&self) -> Option<&CulturalGuidance> {
        match &self.metadata.details {
            Some(HandlerDetails::CulturallyLocalized(c)) => Some(c),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phi_redactor::Redactor;

    #[test]
    fn test_flags_from_redaction() {
        let result = Redactor::new().detect("SSN 123-45-6789, email jane@example.com");
        let flags = RedactionFlags::from(&result);
        assert!(flags.phi_detected);
        assert_eq!(flags.identifier_count, 2);
        assert_eq!(flags.risk_tier, RiskTier::High);
    }

    #[test]
    fn test_envelope_clamps() {
        let env = ResponseEnvelope::new(HandlerKind::Clinical, "x")
            .with_confidence(1.7)
            .with_urgency(-0.2);
        assert_eq!(env.confidence, 1.0);
        assert_eq!(env.urgency, 0.0);
    }

    #[test]
    fn test_envelope_serializes_without_phi() {
        let result = Redactor::new().detect("call me at 555-123-4567");
        let mut env = ResponseEnvelope::new(HandlerKind::Clinical, "ok");
        env.metadata.redaction = RedactionFlags::from(&result);

        let json = serde_json::to_string(&env).unwrap();
        assert!(!json.contains("555-123-4567"));
        assert!(json.contains("\"handler\":\"clinical\""));
    }
}
