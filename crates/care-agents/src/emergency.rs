//! Emergency triage.
//!
//! Maps severity onto five triage levels. Critical keywords and critical
//! vitals override the computed level rather than blending with it. This
//! handler never fails: any backend problem yields [`fallback_envelope`].

use care_core::keywords::{contains_any, matched_terms, normalize, INTENSITY_WORDS, SYMPTOM_TERMS};
use care_core::{score, Capability, UrgencyScore};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::envelope::{HandlerDetails, ResponseEnvelope};
use crate::generation::Generator;
use crate::handler::{HandlerKind, HandlerRequest};
use crate::prompts::{format_handler_input, EMERGENCY_SYSTEM_PROMPT};

/// Severity at or above which the response requires escalation.
pub const ESCALATION_THRESHOLD: f32 = 0.7;

/// Severity at or above which contacts and protocols are attached.
pub const PROTOCOL_THRESHOLD: f32 = 0.8;

pub const FALLBACK_CONFIDENCE: f32 = 0.5;

/// Safety message used whenever the emergency path cannot complete normally.
pub const FALLBACK_TEXT: &str = "This may be a medical emergency. Call emergency services now: 115 in Vietnam, 911 in the US. Do not wait for an online answer.\n\nĐây có thể là tình huống cấp cứu. Hãy gọi cấp cứu ngay: 115 tại Việt Nam, 911 tại Mỹ. Đừng chờ câu trả lời trực tuyến.";

const CALL_NOW: &str = "Call emergency services now (115 in Vietnam, 911 in the US).";

/// Discrete triage level, 1 (immediate) through 5 (non-urgent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriageLevel {
    Immediate,
    Emergent,
    Urgent,
    LessUrgent,
    NonUrgent,
}

impl TriageLevel {
    pub fn from_severity(severity: f32) -> Self {
        if severity >= 0.9 {
            TriageLevel::Immediate
        } else if severity >= 0.7 {
            TriageLevel::Emergent
        } else if severity >= 0.5 {
            TriageLevel::Urgent
        } else if severity >= 0.3 {
            TriageLevel::LessUrgent
        } else {
            TriageLevel::NonUrgent
        }
    }

    pub fn number(self) -> u8 {
        match self {
            TriageLevel::Immediate => 1,
            TriageLevel::Emergent => 2,
            TriageLevel::Urgent => 3,
            TriageLevel::LessUrgent => 4,
            TriageLevel::NonUrgent => 5,
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            TriageLevel::Immediate => "red",
            TriageLevel::Emergent => "orange",
            TriageLevel::Urgent => "yellow",
            TriageLevel::LessUrgent => "green",
            TriageLevel::NonUrgent => "blue",
        }
    }

    pub fn disposition(self) -> Disposition {
        match self {
            TriageLevel::Immediate => Disposition::CallEmergencyServices,
            TriageLevel::Emergent => Disposition::EmergencyDepartment,
            TriageLevel::Urgent => Disposition::UrgentCare,
            TriageLevel::LessUrgent => Disposition::PrimaryCare,
            TriageLevel::NonUrgent => Disposition::SelfCare,
        }
    }

    pub fn timeframe(self) -> &'static str {
        match self {
            TriageLevel::Immediate => "Immediate",
            TriageLevel::Emergent => "15-30 minutes",
            TriageLevel::Urgent => "1-2 hours",
            TriageLevel::LessUrgent => "2-4 hours",
            TriageLevel::NonUrgent => "As needed",
        }
    }

    /// Lowest severity consistent with this level.
    pub fn severity_floor(self) -> f32 {
        match self {
            TriageLevel::Immediate => 0.9,
            TriageLevel::Emergent => 0.7,
            TriageLevel::Urgent => 0.5,
            TriageLevel::LessUrgent => 0.3,
            TriageLevel::NonUrgent => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    SelfCare,
    PrimaryCare,
    UrgentCare,
    EmergencyDepartment,
    CallEmergencyServices,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyTier {
    Routine,
    Urgent,
    Emergency,
    Critical,
}

impl UrgencyTier {
    pub fn from_severity(severity: f32) -> Self {
        if severity >= 0.9 {
            UrgencyTier::Critical
        } else if severity >= 0.7 {
            UrgencyTier::Emergency
        } else if severity >= 0.5 {
            UrgencyTier::Urgent
        } else {
            UrgencyTier::Routine
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub name: String,
    pub number: String,
    pub region: String,
}

const CONTACTS: &[(&str, &str, &str)] = &[
    ("Ambulance (Cấp cứu)", "115", "Vietnam"),
    ("Police (Công an)", "113", "Vietnam"),
    ("Fire (Cứu hỏa)", "114", "Vietnam"),
    ("Poison control (Chống độc)", "1900 4595", "Vietnam"),
    ("Emergency services", "911", "US"),
    ("Emergency services", "112", "EU"),
    ("Emergency services", "999", "UK"),
];

pub fn emergency_contacts() -> Vec<EmergencyContact> {
    CONTACTS
        .iter()
        .map(|(name, number, region)| EmergencyContact {
            name: name.to_string(),
            number: number.to_string(),
            region: region.to_string(),
        })
        .collect()
}

/// Per-category first actions and protocol summaries.
const CATEGORY_GUIDANCE: &[(&str, &str, &str)] = &[
    ("cardiac", "Sit down, rest and loosen tight clothing.", "Suspected cardiac event: keep at rest, monitor breathing, be ready to start CPR."),
    ("respiratory", "Sit upright and use a prescribed inhaler if available.", "Breathing difficulty: keep airway clear, upright position, watch for blue lips."),
    ("neurological", "Note the time symptoms started and do not give food or drink.", "Suspected stroke or seizure: record onset time, protect from injury, recovery position if unresponsive."),
    ("hemorrhage", "Apply firm, direct pressure to the bleeding.", "Major bleeding: continuous direct pressure, elevate the limb, do not remove soaked dressings."),
    ("allergic", "Use an epinephrine auto-injector if one is prescribed.", "Anaphylaxis: epinephrine if available, lie flat with legs raised unless breathing is hard."),
    ("toxic", "Call poison control (1900 4595) and keep the container or label.", "Poisoning or overdose: do not induce vomiting, bring the substance to hospital."),
    ("self_harm", "Do not leave the person alone and remove anything they could use to hurt themselves.", "Self-harm risk: stay with the person, keep them safe, connect to crisis support."),
    ("trauma", "Do not move the person unless they are in danger.", "Major trauma: keep still, control bleeding, keep warm."),
];

fn guidance_for(category: &str) -> Option<(&'static str, &'static str)> {
    CATEGORY_GUIDANCE
        .iter()
        .find(|(c, _, _)| *c == category)
        .map(|(_, action, protocol)| (*action, *protocol))
}

/// Emergency assessment of one query. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageAssessment {
    pub level: TriageLevel,
    pub level_number: u8,
    pub color: String,
    /// On `[0.0, 1.0]`, raised to the level's floor.
    pub severity: f32,
    pub urgency_tier: UrgencyTier,
    pub disposition: Disposition,
    pub timeframe: String,
    /// Ordered, most important first.
    pub immediate_actions: Vec<String>,
    pub red_flags: Vec<String>,
    pub emergency_contacts: Vec<EmergencyContact>,
    pub protocols: Vec<String>,
    pub requires_escalation: bool,
    pub confidence: f32,
}

impl TriageAssessment {
    fn at_level(level: TriageLevel, severity: f32) -> Self {
        let severity = severity.max(level.severity_floor()).clamp(0.0, 1.0);
        Self {
            level,
            level_number: level.number(),
            color: level.color().to_string(),
            severity,
            urgency_tier: UrgencyTier::from_severity(severity),
            disposition: level.disposition(),
            timeframe: level.timeframe().to_string(),
            immediate_actions: Vec::new(),
            red_flags: Vec::new(),
            emergency_contacts: Vec::new(),
            protocols: Vec::new(),
            requires_escalation: severity >= ESCALATION_THRESHOLD,
            confidence: 0.9,
        }
    }

    /// Level-1 assessment used when the normal path fails.
    pub fn fallback() -> Self {
        let mut assessment = Self::at_level(TriageLevel::Immediate, 1.0);
        assessment.immediate_actions = vec![CALL_NOW.to_string()];
        assessment.emergency_contacts = emergency_contacts();
        assessment.requires_escalation = true;
        assessment.confidence = FALLBACK_CONFIDENCE;
        assessment
    }
}

fn symptom_level(normalized: &str, scored: &UrgencyScore) -> TriageLevel {
    if scored.has_specific_critical_keyword() || scored.has_critical_vital() {
        return TriageLevel::Immediate;
    }
    if !scored.critical_categories.is_empty() {
        return TriageLevel::Emergent;
    }
    let symptoms = matched_terms(normalized, SYMPTOM_TERMS);
    match (symptoms.is_empty(), contains_any(normalized, INTENSITY_WORDS)) {
        (false, true) => TriageLevel::Urgent,
        (false, false) => TriageLevel::LessUrgent,
        (true, _) => TriageLevel::NonUrgent,
    }
}

/// Triage a query from its (redacted) text and context.
pub fn assess(text: &str, context: &care_core::QueryContext) -> TriageAssessment {
    let normalized = normalize(text);
    let scored = score(text, context);

    let by_severity = TriageLevel::from_severity(scored.urgency);
    let by_symptoms = symptom_level(&normalized, &scored);
    let level = by_severity.min(by_symptoms);

    let mut assessment = TriageAssessment::at_level(level, scored.urgency);

    assessment.red_flags = scored
        .signals
        .iter()
        .filter(|s| s.weight >= 0.35)
        .map(|s| s.label.clone())
        .collect();

    let mut actions = Vec::new();
    match level {
        TriageLevel::Immediate => {
            actions.push(CALL_NOW.to_string());
            actions.push("Stay with the person and keep them still.".to_string());
        }
        TriageLevel::Emergent => {
            actions.push("Go to the nearest emergency department now. Do not drive yourself.".to_string());
        }
        TriageLevel::Urgent => actions.push("Visit an urgent care clinic within 1-2 hours.".to_string()),
        TriageLevel::LessUrgent => actions.push("Book a primary care visit today.".to_string()),
        TriageLevel::NonUrgent => {
            actions.push("Rest and monitor; seek care if symptoms get worse.".to_string())
        }
    }
    for category in &scored.critical_categories {
        if let Some((action, protocol)) = guidance_for(category) {
            actions.push(action.to_string());
            if assessment.severity >= PROTOCOL_THRESHOLD {
                assessment.protocols.push(protocol.to_string());
            }
        }
    }
    assessment.immediate_actions = actions;

    if assessment.severity >= PROTOCOL_THRESHOLD {
        assessment.emergency_contacts = emergency_contacts();
    }

    if level == by_symptoms && by_symptoms < by_severity {
        assessment.confidence = 0.95;
    }

    assessment
}

/// Safety envelope returned whenever the emergency path cannot complete.
pub fn fallback_envelope(urgency: f32) -> ResponseEnvelope {
    let assessment = TriageAssessment::fallback();
    ResponseEnvelope::new(HandlerKind::Emergency, FALLBACK_TEXT)
        .with_confidence(FALLBACK_CONFIDENCE)
        .with_urgency(urgency.max(assessment.severity))
        .with_escalation(true)
        .with_details(HandlerDetails::Emergency(assessment))
        .degraded()
}

/// Handler for emergencies.
#[derive(Debug, Clone)]
pub struct EmergencyHandler {
    generator: Generator,
    capabilities: Vec<Capability>,
}

impl EmergencyHandler {
    pub fn new(generator: Generator) -> Self {
        let capabilities = vec![
            Capability::new("emergency_triage", 0.95, 1.0)
                .with_description("Five-level triage with disposition")
                .with_specialties(&[
                    "chest pain", "shortness of breath", "difficulty breathing", "stroke",
                    "seizure", "bleeding", "overdose", "anaphylaxis", "đau ngực", "khó thở",
                ]),
            Capability::new("emergency_guidance", 0.9, 1.0)
                .with_description("Immediate first-aid instructions")
                .with_specialties(&["first aid", "emergency", "cấp cứu"]),
        ];
        Self {
            generator,
            capabilities,
        }
    }

    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    pub async fn handle(&self, request: &HandlerRequest) -> ResponseEnvelope {
        let assessment = assess(&request.text, &request.context);
        let urgency = request.classification.urgency.max(assessment.severity);
        info!(
            level = assessment.level_number,
            severity = assessment.severity,
            disposition = ?assessment.disposition,
            "TRIAGE_ASSESSED"
        );

        let mut findings = vec![
            format!(
                "triage level {} ({}), disposition {:?}, timeframe {}",
                assessment.level_number, assessment.color, assessment.disposition, assessment.timeframe
            ),
        ];
        findings.extend(assessment.red_flags.iter().cloned());
        let input = format_handler_input(&request.text, &request.context, &findings, request.language());

        match self.generator.generate(EMERGENCY_SYSTEM_PROMPT, input).await {
            Ok(generation) => {
                let text = if assessment.level <= TriageLevel::Emergent {
                    format!("{}\n\n{}", assessment.immediate_actions.join(" "), generation.text)
                } else {
                    generation.text
                };
                let mut envelope = ResponseEnvelope::new(HandlerKind::Emergency, text)
                    .with_confidence(assessment.confidence)
                    .with_urgency(urgency)
                    .with_escalation(assessment.requires_escalation);
                envelope.metadata.model = generation.model;
                envelope.with_details(HandlerDetails::Emergency(assessment))
            }
            Err(e) => {
                warn!(error = %e, level = assessment.level_number, "EMERGENCY_FALLBACK");
                let mut envelope = fallback_envelope(urgency);
                if let Some(HandlerDetails::Emergency(fallback)) = envelope.metadata.details.as_mut() {
                    fallback.red_flags = assessment.red_flags;
                }
                envelope
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HandlerConfig;
    use care_core::{classify, QueryContext, Vitals};
    use mock_brain::{DelayedBrain, FailingBrain, ScriptedBrain};
    use std::sync::Arc;
    use std::time::Duration;

    fn ctx() -> QueryContext {
        QueryContext::default()
    }

    #[test]
    fn test_level_tables() {
        assert_eq!(TriageLevel::from_severity(0.95), TriageLevel::Immediate);
        assert_eq!(TriageLevel::from_severity(0.7), TriageLevel::Emergent);
        assert_eq!(TriageLevel::from_severity(0.5), TriageLevel::Urgent);
        assert_eq!(TriageLevel::from_severity(0.3), TriageLevel::LessUrgent);
        assert_eq!(TriageLevel::from_severity(0.1), TriageLevel::NonUrgent);
        assert_eq!(TriageLevel::Urgent.color(), "yellow");
        assert_eq!(TriageLevel::LessUrgent.timeframe(), "2-4 hours");
        assert_eq!(TriageLevel::NonUrgent.disposition(), Disposition::SelfCare);
        assert_eq!(UrgencyTier::from_severity(0.69), UrgencyTier::Urgent);
    }

    #[test]
    fn test_chest_pain_is_immediate() {
        let a = assess("severe chest pain, can't breathe", &ctx());
        assert_eq!(a.level, TriageLevel::Immediate);
        assert_eq!(a.urgency_tier, UrgencyTier::Critical);
        assert_eq!(a.disposition, Disposition::CallEmergencyServices);
        assert!(a.severity >= 0.9);
        assert!(a.requires_escalation);
        assert_eq!(a.immediate_actions[0], CALL_NOW);
        assert!(!a.emergency_contacts.is_empty());
        assert_eq!(a.protocols.len(), 2);
    }

    #[test]
    fn test_single_keyword_forces_level_one() {
        // Severity alone (0.35) would be level 4
        let a = assess("I think I'm having a stroke", &ctx());
        assert_eq!(a.level, TriageLevel::Immediate);
        assert!((a.severity - 0.9).abs() < 1e-6);
        assert!((a.confidence - 0.95).abs() < 1e-6);
    }

    #[test]
    fn test_critical_vital_forces_level_one() {
        let context = ctx().with_vitals(Vitals {
            heart_rate: Some(35.0),
            ..Vitals::default()
        });
        let a = assess("feeling weak", &context);
        assert_eq!(a.level, TriageLevel::Immediate);
    }

    #[test]
    fn test_general_emergency_word_is_level_two() {
        let a = assess("is this an emergency", &ctx());
        assert_eq!(a.level, TriageLevel::Emergent);
        assert_eq!(a.disposition, Disposition::EmergencyDepartment);
        assert!(a.requires_escalation);
        assert!(a.protocols.is_empty());
    }

    #[test]
    fn test_mild_symptoms_are_low_levels() {
        let a = assess("I have a runny nose", &ctx());
        assert_eq!(a.level, TriageLevel::LessUrgent);
        assert!(!a.requires_escalation);

        let a = assess("hello", &ctx());
        assert_eq!(a.level, TriageLevel::NonUrgent);
        assert_eq!(a.severity, 0.0);
    }

    #[test]
    fn test_fallback_assessment() {
        let a = TriageAssessment::fallback();
        assert_eq!(a.level_number, 1);
        assert_eq!(a.disposition, Disposition::CallEmergencyServices);
        assert!(a.requires_escalation);
        assert_eq!(a.confidence, FALLBACK_CONFIDENCE);
    }

    fn request(text: &str) -> HandlerRequest {
        HandlerRequest::new(text, ctx(), classify(text, &ctx()))
    }

    #[tokio::test]
    async fn test_handle_prefixes_actions() {
        let brain = Arc::new(ScriptedBrain::replying("1. Stay calm."));
        let handler = EmergencyHandler::new(Generator::new(brain, &HandlerConfig::default()));

        let env = handler.handle(&request("severe chest pain, can't breathe")).await;
        assert!(env.text.starts_with(CALL_NOW));
        assert!(env.text.ends_with("1. Stay calm."));
        assert!(env.requires_escalation);
        assert_eq!(env.triage().unwrap().urgency_tier, UrgencyTier::Critical);
    }

    #[tokio::test]
    async fn test_backend_failure_yields_fallback() {
        let handler = EmergencyHandler::new(Generator::new(
            Arc::new(FailingBrain::new("down")),
            &HandlerConfig::default(),
        ));

        let env = handler.handle(&request("my father collapsed, not breathing")).await;
        assert!(env.requires_escalation);
        assert!(env.text.contains("115"));
        assert!(env.text.contains("911"));
        assert_eq!(env.confidence, FALLBACK_CONFIDENCE);
        assert!(env.metadata.degraded);
        assert_eq!(env.triage().unwrap().level, TriageLevel::Immediate);
    }

    #[tokio::test]
    async fn test_backend_timeout_yields_fallback() {
        let brain = Arc::new(DelayedBrain::with_secs(ScriptedBrain::replying("late"), 5));
        let config = HandlerConfig::default().with_backend_timeout(Duration::from_millis(20));
        let handler = EmergencyHandler::new(Generator::new(brain, &config));

        let env = handler.handle(&request("I have a mild headache")).await;
        assert!(env.requires_escalation);
        assert_eq!(env.text, FALLBACK_TEXT);
    }
}
