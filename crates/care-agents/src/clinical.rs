//! Clinical decision support.
//!
//! Candidate probabilities are independent: each condition is scored from
//! its own evidence and several can be high at once. They are not a
//! distribution and are never normalized against each other.

use care_core::keywords::{contains_any, matched_terms, normalize};
use care_core::{Capability, QueryContext, Vitals};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::envelope::{HandlerDetails, ResponseEnvelope};
use crate::generation::Generator;
use crate::handler::{HandlerKind, HandlerRequest};
use crate::medication::DEGRADED_CONFIDENCE;
use crate::prompts::{format_handler_input, CLINICAL_SYSTEM_PROMPT};

/// Every candidate starts here before evidence is added.
pub const BASE_PROBABILITY: f32 = 0.1;
pub const MAX_PROBABILITY: f32 = 0.9;

/// Probability at which a high or critical candidate needs physician review.
pub const REVIEW_THRESHOLD: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClinicalSeverity {
    Low,
    Moderate,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateCondition {
    pub condition: String,
    /// Independent probability on `[0.0, 1.0]`.
    pub probability: f32,
    pub clinical_severity: ClinicalSeverity,
    pub supporting_evidence: Vec<String>,
    pub contradicting_evidence: Vec<String>,
    pub next_steps: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    Diagnostic,
    Therapeutic,
    Screening,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Routine,
    Soon,
    Urgent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub description: String,
    pub priority: Priority,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskScores {
    pub cardiovascular: Option<f32>,
    pub diabetes: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClinicalAssessment {
    /// Highest probability first.
    pub candidates: Vec<CandidateCondition>,
    pub recommendations: Vec<Recommendation>,
    pub risk_scores: RiskScores,
    pub referrals: Vec<String>,
    pub requires_physician_review: bool,
}

impl ClinicalAssessment {
    pub fn findings(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .candidates
            .iter()
            .map(|c| {
                format!(
                    "consider {} (probability {:.2}, {:?} severity); next: {}",
                    c.condition,
                    c.probability,
                    c.clinical_severity,
                    c.next_steps.join(", ")
                )
            })
            .collect();
        lines.extend(
            self.recommendations
                .iter()
                .map(|r| format!("{:?} ({:?}): {}", r.kind, r.priority, r.description)),
        );
        if !self.referrals.is_empty() {
            lines.push(format!("referral: {}", self.referrals.join(", ")));
        }
        if self.requires_physician_review {
            lines.push("physician review needed".to_string());
        }
        lines
    }
}

#[derive(Debug, Clone, Copy)]
enum VitalCue {
    Fever,
    Tachycardia,
    LowOxygen,
    HighBloodPressure,
}

impl VitalCue {
    fn evidence(self, vitals: &Vitals) -> Option<String> {
        match self {
            VitalCue::Fever => vitals
                .temperature_c
                .filter(|t| *t >= 38.0)
                .map(|t| format!("temperature {t}°C")),
            VitalCue::Tachycardia => vitals
                .heart_rate
                .filter(|hr| *hr > 100.0)
                .map(|hr| format!("heart rate {hr}")),
            VitalCue::LowOxygen => vitals
                .oxygen_saturation
                .filter(|s| *s < 95.0)
                .map(|s| format!("oxygen saturation {s}%")),
            VitalCue::HighBloodPressure => high_blood_pressure(vitals, 140.0, 90.0)
                .then(|| format!("blood pressure {}", describe_bp(vitals))),
        }
    }
}

fn high_blood_pressure(vitals: &Vitals, systolic: f32, diastolic: f32) -> bool {
    vitals.systolic_bp.is_some_and(|s| s >= systolic)
        || vitals.diastolic_bp.is_some_and(|d| d >= diastolic)
}

fn describe_bp(vitals: &Vitals) -> String {
    match (vitals.systolic_bp, vitals.diastolic_bp) {
        (Some(s), Some(d)) => format!("{s}/{d}"),
        (Some(s), None) => format!("{s} systolic"),
        (None, Some(d)) => format!("{d} diastolic"),
        (None, None) => "unknown".to_string(),
    }
}

const CORONARY_HISTORY: &[&str] = &[
    "heart disease",
    "coronary artery disease",
    "heart attack",
    "previous heart attack",
    "angina",
    "bệnh tim",
    "bệnh mạch vành",
];

const HYPERTENSION: &[&str] = &["hypertension", "high blood pressure", "cao huyết áp", "tăng huyết áp"];
const DIABETES: &[&str] = &["diabetes", "tiểu đường", "đái tháo đường"];
const SMOKING: &[&str] = &["smoker", "smoking", "smokes", "hút thuốc"];
const OVERWEIGHT: &[&str] = &["overweight", "obese", "obesity", "béo phì", "thừa cân"];
const FAMILY_DIABETES: &[&str] = &["family history of diabetes", "gia đình có người tiểu đường"];

struct ConditionRule {
    condition: &'static str,
    /// Every group must match at least one term.
    triggers: &'static [&'static [&'static str]],
    severity: ClinicalSeverity,
    /// (minimum age, increment)
    older: Option<(u32, f32)>,
    /// (age below, increment)
    younger: Option<(u32, f32)>,
    history: &'static [&'static str],
    history_weight: f32,
    vital: Option<(VitalCue, f32)>,
    coronary_weight: f32,
    supporting: &'static [&'static str],
    contradicting: &'static [&'static str],
    next_steps: &'static [&'static str],
    referral: Option<&'static str>,
}

const CHEST_PAIN: &[&str] = &["chest pain", "chest pressure", "chest tightness", "đau ngực", "tức ngực"];
const BREATHLESS: &[&str] = &[
    "shortness of breath",
    "difficulty breathing",
    "trouble breathing",
    "breathless",
    "khó thở",
];
const FEVER: &[&str] = &["fever", "high fever", "sốt", "sốt cao"];
const COUGH: &[&str] = &["cough", "coughing", "ho"];
const ABDOMINAL: &[&str] = &["abdominal pain", "stomach pain", "stomach ache", "đau bụng"];
const HEADACHE: &[&str] = &["headache", "severe headache", "migraine", "đau đầu"];

const NONE: &[&str] = &[];

const RULES: &[ConditionRule] = &[
    ConditionRule {
        condition: "acute coronary syndrome",
        triggers: &[CHEST_PAIN],
        severity: ClinicalSeverity::Critical,
        older: Some((45, 0.2)),
        younger: None,
        history: &["diabetes", "hypertension", "high blood pressure", "tiểu đường", "cao huyết áp", "high cholesterol"],
        history_weight: 0.15,
        vital: Some((VitalCue::Tachycardia, 0.1)),
        coronary_weight: 0.15,
        supporting: &["sweating", "arm pain", "jaw pain", "nausea", "shortness of breath", "vã mồ hôi"],
        contradicting: &["when pressing", "after eating", "sharp when i move"],
        next_steps: &["ECG", "cardiac troponin", "emergency evaluation if pain lasts over 5 minutes"],
        referral: Some("cardiology"),
    },
    ConditionRule {
        condition: "gastroesophageal reflux",
        triggers: &[CHEST_PAIN],
        severity: ClinicalSeverity::Low,
        older: None,
        younger: None,
        history: &["reflux", "gerd", "trào ngược"],
        history_weight: 0.25,
        vital: None,
        coronary_weight: 0.0,
        supporting: &["after eating", "burning", "heartburn", "sour taste", "ợ chua"],
        contradicting: &["sweating", "arm pain"],
        next_steps: &["primary care review", "trial of acid suppression under guidance"],
        referral: None,
    },
    ConditionRule {
        condition: "musculoskeletal chest pain",
        triggers: &[CHEST_PAIN],
        severity: ClinicalSeverity::Low,
        older: None,
        younger: Some((40, 0.1)),
        history: NONE,
        history_weight: 0.0,
        vital: None,
        coronary_weight: 0.0,
        supporting: &["when pressing", "lifting", "after exercise", "when i move"],
        contradicting: &["sweating", "shortness of breath"],
        next_steps: &["rest", "primary care review if persistent"],
        referral: None,
    },
    ConditionRule {
        condition: "asthma exacerbation",
        triggers: &[BREATHLESS],
        severity: ClinicalSeverity::Moderate,
        older: None,
        younger: None,
        history: &["asthma", "copd", "hen suyễn"],
        history_weight: 0.25,
        vital: Some((VitalCue::LowOxygen, 0.1)),
        coronary_weight: 0.0,
        supporting: &["wheezing", "cough", "khò khè"],
        contradicting: &["fever"],
        next_steps: &["peak flow measurement", "inhaler technique review"],
        referral: Some("pulmonology"),
    },
    ConditionRule {
        condition: "pulmonary embolism",
        triggers: &[BREATHLESS],
        severity: ClinicalSeverity::Critical,
        older: None,
        younger: None,
        history: &["recent surgery", "blood clot", "cancer", "ung thư", "long flight"],
        history_weight: 0.2,
        vital: Some((VitalCue::Tachycardia, 0.15)),
        coronary_weight: 0.0,
        supporting: &["leg swelling", "chest pain", "coughing up blood"],
        contradicting: NONE,
        next_steps: &["D-dimer", "CT pulmonary angiography"],
        referral: Some("pulmonology"),
    },
    ConditionRule {
        condition: "heart failure",
        triggers: &[BREATHLESS],
        severity: ClinicalSeverity::High,
        older: Some((65, 0.15)),
        younger: None,
        history: &["heart failure", "suy tim"],
        history_weight: 0.25,
        vital: None,
        coronary_weight: 0.15,
        supporting: &["leg swelling", "swelling", "lying flat", "waking up breathless"],
        contradicting: NONE,
        next_steps: &["BNP blood test", "echocardiogram"],
        referral: Some("cardiology"),
    },
    ConditionRule {
        condition: "pneumonia",
        triggers: &[FEVER, COUGH],
        severity: ClinicalSeverity::High,
        older: Some((65, 0.15)),
        younger: None,
        history: &["copd", "asthma", "heart failure"],
        history_weight: 0.1,
        vital: Some((VitalCue::LowOxygen, 0.15)),
        coronary_weight: 0.0,
        supporting: &["shortness of breath", "chest pain", "khó thở", "green phlegm"],
        contradicting: &["runny nose"],
        next_steps: &["chest x-ray", "pulse oximetry", "blood tests"],
        referral: Some("pulmonology"),
    },
    ConditionRule {
        condition: "influenza",
        triggers: &[FEVER, COUGH],
        severity: ClinicalSeverity::Moderate,
        older: None,
        younger: None,
        history: NONE,
        history_weight: 0.0,
        vital: Some((VitalCue::Fever, 0.1)),
        coronary_weight: 0.0,
        supporting: &["body aches", "fatigue", "chills", "mệt mỏi", "đau nhức"],
        contradicting: NONE,
        next_steps: &["rapid influenza test", "antivirals within 48 hours for high-risk patients"],
        referral: None,
    },
    ConditionRule {
        condition: "viral upper respiratory infection",
        triggers: &[FEVER, COUGH],
        severity: ClinicalSeverity::Low,
        older: None,
        younger: Some((40, 0.1)),
        history: NONE,
        history_weight: 0.0,
        vital: None,
        coronary_weight: 0.0,
        supporting: &["runny nose", "sore throat", "sổ mũi", "đau họng"],
        contradicting: &["shortness of breath"],
        next_steps: &["rest and fluids", "paracetamol for fever"],
        referral: None,
    },
    ConditionRule {
        condition: "gastroenteritis",
        triggers: &[ABDOMINAL],
        severity: ClinicalSeverity::Low,
        older: None,
        younger: None,
        history: NONE,
        history_weight: 0.0,
        vital: None,
        coronary_weight: 0.0,
        supporting: &["diarrhea", "vomiting", "tiêu chảy", "nôn"],
        contradicting: NONE,
        next_steps: &["oral rehydration", "seek care if unable to keep fluids down"],
        referral: None,
    },
    ConditionRule {
        condition: "appendicitis",
        triggers: &[ABDOMINAL],
        severity: ClinicalSeverity::High,
        older: None,
        younger: Some((30, 0.1)),
        history: NONE,
        history_weight: 0.0,
        vital: Some((VitalCue::Fever, 0.1)),
        coronary_weight: 0.0,
        supporting: &["right lower", "lower right", "vomiting", "loss of appetite"],
        contradicting: &["diarrhea"],
        next_steps: &["urgent clinical examination", "abdominal ultrasound"],
        referral: Some("general surgery"),
    },
    ConditionRule {
        condition: "gallbladder disease",
        triggers: &[ABDOMINAL],
        severity: ClinicalSeverity::Moderate,
        older: Some((40, 0.1)),
        younger: None,
        history: &["gallstones", "sỏi mật"],
        history_weight: 0.2,
        vital: None,
        coronary_weight: 0.0,
        supporting: &["upper right", "after fatty", "after eating"],
        contradicting: NONE,
        next_steps: &["abdominal ultrasound", "liver function tests"],
        referral: Some("general surgery"),
    },
    ConditionRule {
        condition: "tension headache",
        triggers: &[HEADACHE],
        severity: ClinicalSeverity::Low,
        older: None,
        younger: None,
        history: NONE,
        history_weight: 0.0,
        vital: None,
        coronary_weight: 0.0,
        supporting: &["stress", "neck", "căng thẳng"],
        contradicting: &["fever", "vision changes"],
        next_steps: &["rest and hydration", "simple analgesic"],
        referral: None,
    },
    ConditionRule {
        condition: "migraine",
        triggers: &[HEADACHE],
        severity: ClinicalSeverity::Moderate,
        older: None,
        younger: None,
        history: &["migraine", "đau nửa đầu"],
        history_weight: 0.3,
        vital: None,
        coronary_weight: 0.0,
        supporting: &["nausea", "light sensitivity", "vision changes", "buồn nôn"],
        contradicting: NONE,
        next_steps: &["headache diary", "primary care review"],
        referral: Some("neurology"),
    },
    ConditionRule {
        condition: "hypertensive headache",
        triggers: &[HEADACHE],
        severity: ClinicalSeverity::High,
        older: None,
        younger: None,
        history: HYPERTENSION,
        history_weight: 0.15,
        vital: Some((VitalCue::HighBloodPressure, 0.3)),
        coronary_weight: 0.0,
        supporting: &["dizziness", "chóng mặt"],
        contradicting: NONE,
        next_steps: &["recheck blood pressure", "urgent review if 180/120 or higher"],
        referral: None,
    },
    ConditionRule {
        condition: "meningitis",
        triggers: &[HEADACHE, FEVER],
        severity: ClinicalSeverity::Critical,
        older: None,
        younger: None,
        history: NONE,
        history_weight: 0.0,
        vital: Some((VitalCue::Fever, 0.2)),
        coronary_weight: 0.0,
        supporting: &["stiff neck", "rash", "confusion", "cứng cổ"],
        contradicting: NONE,
        next_steps: &["emergency evaluation"],
        referral: None,
    },
];

fn history_text(context: &QueryContext) -> String {
    normalize(&context.conditions.join(", "))
}

fn evaluate(rule: &ConditionRule, normalized: &str, history: &str, context: &QueryContext) -> Option<CandidateCondition> {
    if !rule.triggers.iter().all(|group| contains_any(normalized, group)) {
        return None;
    }

    let mut probability = BASE_PROBABILITY;
    let mut supporting = Vec::new();
    let mut contradicting = Vec::new();

    if let (Some((min_age, weight)), Some(age)) = (rule.older, context.age) {
        if age >= min_age {
            probability += weight;
            supporting.push(format!("age {age}"));
        }
    }
    if let (Some((max_age, weight)), Some(age)) = (rule.younger, context.age) {
        if age < max_age {
            probability += weight;
            supporting.push(format!("age {age}"));
        }
    }

    let combined_history = format!("{history} | {normalized}");
    if let Some(term) = matched_terms(&combined_history, rule.history).first() {
        probability += rule.history_weight;
        supporting.push(format!("history of {term}"));
    }

    if rule.coronary_weight > 0.0 {
        if let Some(term) = matched_terms(&combined_history, CORONARY_HISTORY).first() {
            probability += rule.coronary_weight;
            supporting.push(format!("coronary history ({term})"));
        }
    }

    if let (Some((cue, weight)), Some(vitals)) = (rule.vital, context.vitals.as_ref()) {
        if let Some(evidence) = cue.evidence(vitals) {
            probability += weight;
            supporting.push(evidence);
        }
    }

    for term in matched_terms(normalized, rule.supporting) {
        probability += 0.05;
        supporting.push(term.to_string());
    }
    for term in matched_terms(normalized, rule.contradicting) {
        probability -= 0.05;
        contradicting.push(term.to_string());
    }

    Some(CandidateCondition {
        condition: rule.condition.to_string(),
        probability: probability.clamp(0.05, MAX_PROBABILITY),
        clinical_severity: rule.severity,
        supporting_evidence: supporting,
        contradicting_evidence: contradicting,
        next_steps: rule.next_steps.iter().map(|s| s.to_string()).collect(),
    })
}

fn cardiovascular_risk(context: &QueryContext, history: &str, normalized: &str) -> Option<f32> {
    let combined = format!("{history} | {normalized}");
    let mut factors = 0.0f32;
    let mut any = false;

    if let Some(age) = context.age {
        factors += (age.saturating_sub(30) as f32 * 0.01).min(0.4);
        any = true;
    }
    for (terms, weight) in [(HYPERTENSION, 0.1), (DIABETES, 0.1), (SMOKING, 0.1), (CORONARY_HISTORY, 0.2)] {
        if contains_any(&combined, terms) {
            factors += weight;
            any = true;
        }
    }
    if context
        .vitals
        .as_ref()
        .is_some_and(|v| high_blood_pressure(v, 140.0, 90.0))
    {
        factors += 0.05;
        any = true;
    }
    any.then(|| factors.clamp(0.0, 1.0))
}

fn diabetes_risk(context: &QueryContext, history: &str, normalized: &str) -> Option<f32> {
    let combined = format!("{history} | {normalized}");
    // Already diagnosed
    if contains_any(history, DIABETES) {
        return None;
    }

    let mut factors = 0.0f32;
    let mut any = false;
    if context.age.is_some_and(|a| a >= 45) {
        factors += 0.1;
        any = true;
    }
    for (terms, weight) in [(OVERWEIGHT, 0.15), (FAMILY_DIABETES, 0.15), (HYPERTENSION, 0.1)] {
        if contains_any(&combined, terms) {
            factors += weight;
            any = true;
        }
    }
    any.then(|| factors.clamp(0.0, 1.0))
}

/// Rule-based clinical assessment.
pub fn assess_clinical(text: &str, context: &QueryContext) -> ClinicalAssessment {
    let normalized = normalize(text);
    let history = history_text(context);

    let mut candidates: Vec<CandidateCondition> = RULES
        .iter()
        .filter_map(|rule| evaluate(rule, &normalized, &history, context))
        .collect();
    candidates.sort_by(|a, b| b.probability.total_cmp(&a.probability));

    let mut recommendations = Vec::new();
    for candidate in candidates.iter().filter(|c| c.probability > 0.5) {
        recommendations.push(Recommendation {
            kind: RecommendationKind::Diagnostic,
            description: format!("{}: {}", candidate.condition, candidate.next_steps.join(", ")),
            priority: if candidate.clinical_severity >= ClinicalSeverity::High {
                Priority::Urgent
            } else {
                Priority::Soon
            },
        });
    }
    if let Some(vitals) = context.vitals.as_ref().filter(|v| high_blood_pressure(v, 140.0, 90.0)) {
        let severe = high_blood_pressure(vitals, 180.0, 120.0);
        recommendations.push(Recommendation {
            kind: RecommendationKind::Therapeutic,
            description: format!("blood pressure {} needs treatment review", describe_bp(vitals)),
            priority: if severe { Priority::Urgent } else { Priority::Routine },
        });
    }
    if context.age.is_some_and(|a| a >= 50) {
        recommendations.push(Recommendation {
            kind: RecommendationKind::Screening,
            description: "age-appropriate screening: blood pressure, lipids, blood sugar, colorectal cancer"
                .to_string(),
            priority: Priority::Routine,
        });
    }

    let mut referrals: Vec<String> = Vec::new();
    for candidate in candidates.iter().filter(|c| c.probability >= REVIEW_THRESHOLD) {
        let referral = RULES
            .iter()
            .find(|r| r.condition == candidate.condition)
            .and_then(|r| r.referral);
        if let Some(referral) = referral {
            if !referrals.iter().any(|r| r == referral) {
                referrals.push(referral.to_string());
            }
        }
    }
    if contains_any(&history, DIABETES) && !referrals.iter().any(|r| r == "endocrinology") {
        referrals.push("endocrinology".to_string());
    }

    let requires_physician_review = candidates.iter().any(|c| {
        c.clinical_severity >= ClinicalSeverity::High && c.probability >= REVIEW_THRESHOLD
    });

    ClinicalAssessment {
        risk_scores: RiskScores {
            cardiovascular: cardiovascular_risk(context, &history, &normalized),
            diabetes: diabetes_risk(context, &history, &normalized),
        },
        candidates,
        recommendations,
        referrals,
        requires_physician_review,
    }
}

/// Handler for general clinical questions.
#[derive(Debug, Clone)]
pub struct ClinicalHandler {
    generator: Generator,
    capabilities: Vec<Capability>,
}

impl ClinicalHandler {
    pub fn new(generator: Generator) -> Self {
        let capabilities = vec![
            Capability::new("differential_support", 0.8, 0.7)
                .with_description("Candidate conditions with independent probabilities")
                .with_specialties(&[
                    "chest pain", "shortness of breath", "fever", "cough", "abdominal pain",
                    "headache", "severe headache", "đau đầu", "sốt", "ho", "đau bụng",
                ]),
            Capability::new("risk_assessment", 0.75, 0.6)
                .with_description("Cardiovascular and diabetes risk")
                .with_specialties(&["diabetes", "hypertension", "high blood pressure", "heart disease"]),
            Capability::new("treatment_guidance", 0.75, 0.6)
                .with_description("Next steps and recommendations"),
            Capability::new("preventive_care", 0.8, 0.5)
                .with_description("Screening and prevention")
                .with_specialties(&["screening", "checkup", "vaccine"]),
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
        let assessment = assess_clinical(&request.text, &request.context);
        let urgency = request.classification.urgency;
        debug!(
            candidates = assessment.candidates.len(),
            review = assessment.requires_physician_review,
            "CLINICAL_ASSESSMENT"
        );

        let confidence = if assessment.candidates.is_empty() { 0.7 } else { 0.8 };
        let findings = assessment.findings();
        let input = format_handler_input(&request.text, &request.context, &findings, request.language());

        match self.generator.generate(CLINICAL_SYSTEM_PROMPT, input).await {
            Ok(generation) => {
                let mut envelope = ResponseEnvelope::new(HandlerKind::Clinical, generation.text)
                    .with_confidence(confidence)
                    .with_urgency(urgency)
                    .with_escalation(assessment.requires_physician_review);
                envelope.metadata.model = generation.model;
                envelope.with_details(HandlerDetails::Clinical(assessment))
            }
            Err(e) => {
                warn!(error = %e, handler = "clinical", "HANDLER_BACKEND_ERROR");
                let mut text = String::from(
                    "We could not generate a full answer right now. If your symptoms are getting worse, please contact a doctor.",
                );
                if !findings.is_empty() {
                    text.push_str("\n\nPoints to discuss with your doctor:");
                    for line in &findings {
                        text.push_str("\n- ");
                        text.push_str(line);
                    }
                }
                ResponseEnvelope::new(HandlerKind::Clinical, text)
                    .with_confidence(DEGRADED_CONFIDENCE)
                    .with_urgency(urgency)
                    .with_escalation(assessment.requires_physician_review)
                    .with_details(HandlerDetails::Clinical(assessment))
                    .degraded()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HandlerConfig;
    use care_core::classify;
    use mock_brain::{FailingBrain, ScriptedBrain};
    use std::sync::Arc;

    fn ctx() -> QueryContext {
        QueryContext::default()
    }

    fn probability(a: &ClinicalAssessment, condition: &str) -> f32 {
        a.candidates
            .iter()
            .find(|c| c.condition == condition)
            .map(|c| c.probability)
            .unwrap_or_default()
    }

    #[test]
    fn test_chest_pain_in_older_patient() {
        let context = ctx()
            .with_age(62)
            .with_condition("type 2 diabetes")
            .with_condition("previous heart attack");
        let a = assess_clinical("chest pain with sweating", &context);

        assert_eq!(a.candidates[0].condition, "acute coronary syndrome");
        // 0.1 + 0.2 age + 0.15 history + 0.15 coronary + 0.05 sweating
        assert!((probability(&a, "acute coronary syndrome") - 0.65).abs() < 1e-5);
        assert!(a.requires_physician_review);
        assert!(a.referrals.contains(&"cardiology".to_string()));
        assert!(a.referrals.contains(&"endocrinology".to_string()));
        assert!(a
            .recommendations
            .iter()
            .any(|r| r.kind == RecommendationKind::Diagnostic && r.priority == Priority::Urgent));
        assert!(a
            .recommendations
            .iter()
            .any(|r| r.kind == RecommendationKind::Screening));
    }

    #[test]
    fn test_probabilities_are_independent() {
        let context = ctx().with_age(70).with_vitals(Vitals {
            temperature_c: Some(39.0),
            oxygen_saturation: Some(92.0),
            ..Vitals::default()
        });
        let a = assess_clinical("fever and cough, shortness of breath, body aches", &context);

        let total: f32 = a.candidates.iter().map(|c| c.probability).sum();
        assert!(total > 1.0, "probabilities must not be normalized (sum {total})");
        assert!(a.candidates.iter().all(|c| c.probability <= MAX_PROBABILITY));
        assert_eq!(a.candidates[0].condition, "pneumonia");
    }

    #[test]
    fn test_probability_cap() {
        let context = ctx()
            .with_age(80)
            .with_condition("hypertension")
            .with_condition("coronary artery disease")
            .with_vitals(Vitals {
                heart_rate: Some(120.0),
                ..Vitals::default()
            });
        let a = assess_clinical(
            "chest pain, sweating, arm pain, jaw pain, nausea, shortness of breath",
            &context,
        );
        assert_eq!(probability(&a, "acute coronary syndrome"), MAX_PROBABILITY);
    }

    #[test]
    fn test_contradicting_evidence() {
        let a = assess_clinical("chest pain after eating, burning", &ctx());
        let acs = a
            .candidates
            .iter()
            .find(|c| c.condition == "acute coronary syndrome")
            .unwrap();
        assert_eq!(acs.contradicting_evidence, vec!["after eating"]);
        assert_eq!(a.candidates[0].condition, "gastroesophageal reflux");
    }

    #[test]
    fn test_blood_pressure_recommendation() {
        let context = ctx().with_vitals(Vitals {
            systolic_bp: Some(185.0),
            diastolic_bp: Some(100.0),
            ..Vitals::default()
        });
        let a = assess_clinical("headache", &context);
        let therapeutic = a
            .recommendations
            .iter()
            .find(|r| r.kind == RecommendationKind::Therapeutic)
            .unwrap();
        assert_eq!(therapeutic.priority, Priority::Urgent);
        assert!(probability(&a, "hypertensive headache") > 0.39);
        assert!(a.requires_physician_review);
    }

    #[test]
    fn test_risk_scores() {
        let context = ctx().with_age(60).with_condition("hypertension");
        let a = assess_clinical("I am a smoker and overweight", &context);
        let cv = a.risk_scores.cardiovascular.unwrap();
        assert!((cv - 0.5).abs() < 1e-5);
        let dm = a.risk_scores.diabetes.unwrap();
        assert!((dm - 0.35).abs() < 1e-5);

        let diabetic = ctx().with_condition("diabetes");
        assert!(assess_clinical("", &diabetic).risk_scores.diabetes.is_none());
        assert_eq!(assess_clinical("", &ctx()).risk_scores, RiskScores::default());
    }

    #[test]
    fn test_no_candidates_for_unrelated_text() {
        let a = assess_clinical("what vitamins are good", &ctx());
        assert!(a.candidates.is_empty());
        assert!(!a.requires_physician_review);
    }

    #[tokio::test]
    async fn test_handle_and_degrade() {
        let text = "I have a fever and cough";
        let request = HandlerRequest::new(text, ctx(), classify(text, &ctx()));

        let ok = ClinicalHandler::new(Generator::new(
            Arc::new(ScriptedBrain::replying("Probably a cold.")),
            &HandlerConfig::default(),
        ))
        .handle(&request)
        .await;
        assert_eq!(ok.text, "Probably a cold.");
        assert!(ok.clinical().is_some());

        let degraded = ClinicalHandler::new(Generator::new(
            Arc::new(FailingBrain::new("down")),
            &HandlerConfig::default(),
        ))
        .handle(&request)
        .await;
        assert!(degraded.metadata.degraded);
        assert_eq!(degraded.confidence, DEGRADED_CONFIDENCE);
        assert!(degraded.text.contains("pneumonia"));
    }
}
