//! Deterministic intent classification.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entities::{extract_entities, MedicalEntities};
use crate::keywords::{
    critical_categories, matched_terms, normalize, CHRONIC_HIGH_RISK, CLINICAL_TERMS,
    MEDICATION_TERMS, SYMPTOM_TERMS, TRADITIONAL_PRACTICE_TERMS,
};
use crate::language::{detect_cultural_context, detect_language, CulturalContext, Language};
use crate::lexicon::{find_drugs, find_herbs};
use crate::query::QueryContext;
use crate::scoring::{score, Signal};

/// Primary intent of a query, declared in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Emergency,
    Medication,
    CulturallyLocalized,
    Clinical,
    General,
}

impl Intent {
    /// Lower is more important.
    pub fn priority(self) -> u8 {
        match self {
            Intent::Emergency => 0,
            Intent::Medication => 1,
            Intent::CulturallyLocalized => 2,
            Intent::Clinical => 3,
            Intent::General => 4,
        }
    }

    /// The more important of two intents.
    pub fn max_priority(self, other: Intent) -> Intent {
        if other.priority() < self.priority() {
            other
        } else {
            self
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Intent::Emergency => "emergency",
            Intent::Medication => "medication",
            Intent::CulturallyLocalized => "culturally_localized",
            Intent::Clinical => "clinical",
            Intent::General => "general",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "emergency" | "emergency_triage" => Ok(Intent::Emergency),
            "medication" | "medication_management" => Ok(Intent::Medication),
            "culturally_localized" | "cultural" | "vietnamese_cultural" | "traditional_medicine" => {
                Ok(Intent::CulturallyLocalized)
            }
            "clinical" | "clinical_decision_support" => Ok(Intent::Clinical),
            "general" | "general_health" => Ok(Intent::General),
            other => Err(format!("unknown intent: {other}")),
        }
    }
}

/// Supervisor classification of one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub primary_intent: Intent,
    /// On `[0.0, 1.0]`.
    pub urgency: f32,
    pub cultural_context: Option<CulturalContext>,
    pub language: Language,
    pub confidence: f32,
    /// Ordered trace of why this intent and urgency were chosen.
    pub reasoning: Vec<String>,
    pub entities: MedicalEntities,
    pub signals: Vec<Signal>,
}

impl Classification {
    pub const FALLBACK_URGENCY: f32 = 0.3;
    pub const FALLBACK_REASONING: &'static str = "Fallback classification due to analysis error";

    /// General intent at moderate-low urgency, used when analysis fails.
    pub fn fallback() -> Self {
        Self {
            primary_intent: Intent::General,
            urgency: Self::FALLBACK_URGENCY,
            cultural_context: None,
            language: Language::English,
            confidence: 0.3,
            reasoning: vec![Self::FALLBACK_REASONING.to_string()],
            entities: MedicalEntities::default(),
            signals: Vec::new(),
        }
    }

    pub fn reasoning_text(&self) -> String {
        self.reasoning.join("; ")
    }
}

/// Intent from disjoint keyword sets, checked in priority order.
///
/// Returns the intent and the term or category that decided it.
pub fn detect_intent(text: &str) -> (Intent, Option<String>) {
    let normalized = normalize(text);

    if let Some((category, term)) = critical_categories(&normalized).first() {
        return (Intent::Emergency, Some(format!("{category}: {term}")));
    }
    if let Some(term) = matched_terms(&normalized, MEDICATION_TERMS).first() {
        return (Intent::Medication, Some(term.to_string()));
    }
    if let Some(drug) = find_drugs(&normalized).first() {
        return (Intent::Medication, Some(drug.name.to_string()));
    }
    if let Some(term) = matched_terms(&normalized, TRADITIONAL_PRACTICE_TERMS).first() {
        return (Intent::CulturallyLocalized, Some(term.to_string()));
    }
    if let Some(herb) = find_herbs(&normalized).first() {
        return (Intent::CulturallyLocalized, Some(herb.name.to_string()));
    }
    for table in [CLINICAL_TERMS, SYMPTOM_TERMS, CHRONIC_HIGH_RISK] {
        if let Some(term) = matched_terms(&normalized, table).first() {
            return (Intent::Clinical, Some(term.to_string()));
        }
    }
    (Intent::General, None)
}

/// Classify a query without any backend.
pub fn classify(text: &str, context: &QueryContext) -> Classification {
    let (mut intent, matched) = detect_intent(text);
    let urgency = score(text, context);
    let mut reasoning = Vec::new();

    match &matched {
        Some(term) => reasoning.push(format!("{intent} keywords matched ({term})")),
        None => reasoning.push("no specialist keywords matched".to_string()),
    }

    if intent != Intent::Emergency && urgency.has_critical_vital() {
        intent = Intent::Emergency;
        reasoning.push("critical vital sign".to_string());
    }

    let language = context
        .preferred_language()
        .unwrap_or_else(|| detect_language(text));
    let cultural_context = context
        .cultural_preference
        .as_deref()
        .and_then(CulturalContext::from_preference)
        .or_else(|| detect_cultural_context(text));

    reasoning.push(format!("urgency {:.2} from {} signal(s)", urgency.urgency, urgency.signals.len()));

    let confidence = match (intent, matched.is_some()) {
        (Intent::General, _) => 0.5,
        (Intent::Emergency, _) => 0.9,
        (_, true) => 0.8,
        (_, false) => 0.6,
    };

    debug!(
        intent = %intent,
        urgency = urgency.urgency,
        language = %language,
        "INTENT_CLASSIFIED"
    );

    Classification {
        primary_intent: intent,
        urgency: urgency.urgency,
        cultural_context,
        language,
        confidence,
        reasoning,
        entities: extract_entities(text),
        signals: urgency.signals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Vitals;

    #[test]
    fn test_priority_order() {
        assert_eq!(Intent::Medication.max_priority(Intent::Emergency), Intent::Emergency);
        assert_eq!(Intent::Clinical.max_priority(Intent::General), Intent::Clinical);
        assert_eq!(
            Intent::CulturallyLocalized.max_priority(Intent::Clinical),
            Intent::CulturallyLocalized
        );
    }

    #[test]
    fn test_emergency_wins_ties() {
        let (intent, _) = detect_intent("overdose on my medication");
        assert_eq!(intent, Intent::Emergency);
    }

    #[test]
    fn test_detect_each_intent() {
        assert_eq!(detect_intent("when should I take my metformin").0, Intent::Medication);
        assert_eq!(detect_intent("bà tôi dùng thuốc nam").0, Intent::CulturallyLocalized);
        assert_eq!(detect_intent("I have a fever and cough").0, Intent::Clinical);
        assert_eq!(detect_intent("what are your opening hours").0, Intent::General);
    }

    #[test]
    fn test_classify_emergency_scenario() {
        let c = classify("severe chest pain, can't breathe", &QueryContext::default());
        assert_eq!(c.primary_intent, Intent::Emergency);
        assert!(c.urgency >= 0.8);
        assert_eq!(c.language, Language::English);
    }

    #[test]
    fn test_classify_medication_scenario() {
        let ctx = QueryContext::default().with_medication("metformin");
        let c = classify("when should I take my metformin", &ctx);
        assert_eq!(c.primary_intent, Intent::Medication);
        assert!(c.urgency < 0.4);
        assert_eq!(c.entities.medications, vec!["metformin"]);
    }

    #[test]
    fn test_critical_vital_promotes_to_emergency() {
        let ctx = QueryContext::default().with_vitals(Vitals {
            respiratory_rate: Some(36.0),
            ..Vitals::default()
        });
        let c = classify("feeling a bit off", &ctx);
        assert_eq!(c.primary_intent, Intent::Emergency);
    }

    #[test]
    fn test_language_preference_overrides_detection() {
        let ctx = QueryContext::default().with_language_preference("vi");
        let c = classify("I have a headache", &ctx);
        assert_eq!(c.language, Language::Vietnamese);
    }

    #[test]
    fn test_fallback() {
        let c = Classification::fallback();
        assert_eq!(c.primary_intent, Intent::General);
        assert_eq!(c.urgency, 0.3);
        assert_eq!(c.reasoning_text(), "Fallback classification due to analysis error");
    }

    #[test]
    fn test_intent_from_str() {
        assert_eq!("Medication".parse::<Intent>(), Ok(Intent::Medication));
        assert_eq!("culturally-localized".parse::<Intent>(), Ok(Intent::CulturallyLocalized));
        assert_eq!("emergency_triage".parse::<Intent>(), Ok(Intent::Emergency));
        assert!("astrology".parse::<Intent>().is_err());
    }

    #[test]
    fn test_intent_serde() {
        assert_eq!(
            serde_json::to_string(&Intent::CulturallyLocalized).unwrap(),
            "\"culturally_localized\""
        );
    }
}
