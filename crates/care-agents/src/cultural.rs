//! Vietnamese cultural health: traditional remedies alongside conventional care.

use care_core::keywords::{contains_term, matched_terms, normalize, TRADITIONAL_PRACTICE_TERMS};
use care_core::lexicon::{find_drugs, find_herbs, lookup_drug, DrugInfo, HerbInfo, HerbSafety};
use care_core::{detect_cultural_context, Capability, CulturalContext, Language, PregnancyStatus, QueryContext};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::envelope::{HandlerDetails, ResponseEnvelope};
use crate::generation::Generator;
use crate::handler::{HandlerKind, HandlerRequest};
use crate::medication::DEGRADED_CONFIDENCE;
use crate::prompts::{format_handler_input, CULTURAL_SYSTEM_PROMPT};

/// Notes for physical traditional practices.
const PRACTICE_NOTES: &[(&str, &str)] = &[
    ("cạo gió", "Cạo gió (coining): do not use on broken skin or with blood thinners; the marks are not bruises from abuse."),
    ("coining", "Coining: do not use on broken skin or with blood thinners."),
    ("giác hơi", "Giác hơi (cupping): avoid on broken skin, during fever in children, and with blood thinners."),
    ("cupping", "Cupping: avoid on broken skin and with blood thinners."),
    ("châm cứu", "Châm cứu (acupuncture): use a licensed practitioner with sterile needles."),
    ("acupuncture", "Acupuncture: use a licensed practitioner with sterile needles."),
    ("bấm huyệt", "Bấm huyệt (acupressure): generally safe; stop if pain increases."),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HerbAssessment {
    pub name: String,
    pub english: String,
    pub scientific: String,
    pub safety: HerbSafety,
    pub traditional_uses: Vec<String>,
    /// Contraindicated conditions present for this patient.
    pub cautions: Vec<String>,
    pub interacting_medications: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CulturalGuidance {
    pub cultural_context: Option<CulturalContext>,
    pub practices: Vec<String>,
    pub herbs: Vec<HerbAssessment>,
    /// Traditional-practice track.
    pub traditional_advice: Vec<String>,
    /// Conventional-medicine track.
    pub conventional_advice: Vec<String>,
    pub can_combine: bool,
    pub physician_consultation_required: bool,
}

impl CulturalGuidance {
    pub fn findings(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for herb in &self.herbs {
            let mut line = format!("{} ({}): {:?}", herb.name, herb.english, herb.safety);
            if !herb.interacting_medications.is_empty() {
                line.push_str(&format!(", interacts with {}", herb.interacting_medications.join(", ")));
            }
            if !herb.cautions.is_empty() {
                line.push_str(&format!(", caution: {}", herb.cautions.join(", ")));
            }
            lines.push(line);
        }
        if !self.practices.is_empty() {
            lines.push(format!("practices: {}", self.practices.join(", ")));
        }
        lines.push(if self.physician_consultation_required {
            "physician consultation required before combining".to_string()
        } else {
            "can be combined with conventional care".to_string()
        });
        lines
    }
}

fn patient_drugs(normalized: &str, context: &QueryContext) -> Vec<&'static DrugInfo> {
    let mut drugs = find_drugs(normalized);
    for name in &context.current_medications {
        if let Some(drug) = lookup_drug(name) {
            if !drugs.iter().any(|d| d.name == drug.name) {
                drugs.push(drug);
            }
        }
    }
    drugs
}

fn assess_herb(herb: &HerbInfo, drugs: &[&DrugInfo], normalized: &str, context: &QueryContext) -> HerbAssessment {
    let conditions = normalize(&context.conditions.join(", "));
    let mut cautions: Vec<String> = herb
        .contraindications
        .iter()
        .filter(|c| contains_term(&conditions, c) || contains_term(normalized, c))
        .map(|c| c.to_string())
        .collect();
    if context.pregnancy_status == Some(PregnancyStatus::Pregnant)
        && herb.contraindications.contains(&"pregnancy")
        && !cautions.iter().any(|c| c == "pregnancy")
    {
        cautions.push("pregnancy".to_string());
    }

    let interacting_medications = drugs
        .iter()
        .filter(|d| herb.interacts_with.iter().any(|c| d.has_class(*c)))
        .map(|d| d.name.to_string())
        .collect();

    HerbAssessment {
        name: herb.name.to_string(),
        english: herb.english.to_string(),
        scientific: herb.scientific.to_string(),
        safety: herb.safety,
        traditional_uses: herb.traditional_uses.iter().map(|s| s.to_string()).collect(),
        cautions,
        interacting_medications,
    }
}

/// Whether a herb may be used together with the patient's conventional care.
pub fn can_combine(herb: &HerbAssessment, takes_modern_medication: bool) -> bool {
    match herb.safety {
        HerbSafety::Avoid => false,
        HerbSafety::Caution => !takes_modern_medication && herb.cautions.is_empty(),
        HerbSafety::Safe => herb.interacting_medications.is_empty() && herb.cautions.is_empty(),
    }
}

/// Rule-based review of traditional practices and remedies in a query.
pub fn analyze_cultural(text: &str, context: &QueryContext) -> CulturalGuidance {
    let normalized = normalize(text);
    let drugs = patient_drugs(&normalized, context);
    let takes_modern = !drugs.is_empty() || !context.current_medications.is_empty();

    let mut herbs = find_herbs(&normalized);
    for name in &context.current_medications {
        for herb in find_herbs(&normalize(name)) {
            if !herbs.iter().any(|h| h.name == herb.name) {
                herbs.push(herb);
            }
        }
    }
    let herbs: Vec<HerbAssessment> = herbs
        .into_iter()
        .map(|h| assess_herb(h, &drugs, &normalized, context))
        .collect();

    let practices: Vec<String> = matched_terms(&normalized, TRADITIONAL_PRACTICE_TERMS)
        .into_iter()
        .map(str::to_string)
        .collect();

    let combinable = herbs.iter().all(|h| can_combine(h, takes_modern));
    let physician_consultation_required = !combinable;

    let mut traditional_advice = Vec::new();
    for herb in &herbs {
        let mut line = format!(
            "{} ({}) is traditionally used for {}.",
            herb.name,
            herb.english,
            herb.traditional_uses.join(", ")
        );
        match herb.safety {
            HerbSafety::Safe => line.push_str(" Generally safe in food amounts."),
            HerbSafety::Caution => line.push_str(" Use with caution and for short periods."),
            HerbSafety::Avoid => line.push_str(" Not recommended; it can cause serious harm."),
        }
        traditional_advice.push(line);
    }
    for (term, note) in PRACTICE_NOTES {
        if practices.iter().any(|p| p == *term) {
            traditional_advice.push(note.to_string());
        }
    }
    if traditional_advice.is_empty() {
        traditional_advice.push(
            "Traditional remedies can support, but not replace, medical treatment.".to_string(),
        );
    }

    let mut conventional_advice =
        vec!["Tell your doctor and pharmacist about every herb or remedy you use.".to_string()];
    if takes_modern {
        conventional_advice.push("Keep taking prescribed medicines unless your doctor says otherwise.".to_string());
    }
    for herb in herbs.iter().filter(|h| !h.interacting_medications.is_empty()) {
        conventional_advice.push(format!(
            "{} may interact with {}; check with a physician before combining.",
            herb.english,
            herb.interacting_medications.join(", ")
        ));
    }
    if physician_consultation_required {
        conventional_advice.push("See a physician before combining these treatments.".to_string());
    }

    CulturalGuidance {
        cultural_context: context
            .cultural_preference
            .as_deref()
            .and_then(CulturalContext::from_preference)
            .or_else(|| detect_cultural_context(text)),
        practices,
        herbs,
        traditional_advice,
        conventional_advice,
        can_combine: combinable,
        physician_consultation_required,
    }
}

/// Handler for culturally-localized questions.
#[derive(Debug, Clone)]
pub struct CulturalHandler {
    generator: Generator,
    capabilities: Vec<Capability>,
}

impl CulturalHandler {
    pub fn new(generator: Generator) -> Self {
        let capabilities = vec![
            Capability::new("traditional_medicine", 0.85, 0.6)
                .with_description("Vietnamese traditional remedies and practices")
                .with_languages(vec![Language::Vietnamese])
                .with_specialties(&[
                    "thuốc nam", "đông y", "thuốc bắc", "gừng", "nghệ", "cam thảo", "nhân sâm",
                    "đương quy", "ma hoàng", "châm cứu", "cạo gió", "giác hơi",
                ]),
            Capability::new("cultural_health_communication", 0.8, 0.5)
                .with_description("Culturally appropriate health explanations")
                .with_languages(vec![Language::Vietnamese, Language::English]),
            Capability::new("integrative_care", 0.8, 0.7)
                .with_description("Combining traditional and conventional treatment safely")
                .with_languages(vec![Language::Vietnamese])
                .with_specialties(&["herbal", "ginger", "turmeric", "licorice", "ginseng", "dong quai"]),
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
        let guidance = analyze_cultural(&request.text, &request.context);
        let urgency = request.classification.urgency;
        debug!(
            herbs = guidance.herbs.len(),
            consult = guidance.physician_consultation_required,
            "CULTURAL_GUIDANCE"
        );

        let confidence = if guidance.physician_consultation_required { 0.75 } else { 0.85 };
        let findings = guidance.findings();
        let input = format_handler_input(&request.text, &request.context, &findings, request.language());

        match self.generator.generate(CULTURAL_SYSTEM_PROMPT, input).await {
            Ok(generation) => {
                let mut envelope = ResponseEnvelope::new(HandlerKind::CulturallyLocalized, generation.text)
                    .with_confidence(confidence)
                    .with_urgency(urgency)
                    .with_escalation(guidance.physician_consultation_required);
                envelope.metadata.model = generation.model;
                envelope.metadata.cultural_context = guidance.cultural_context;
                envelope.with_details(HandlerDetails::CulturallyLocalized(guidance))
            }
            Err(e) => {
                warn!(error = %e, handler = "culturally_localized", "HANDLER_BACKEND_ERROR");
                let text = dual_track_text(&guidance);
                let mut envelope = ResponseEnvelope::new(HandlerKind::CulturallyLocalized, text)
                    .with_confidence(DEGRADED_CONFIDENCE)
                    .with_urgency(urgency)
                    .with_escalation(guidance.physician_consultation_required)
                    .degraded();
                envelope.metadata.cultural_context = guidance.cultural_context;
                envelope.with_details(HandlerDetails::CulturallyLocalized(guidance))
            }
        }
    }
}

/// Rule-based two-track answer.
fn dual_track_text(guidance: &CulturalGuidance) -> String {
    let mut text = String::from("Y học cổ truyền (traditional practice):");
    for line in &guidance.traditional_advice {
        text.push_str("\n- ");
        text.push_str(line);
    }
    text.push_str("\n\nY học hiện đại (conventional medicine):");
    for line in &guidance.conventional_advice {
        text.push_str("\n- ");
        text.push_str(line);
    }
    text
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

    #[test]
    fn test_safe_herb_without_medication() {
        let g = analyze_cultural("uống trà gừng khi bị cảm có tốt không", &ctx());
        assert_eq!(g.herbs.len(), 1);
        assert_eq!(g.herbs[0].safety, HerbSafety::Safe);
        assert!(g.can_combine);
        assert!(!g.physician_consultation_required);
        assert_eq!(g.cultural_context, Some(CulturalContext::Traditional));
    }

    #[test]
    fn test_caution_herb_with_modern_medication() {
        let context = ctx().with_medication("lisinopril");
        let g = analyze_cultural("bà tôi uống cam thảo mỗi ngày", &context);
        assert_eq!(g.herbs[0].safety, HerbSafety::Caution);
        assert_eq!(g.herbs[0].interacting_medications, vec!["lisinopril"]);
        assert!(g.physician_consultation_required);
        assert!(!g.can_combine);
        assert!(g.conventional_advice.iter().any(|a| a.contains("licorice may interact")));
    }

    #[test]
    fn test_contraindicated_condition() {
        let context = ctx().with_condition("cao huyết áp");
        let g = analyze_cultural("nhân sâm có tốt không", &context);
        assert_eq!(g.herbs[0].cautions, vec!["cao huyết áp"]);
        assert!(g.physician_consultation_required);
    }

    #[test]
    fn test_avoid_herb_never_combines() {
        let g = analyze_cultural("ma hoàng trị hen", &ctx());
        assert!(!g.can_combine);
        assert!(g.traditional_advice[0].contains("Not recommended"));
    }

    #[test]
    fn test_practice_notes() {
        let g = analyze_cultural("con tôi bị sốt, tôi cạo gió cho cháu", &ctx());
        assert_eq!(g.practices, vec!["cạo gió"]);
        assert!(g.traditional_advice.iter().any(|a| a.starts_with("Cạo gió")));
        assert!(g.can_combine);
    }

    #[test]
    fn test_can_combine_rules() {
        let herb = HerbAssessment {
            name: "gừng".into(),
            english: "ginger".into(),
            scientific: String::new(),
            safety: HerbSafety::Safe,
            traditional_uses: vec![],
            cautions: vec![],
            interacting_medications: vec!["warfarin".into()],
        };
        assert!(!can_combine(&herb, true));

        let clean = HerbAssessment {
            interacting_medications: vec![],
            ..herb.clone()
        };
        assert!(can_combine(&clean, true));

        let caution = HerbAssessment {
            safety: HerbSafety::Caution,
            ..clean
        };
        assert!(can_combine(&caution, false));
        assert!(!can_combine(&caution, true));
    }

    #[tokio::test]
    async fn test_degraded_response_is_dual_track() {
        let text = "bà tôi dùng thuốc nam và gừng";
        let request = HandlerRequest::new(text, ctx(), classify(text, &ctx()));
        let handler = CulturalHandler::new(Generator::new(
            Arc::new(FailingBrain::new("down")),
            &HandlerConfig::default(),
        ));

        let env = handler.handle(&request).await;
        assert!(env.metadata.degraded);
        assert!(env.text.contains("Y học cổ truyền"));
        assert!(env.text.contains("Y học hiện đại"));
        assert_eq!(env.cultural().unwrap().practices, vec!["thuốc nam"]);
    }

    #[tokio::test]
    async fn test_backend_reply_used() {
        let text = "nghệ có tác dụng gì";
        let request = HandlerRequest::new(text, ctx(), classify(text, &ctx()));
        let brain = Arc::new(
            ScriptedBrain::replying("general").with_rule("Vietnamese cultural health", "Nghệ tốt cho tiêu hóa."),
        );
        let handler = CulturalHandler::new(Generator::new(brain, &HandlerConfig::default()));

        let env = handler.handle(&request).await;
        assert_eq!(env.text, "Nghệ tốt cho tiêu hóa.");
        assert!(!env.requires_escalation);
    }
}
