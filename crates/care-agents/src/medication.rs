//! Medication safety: interactions, contraindications and monitoring.

use care_core::keywords::{contains_any, normalize};
use care_core::lexicon::{find_drugs, find_herbs, lookup_drug, DrugClass, DrugInfo, HerbInfo, HerbSafety, HERBS};
use care_core::{Capability, OrganFunction, PregnancyStatus, QueryContext};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::envelope::{HandlerDetails, ResponseEnvelope};
use crate::generation::Generator;
use crate::handler::{HandlerKind, HandlerRequest};
use crate::prompts::{format_handler_input, MEDICATION_SYSTEM_PROMPT};

/// Confidence of a degraded, rule-based response.
pub const DEGRADED_CONFIDENCE: f32 = 0.3;

const MISSED_DOSE_TERMS: &[&str] = &["forgot", "missed", "skip", "skipped", "quên", "bỏ liều"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionSeverity {
    Minor,
    Moderate,
    Major,
    Contraindicated,
}

impl InteractionSeverity {
    pub fn is_serious(self) -> bool {
        self >= InteractionSeverity::Major
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugInteraction {
    pub first: String,
    pub second: String,
    pub severity: InteractionSeverity,
    pub effect: String,
    pub management: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HerbDrugInteraction {
    pub herb: String,
    pub drug: String,
    pub severity: InteractionSeverity,
    pub effect: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contraindication {
    pub medication: String,
    pub reason: String,
    pub severity: InteractionSeverity,
}

/// Rule-based findings for one medication query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MedicationAnalysis {
    /// Canonical names of every known drug in the text or context.
    pub medications: Vec<String>,
    pub high_risk_medications: Vec<String>,
    pub interactions: Vec<DrugInteraction>,
    pub herb_interactions: Vec<HerbDrugInteraction>,
    pub contraindications: Vec<Contraindication>,
    pub safety_alerts: Vec<String>,
    pub monitoring: Vec<String>,
    pub adherence_advice: Vec<String>,
    pub requires_pharmacist: bool,
    pub requires_physician: bool,
    pub requires_escalation: bool,
    pub confidence: f32,
}

impl MedicationAnalysis {
    /// One line per finding, for prompts and degraded responses.
    pub fn findings(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for i in &self.interactions {
            lines.push(format!(
                "{} + {}: {:?} interaction, {}. {}",
                i.first, i.second, i.severity, i.effect, i.management
            ));
        }
        for h in &self.herb_interactions {
            lines.push(format!("{} with {}: {}", h.herb, h.drug, h.effect));
        }
        for c in &self.contraindications {
            lines.push(format!("{}: {}", c.medication, c.reason));
        }
        if !self.high_risk_medications.is_empty() {
            lines.push(format!(
                "high-risk medication: {}",
                self.high_risk_medications.join(", ")
            ));
        }
        lines.extend(self.safety_alerts.iter().cloned());
        lines.extend(self.monitoring.iter().cloned());
        lines.extend(self.adherence_advice.iter().cloned());
        if self.requires_physician {
            lines.push("physician consultation recommended".to_string());
        } else if self.requires_pharmacist {
            lines.push("pharmacist review recommended".to_string());
        }
        lines
    }
}

#[derive(Debug, Clone, Copy)]
enum Participant {
    Drug(&'static str),
    Class(DrugClass),
}

impl Participant {
    fn matches(self, drug: &DrugInfo) -> bool {
        match self {
            Participant::Drug(name) => drug.name == name,
            Participant::Class(class) => drug.has_class(class),
        }
    }
}

struct InteractionRule {
    a: Participant,
    b: Participant,
    severity: InteractionSeverity,
    effect: &'static str,
    management: &'static str,
}

const fn rule(
    a: Participant,
    b: Participant,
    severity: InteractionSeverity,
    effect: &'static str,
    management: &'static str,
) -> InteractionRule {
    InteractionRule {
        a,
        b,
        severity,
        effect,
        management,
    }
}

use DrugClass as C;
use InteractionSeverity::{Contraindicated, Major};
use Participant::{Class, Drug};

/// Known interactions, most specific first. One rule applies per drug pair.
const INTERACTIONS: &[InteractionRule] = &[
    rule(Drug("simvastatin"), Drug("gemfibrozil"), Contraindicated, "high risk of severe muscle damage", "do not combine; ask the prescriber for an alternative"),
    rule(Drug("warfarin"), Drug("aspirin"), Major, "greatly increased bleeding risk", "avoid unless prescribed together; monitor INR closely"),
    rule(Class(C::Anticoagulant), Class(C::Nsaid), Major, "increased bleeding risk", "use paracetamol for pain instead; ask a pharmacist"),
    rule(Class(C::Anticoagulant), Class(C::Antiplatelet), Major, "increased bleeding risk", "only combine under specialist supervision"),
    rule(Class(C::AceInhibitor), Class(C::PotassiumSupplement), Major, "risk of high potassium", "check potassium levels before continuing"),
    rule(Class(C::AceInhibitor), Drug("spironolactone"), Major, "risk of high potassium", "monitor potassium and kidney function"),
    rule(Class(C::Statin), Class(C::Fibrate), Major, "increased risk of muscle damage", "report muscle pain or weakness promptly"),
    rule(Drug("digoxin"), Class(C::Diuretic), Major, "low potassium raises digoxin toxicity", "monitor potassium and digoxin levels"),
    rule(Drug("lithium"), Class(C::Nsaid), Major, "raised lithium levels", "avoid NSAIDs; monitor lithium levels"),
    rule(Drug("lithium"), Class(C::AceInhibitor), Major, "raised lithium levels", "monitor lithium levels and kidney function"),
    rule(Drug("lithium"), Class(C::Diuretic), Major, "raised lithium levels", "monitor lithium levels"),
];

fn interaction_between(x: &DrugInfo, y: &DrugInfo) -> Option<&'static InteractionRule> {
    INTERACTIONS.iter().find(|r| {
        (r.a.matches(x) && r.b.matches(y)) || (r.a.matches(y) && r.b.matches(x))
    })
}

/// Medications from the text and the context, deduplicated, lexicon order.
fn resolve_medications(normalized: &str, context: &QueryContext) -> Vec<&'static DrugInfo> {
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

fn resolve_herbs(normalized: &str, context: &QueryContext) -> Vec<&'static HerbInfo> {
    let mut herbs = find_herbs(normalized);
    for name in &context.current_medications {
        for herb in find_herbs(&normalize(name)) {
            if !herbs.iter().any(|h| h.name == herb.name) {
                herbs.push(herb);
            }
        }
    }
    herbs.sort_by_key(|h| HERBS.iter().position(|x| x.name == h.name));
    herbs
}

fn allergy_conflict(allergy: &str, drug: &DrugInfo) -> bool {
    let allergy = normalize(allergy);
    if let Some(allergen) = lookup_drug(&allergy) {
        if allergen.name == drug.name {
            return true;
        }
    }
    let class_allergies = [
        ("penicillin", DrugClass::Penicillin),
        ("nsaid", DrugClass::Nsaid),
        ("statin", DrugClass::Statin),
        ("ace inhibitor", DrugClass::AceInhibitor),
    ];
    class_allergies
        .iter()
        .any(|(term, class)| allergy.contains(term) && drug.has_class(*class))
}

fn contraindications(drugs: &[&DrugInfo], context: &QueryContext) -> Vec<Contraindication> {
    let mut found = Vec::new();
    let mut push = |drug: &DrugInfo, reason: String, severity| {
        found.push(Contraindication {
            medication: drug.name.to_string(),
            reason,
            severity,
        })
    };

    for &drug in drugs {
        for allergy in &context.allergies {
            if allergy_conflict(allergy, drug) {
                push(drug, format!("documented allergy ({allergy})"), Contraindicated);
            }
        }

        if let Some(kidney) = context.kidney_function.filter(|k| k.is_impaired()) {
            let severe = kidney == OrganFunction::SevereImpairment;
            if drug.name == "metformin" && severe {
                push(drug, "severe kidney impairment".to_string(), Contraindicated);
            } else if drug.name == "metformin"
                || drug.has_class(DrugClass::Nsaid)
                || drug.has_class(DrugClass::PotassiumSupplement)
                || matches!(drug.name, "lithium" | "digoxin" | "apixaban" | "rivaroxaban")
            {
                push(drug, "reduced kidney function; dose review needed".to_string(), Major);
            }
        }

        if context.liver_function.is_some_and(|l| l.is_impaired())
            && (drug.name == "paracetamol" || drug.has_class(DrugClass::Statin))
        {
            push(drug, "reduced liver function; dose review needed".to_string(), Major);
        }

        if context.pregnancy_status == Some(PregnancyStatus::Pregnant) {
            if drug.name == "warfarin"
                || drug.has_class(DrugClass::AceInhibitor)
                || drug.has_class(DrugClass::AngiotensinReceptorBlocker)
                || drug.has_class(DrugClass::Statin)
            {
                push(drug, "not safe in pregnancy".to_string(), Contraindicated);
            } else if drug.name == "lithium" || drug.has_class(DrugClass::Nsaid) {
                push(drug, "use in pregnancy only under specialist advice".to_string(), Major);
            }
        }
    }
    found
}

fn monitoring_for(drug: &DrugInfo) -> Option<&'static str> {
    match drug.name {
        "warfarin" => Some("warfarin: regular INR blood tests"),
        "insulin" => Some("insulin: check blood glucose several times a day"),
        "lithium" => Some("lithium: serum lithium level and kidney function"),
        "digoxin" => Some("digoxin: heart rate, potassium and digoxin level"),
        "apixaban" | "rivaroxaban" | "heparin" => {
            Some("anticoagulant: watch for bleeding; check kidney function")
        }
        _ => None,
    }
}

/// Rule-based analysis of the medications in a query.
pub fn analyze_medications(text: &str, context: &QueryContext) -> MedicationAnalysis {
    let normalized = normalize(text);
    let drugs = resolve_medications(&normalized, context);
    let herbs = resolve_herbs(&normalized, context);

    let mut analysis = MedicationAnalysis {
        medications: drugs.iter().map(|d| d.name.to_string()).collect(),
        high_risk_medications: drugs
            .iter()
            .filter(|d| d.high_risk)
            .map(|d| d.name.to_string())
            .collect(),
        ..MedicationAnalysis::default()
    };

    for (i, x) in drugs.iter().enumerate() {
        for y in &drugs[i + 1..] {
            if let Some(r) = interaction_between(x, y) {
                analysis.interactions.push(DrugInteraction {
                    first: x.name.to_string(),
                    second: y.name.to_string(),
                    severity: r.severity,
                    effect: r.effect.to_string(),
                    management: r.management.to_string(),
                });
            }
        }
    }

    for herb in &herbs {
        for drug in &drugs {
            if herb.interacts_with.iter().any(|c| drug.has_class(*c)) {
                let severity = if herb.safety == HerbSafety::Avoid || drug.high_risk {
                    Major
                } else {
                    InteractionSeverity::Moderate
                };
                analysis.herb_interactions.push(HerbDrugInteraction {
                    herb: herb.name.to_string(),
                    drug: drug.name.to_string(),
                    severity,
                    effect: herb.interaction_effect.to_string(),
                });
            }
        }
    }

    analysis.contraindications = contraindications(&drugs, context);

    if context.age.is_some_and(|a| a > 75) {
        analysis
            .safety_alerts
            .push("age over 75: higher sensitivity to side effects".to_string());
    }
    match context.pregnancy_status {
        Some(PregnancyStatus::Pregnant) => analysis
            .safety_alerts
            .push("pregnancy: confirm every medicine with the prescriber".to_string()),
        Some(PregnancyStatus::Breastfeeding) => analysis
            .safety_alerts
            .push("breastfeeding: some medicines pass into breast milk".to_string()),
        _ => {}
    }
    let severe_organ = [context.kidney_function, context.liver_function]
        .iter()
        .any(|f| *f == Some(OrganFunction::SevereImpairment));
    if severe_organ {
        analysis
            .safety_alerts
            .push("severe organ impairment: doses may need adjustment".to_string());
    }
    let medication_count = context.current_medications.len().max(drugs.len());
    if medication_count >= 5 {
        analysis
            .safety_alerts
            .push(format!("polypharmacy: {medication_count} medications"));
    }
    if !context.allergies.is_empty() {
        analysis.safety_alerts.push(format!(
            "allergies on record: {}",
            context.allergies.join(", ")
        ));
    }

    analysis.monitoring = drugs
        .iter()
        .filter_map(|d| monitoring_for(d))
        .map(str::to_string)
        .collect();
    analysis.monitoring.dedup();

    if medication_count > 5 {
        analysis
            .adherence_advice
            .push("use a weekly pill organizer".to_string());
    }
    if contains_any(&normalized, MISSED_DOSE_TERMS) {
        analysis.adherence_advice.push(
            "for a missed dose, check the leaflet or ask a pharmacist; never take a double dose"
                .to_string(),
        );
    }
    if !analysis.high_risk_medications.is_empty() {
        analysis
            .adherence_advice
            .push("do not stop or change high-risk medicines without the prescriber".to_string());
    }

    let serious_interactions = analysis
        .interactions
        .iter()
        .map(|i| i.severity)
        .chain(analysis.herb_interactions.iter().map(|h| h.severity))
        .filter(|s| s.is_serious())
        .count();
    let contraindicated = analysis
        .contraindications
        .iter()
        .any(|c| c.severity == Contraindicated);

    analysis.requires_pharmacist = !analysis.interactions.is_empty()
        || !analysis.herb_interactions.is_empty()
        || medication_count >= 5;
    analysis.requires_physician = serious_interactions > 0
        || contraindicated
        || (context.pregnancy_status == Some(PregnancyStatus::Pregnant) && !drugs.is_empty());
    analysis.requires_escalation = serious_interactions > 0
        || contraindicated
        || !analysis.high_risk_medications.is_empty();

    let confidence = 0.9
        - 0.1 * serious_interactions as f32
        - 0.05 * analysis.contraindications.len() as f32;
    analysis.confidence = confidence.max(0.5);

    analysis
}

/// Handler for medication questions.
#[derive(Debug, Clone)]
pub struct MedicationHandler {
    generator: Generator,
    capabilities: Vec<Capability>,
}

impl MedicationHandler {
    pub fn new(generator: Generator) -> Self {
        let capabilities = vec![
            Capability::new("drug_interactions", 0.9, 0.8)
                .with_description("Pairwise drug interaction screening")
                .with_specialties(&[
                    "interaction", "warfarin", "aspirin", "ibuprofen", "naproxen", "apixaban",
                    "rivaroxaban", "clopidogrel", "lithium", "digoxin",
                ]),
            Capability::new("dosage_guidance", 0.85, 0.6)
                .with_description("General dosing and timing questions")
                .with_specialties(&["dose", "dosage", "metformin", "insulin", "paracetamol", "amoxicillin"]),
            Capability::new("adherence_support", 0.85, 0.7)
                .with_description("Missed doses, organizers and routines")
                .with_specialties(&["refill", "missed dose", "pill organizer"]),
            Capability::new("herb_drug_interactions", 0.8, 0.8)
                .with_description("Traditional remedies taken with conventional medicines")
                .with_specialties(&["ginger", "turmeric", "ginseng", "licorice", "gừng", "nghệ", "nhân sâm", "cam thảo"]),
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
        let analysis = analyze_medications(&request.text, &request.context);
        let urgency = request.classification.urgency;
        debug!(
            medications = analysis.medications.len(),
            interactions = analysis.interactions.len(),
            escalate = analysis.requires_escalation,
            "MEDICATION_ANALYSIS"
        );

        let findings = analysis.findings();
        let input = format_handler_input(&request.text, &request.context, &findings, request.language());

        match self.generator.generate(MEDICATION_SYSTEM_PROMPT, input).await {
            Ok(generation) => {
                let mut envelope = ResponseEnvelope::new(HandlerKind::Medication, generation.text)
                    .with_confidence(analysis.confidence)
                    .with_urgency(urgency)
                    .with_escalation(analysis.requires_escalation);
                envelope.metadata.model = generation.model;
                envelope.with_details(HandlerDetails::Medication(analysis))
            }
            Err(e) => {
                warn!(error = %e, handler = "medication", "HANDLER_BACKEND_ERROR");
                ResponseEnvelope::new(HandlerKind::Medication, degraded_text(&findings))
                    .with_confidence(DEGRADED_CONFIDENCE)
                    .with_urgency(urgency)
                    .with_escalation(analysis.requires_escalation)
                    .with_details(HandlerDetails::Medication(analysis))
                    .degraded()
            }
        }
    }
}

fn degraded_text(findings: &[String]) -> String {
    let mut text = String::from(
        "We could not generate a full answer right now. Please check with your pharmacist or doctor before changing any medicine.",
    );
    if !findings.is_empty() {
        text.push_str("\n\nThings to review with them:");
        for line in findings {
            text.push_str("\n- ");
            text.push_str(line);
        }
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
    fn test_routine_metformin_question() {
        let a = analyze_medications("when should I take my metformin", &ctx().with_medication("metformin"));
        assert_eq!(a.medications, vec!["metformin"]);
        assert!(a.interactions.is_empty());
        assert!(!a.requires_escalation);
        assert!((a.confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_warfarin_aspirin_uses_specific_rule() {
        let a = analyze_medications("can I take aspirin", &ctx().with_medication("Coumadin 5mg"));
        assert_eq!(a.interactions.len(), 1);
        let i = &a.interactions[0];
        assert_eq!(i.severity, InteractionSeverity::Major);
        assert!(i.effect.contains("greatly"));
        assert!(a.requires_escalation);
        assert!(a.requires_physician);
        assert!(a.monitoring[0].contains("INR"));
    }

    #[test]
    fn test_class_interactions() {
        let a = analyze_medications("lisinopril and potassium chloride", &ctx());
        assert_eq!(a.interactions[0].effect, "risk of high potassium");

        let a = analyze_medications("lithium with ibuprofen", &ctx());
        assert_eq!(a.interactions[0].severity, InteractionSeverity::Major);

        let a = analyze_medications("simvastatin and gemfibrozil", &ctx());
        assert_eq!(a.interactions[0].severity, InteractionSeverity::Contraindicated);
    }

    #[test]
    fn test_high_risk_drug_escalates_without_interaction() {
        let a = analyze_medications("how do I store my insulin", &ctx());
        assert!(a.interactions.is_empty());
        assert_eq!(a.high_risk_medications, vec!["insulin"]);
        assert!(a.requires_escalation);
    }

    #[test]
    fn test_class_allergy() {
        let a = analyze_medications("is amoxicillin ok", &ctx().with_allergy("Penicillin allergy"));
        assert_eq!(a.contraindications.len(), 1);
        assert_eq!(a.contraindications[0].severity, InteractionSeverity::Contraindicated);
        assert!(a.requires_escalation);
    }

    #[test]
    fn test_kidney_and_pregnancy_contraindications() {
        let mut context = ctx().with_medication("metformin").with_medication("lisinopril");
        context.kidney_function = Some(OrganFunction::SevereImpairment);
        context.pregnancy_status = Some(PregnancyStatus::Pregnant);

        let a = analyze_medications("", &context);
        let reasons: Vec<_> = a
            .contraindications
            .iter()
            .map(|c| (c.medication.as_str(), c.severity))
            .collect();
        assert!(reasons.contains(&("metformin", InteractionSeverity::Contraindicated)));
        assert!(reasons.contains(&("lisinopril", InteractionSeverity::Contraindicated)));
        assert!(a.safety_alerts.iter().any(|s| s.contains("severe organ")));
        assert!(a.safety_alerts.iter().any(|s| s.contains("pregnancy")));
    }

    #[test]
    fn test_herb_drug_interaction() {
        let a = analyze_medications("can I drink ginger tea", &ctx().with_medication("warfarin"));
        assert_eq!(a.herb_interactions.len(), 1);
        assert_eq!(a.herb_interactions[0].herb, "gừng");
        assert!(a.requires_pharmacist);
    }

    #[test]
    fn test_polypharmacy_and_adherence() {
        let context = ["metformin", "lisinopril", "atorvastatin", "omeprazole", "amlodipine", "levothyroxine"]
            .into_iter()
            .fold(ctx().with_age(80), |c, m| c.with_medication(m));
        let a = analyze_medications("I forgot my morning pills", &context);
        assert!(a.safety_alerts.iter().any(|s| s.starts_with("polypharmacy")));
        assert!(a.safety_alerts.iter().any(|s| s.starts_with("age over 75")));
        assert!(a.adherence_advice.iter().any(|s| s.contains("pill organizer")));
        assert!(a.adherence_advice.iter().any(|s| s.contains("missed dose")));
    }

    #[test]
    fn test_confidence_floor() {
        let context = ctx()
            .with_medication("warfarin")
            .with_medication("aspirin")
            .with_medication("ibuprofen")
            .with_medication("naproxen")
            .with_medication("clopidogrel")
            .with_allergy("aspirin");
        let a = analyze_medications("", &context);
        assert_eq!(a.confidence, 0.5);
    }

    fn request(text: &str, context: QueryContext) -> HandlerRequest {
        let classification = classify(text, &context);
        HandlerRequest::new(text, context, classification)
    }

    #[tokio::test]
    async fn test_handle_uses_backend() {
        let brain = Arc::new(ScriptedBrain::replying("Take it with breakfast."));
        let handler = MedicationHandler::new(Generator::new(brain.clone(), &HandlerConfig::default()));

        let env = handler
            .handle(&request("when should I take my metformin", ctx().with_medication("metformin")))
            .await;

        assert_eq!(env.text, "Take it with breakfast.");
        assert!(!env.requires_escalation);
        assert!(!env.metadata.degraded);
        assert_eq!(env.medication().unwrap().medications, vec!["metformin"]);

        let sent = brain.requests().await;
        assert!(sent[0].system_prompt.starts_with("You are a medication safety assistant"));
    }

    #[tokio::test]
    async fn test_handle_degrades_on_backend_error() {
        let handler = MedicationHandler::new(Generator::new(
            Arc::new(FailingBrain::new("down")),
            &HandlerConfig::default(),
        ));

        let env = handler
            .handle(&request("can I take aspirin with warfarin", ctx()))
            .await;

        assert!(env.metadata.degraded);
        assert_eq!(env.confidence, DEGRADED_CONFIDENCE);
        assert!(env.requires_escalation);
        assert!(env.text.contains("aspirin + warfarin"));
    }
}
