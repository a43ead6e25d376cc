//! What the caller submits.

use serde::{Deserialize, Serialize};

use crate::entities::MedicalEntities;
use crate::keywords::{contains_term, normalize};
use crate::language::Language;

/// A single submitted query. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    pub session_id: String,
    #[serde(default)]
    pub context: QueryContext,
}

impl Query {
    pub fn new(session_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            session_id: session_id.into(),
            context: QueryContext::default(),
        }
    }

    pub fn with_context(mut self, context: QueryContext) -> Self {
        self.context = context;
        self
    }
}

/// Structured patient context supplied alongside the text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryContext {
    pub age: Option<u32>,
    pub conditions: Vec<String>,
    pub current_medications: Vec<String>,
    pub allergies: Vec<String>,
    pub symptoms: Vec<String>,
    pub vitals: Option<Vitals>,
    pub pregnancy_status: Option<PregnancyStatus>,
    pub kidney_function: Option<OrganFunction>,
    pub liver_function: Option<OrganFunction>,
    /// Patient-reported severity on a 0-10 scale.
    pub self_reported_severity: Option<u8>,
    pub language_preference: Option<String>,
    pub cultural_preference: Option<String>,
}

impl QueryContext {
    pub fn with_age(mut self, age: u32) -> Self {
        self.age = Some(age);
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.conditions.push(condition.into());
        self
    }

    pub fn with_medication(mut self, medication: impl Into<String>) -> Self {
        self.current_medications.push(medication.into());
        self
    }

    pub fn with_allergy(mut self, allergy: impl Into<String>) -> Self {
        self.allergies.push(allergy.into());
        self
    }

    pub fn with_vitals(mut self, vitals: Vitals) -> Self {
        self.vitals = Some(vitals);
        self
    }

    pub fn with_language_preference(mut self, language: impl Into<String>) -> Self {
        self.language_preference = Some(language.into());
        self
    }

    pub fn with_self_reported_severity(mut self, severity: u8) -> Self {
        self.self_reported_severity = Some(severity);
        self
    }

    /// Whether any listed condition contains `term` as a whole word.
    pub fn has_condition(&self, term: &str) -> bool {
        let term = normalize(term);
        self.conditions
            .iter()
            .any(|c| contains_term(&normalize(c), &term))
    }

    /// Whether any listed medication contains `name` as a whole word.
    pub fn takes_medication(&self, name: &str) -> bool {
        let name = normalize(name);
        self.current_medications
            .iter()
            .any(|m| contains_term(&normalize(m), &name))
    }

    /// Parsed language preference, if one was given.
    pub fn preferred_language(&self) -> Option<Language> {
        self.language_preference.as_deref().map(Language::from_preference)
    }

    /// Copy of this context with extracted entities added.
    ///
    /// Only appends: existing entries are kept and duplicates skipped.
    pub fn merged(&self, entities: &MedicalEntities) -> Self {
        let mut out = self.clone();
        merge_into(&mut out.symptoms, &entities.symptoms);
        merge_into(&mut out.current_medications, &entities.medications);
        merge_into(&mut out.conditions, &entities.conditions);
        out
    }
}

fn merge_into(target: &mut Vec<String>, extra: &[String]) {
    for item in extra {
        let needle = normalize(item);
        if !target.iter().any(|t| normalize(t) == needle) {
            target.push(item.clone());
        }
    }
}

/// Vital signs. Temperatures are in Celsius.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vitals {
    pub heart_rate: Option<f32>,
    pub temperature_c: Option<f32>,
    pub oxygen_saturation: Option<f32>,
    pub respiratory_rate: Option<f32>,
    pub systolic_bp: Option<f32>,
    pub diastolic_bp: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PregnancyStatus {
    NotPregnant,
    Pregnant,
    Breastfeeding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganFunction {
    Normal,
    MildImpairment,
    ModerateImpairment,
    SevereImpairment,
}

impl OrganFunction {
    pub fn is_impaired(self) -> bool {
        self >= OrganFunction::ModerateImpairment
    }
}
