//! Medical entity extraction.

use serde::{Deserialize, Serialize};

use crate::keywords::{matched_terms, normalize, CHRONIC_HIGH_RISK, SYMPTOM_TERMS};
use crate::lexicon::find_drugs;

/// Extra condition vocabulary beyond the chronic high-risk table.
const CONDITION_TERMS: &[&str] = &[
    "asthma",
    "pregnant",
    "pregnancy",
    "kidney failure",
    "liver disease",
    "cirrhosis",
    "atrial fibrillation",
    "arthritis",
    "depression",
    "hen suyễn",
    "mang thai",
    "bệnh gan",
];

/// Symptoms, medications and conditions named in a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MedicalEntities {
    pub symptoms: Vec<String>,
    pub medications: Vec<String>,
    pub conditions: Vec<String>,
}

impl MedicalEntities {
    pub fn is_empty(&self) -> bool {
        self.symptoms.is_empty() && self.medications.is_empty() && self.conditions.is_empty()
    }

    /// Every extracted entity, symptoms first.
    pub fn all(&self) -> impl Iterator<Item = &str> {
        self.symptoms
            .iter()
            .chain(&self.medications)
            .chain(&self.conditions)
            .map(String::as_str)
    }
}

/// Extract entities by lexical lookup.
///
/// Multi-word symptoms shadow the shorter terms they contain, so
/// "severe headache" does not also yield "headache".
pub fn extract_entities(text: &str) -> MedicalEntities {
    let normalized = normalize(text);

    let found = matched_terms(&normalized, SYMPTOM_TERMS);
    let symptoms = found
        .iter()
        .filter(|term| {
            !found
                .iter()
                .any(|other| other.len() > term.len() && other.contains(**term))
        })
        .map(|s| s.to_string())
        .collect();

    let medications = find_drugs(&normalized)
        .into_iter()
        .map(|d| d.name.to_string())
        .collect();

    let conditions = matched_terms(&normalized, CHRONIC_HIGH_RISK)
        .into_iter()
        .chain(matched_terms(&normalized, CONDITION_TERMS))
        .map(str::to_string)
        .collect();

    MedicalEntities {
        symptoms,
        medications,
        conditions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_english() {
        let e = extract_entities("I have a severe headache and nausea, I take Coumadin for atrial fibrillation");
        assert_eq!(e.symptoms, vec!["severe headache", "nausea"]);
        assert_eq!(e.medications, vec!["warfarin"]);
        assert_eq!(e.conditions, vec!["atrial fibrillation"]);
    }

    #[test]
    fn test_extract_vietnamese() {
        let e = extract_entities("Tôi bị sốt cao và ho, có tiểu đường");
        assert!(e.symptoms.contains(&"sốt cao".to_string()));
        assert!(e.symptoms.contains(&"ho".to_string()));
        assert!(!e.symptoms.contains(&"sốt".to_string()));
        assert_eq!(e.conditions, vec!["tiểu đường"]);
    }

    #[test]
    fn test_extract_nothing() {
        let e = extract_entities("hello there");
        assert!(e.is_empty());
        assert_eq!(e.all().count(), 0);
    }
}
