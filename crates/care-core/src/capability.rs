use serde::Serialize;

use crate::keywords::{contains_term, normalize};
use crate::language::Language;

/// What a handler declares it can process.
///
/// `max_severity` is on the same `[0.0, 1.0]` scale as query urgency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Capability {
    pub name: &'static str,
    pub description: &'static str,
    /// Baseline confidence for responses under this capability.
    pub confidence: f32,
    pub languages: Vec<Language>,
    pub specialties: &'static [&'static str],
    pub max_severity: f32,
}

impl Capability {
    pub fn new(name: &'static str, confidence: f32, max_severity: f32) -> Self {
        Self {
            name,
            description: "",
            confidence: confidence.clamp(0.0, 1.0),
            languages: vec![Language::English, Language::Vietnamese],
            specialties: &[],
            max_severity: max_severity.clamp(0.0, 1.0),
        }
    }

    pub fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn with_languages(mut self, languages: Vec<Language>) -> Self {
        self.languages = languages;
        self
    }

    pub fn with_specialties(mut self, specialties: &'static [&'static str]) -> Self {
        self.specialties = specialties;
        self
    }

    pub fn supports_language(&self, language: &Language) -> bool {
        self.languages.contains(language)
    }

    pub fn can_handle_severity(&self, urgency: f32) -> bool {
        urgency <= self.max_severity
    }

    /// Whether `term` and a specialty tag contain one another as whole words.
    pub fn covers(&self, term: &str) -> bool {
        let term = normalize(term);
        self.specialties
            .iter()
            .any(|s| contains_term(&term, s) || contains_term(s, &term))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_builders() {
        let cap = Capability::new("drug_interactions", 0.9, 0.8)
            .with_specialties(&["warfarin", "interaction"]);
        assert!(cap.supports_language(&Language::Vietnamese));
        assert!(!cap.supports_language(&Language::Other("fr".into())));
        assert!(cap.can_handle_severity(0.8));
        assert!(!cap.can_handle_severity(0.81));
        assert!(cap.covers("Warfarin"));
        assert!(!cap.covers("headache"));
        assert!(!cap.covers("war"));
    }

    #[test]
    fn test_values_clamped() {
        let cap = Capability::new("x", 1.4, 7.0);
        assert_eq!(cap.confidence, 1.0);
        assert_eq!(cap.max_severity, 1.0);
    }

    #[test]
    fn test_english_only() {
        let cap = Capability::new("x", 0.5, 0.5).with_languages(vec![Language::English]);
        assert!(!cap.supports_language(&Language::Vietnamese));
    }
}
