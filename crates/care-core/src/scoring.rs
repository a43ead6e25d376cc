//! Additive urgency scoring.
//!
//! Each signal source contributes a fixed weight; within a source the largest
//! contribution wins. The total is clamped to `[0.0, 1.0]`. Only a
//! life-threatening vital sign can saturate the score on its own.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::keywords::{
    critical_categories, matched_terms, normalize, CHRONIC_HIGH_RISK, GENERAL_EMERGENCY_CATEGORY,
    INTENSITY_WORDS,
};
use crate::query::QueryContext;
use crate::vitals::{assess_vitals, VitalFinding, VitalSeverity};

pub const KEYWORD_WEIGHT: f32 = 0.35;
pub const KEYWORD_CAP: f32 = 0.7;
pub const CRITICAL_VITAL_WEIGHT: f32 = 0.5;
pub const ABNORMAL_VITAL_WEIGHT: f32 = 0.2;
pub const HIGH_SELF_REPORTED_WEIGHT: f32 = 0.2;
pub const INTENSITY_WEIGHT: f32 = 0.15;
pub const CHRONIC_WEIGHT: f32 = 0.2;

/// Self-reported severity at or above this (out of 10) counts as high.
pub const HIGH_SELF_REPORTED_SEVERITY: u8 = 8;

static SEVERITY_SCALE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(10|[0-9])\s*(?:/|out of|trên)\s*10\b").expect("severity scale regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalSource {
    CriticalKeyword,
    VitalSign,
    SelfReportedSeverity,
    ChronicCondition,
}

/// One contribution to the urgency score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub source: SignalSource,
    pub label: String,
    pub weight: f32,
}

impl Signal {
    fn new(source: SignalSource, label: impl Into<String>, weight: f32) -> Self {
        Self {
            source,
            label: label.into(),
            weight,
        }
    }
}

/// Result of [`score`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UrgencyScore {
    /// Clamped to `[0.0, 1.0]`.
    pub urgency: f32,
    pub signals: Vec<Signal>,
    /// Critical keyword categories found in the text.
    pub critical_categories: Vec<String>,
    pub vital_findings: Vec<VitalFinding>,
    /// Set when a vital sign is below the hard floor.
    pub life_threatening: bool,
}

impl UrgencyScore {
    /// Human-readable signal labels.
    pub fn labels(&self) -> Vec<String> {
        self.signals.iter().map(|s| s.label.clone()).collect()
    }

    /// Whether a critical keyword outside the general category matched.
    pub fn has_specific_critical_keyword(&self) -> bool {
        self.critical_categories
            .iter()
            .any(|c| c != GENERAL_EMERGENCY_CATEGORY)
    }

    pub fn has_critical_vital(&self) -> bool {
        self.vital_findings.iter().any(VitalFinding::is_critical)
    }

    /// The single largest contribution.
    pub fn strongest_signal(&self) -> Option<&Signal> {
        self.signals
            .iter()
            .max_by(|a, b| a.weight.total_cmp(&b.weight))
    }
}

/// Score free text plus structured context.
///
/// Empty or meaningless input scores zero with no signals.
pub fn score(text: &str, context: &QueryContext) -> UrgencyScore {
    let normalized = normalize(text);
    let mut result = UrgencyScore::default();
    let mut total = 0.0f32;

    // Critical keywords
    let categories = critical_categories(&normalized);
    let mut keyword_total = 0.0f32;
    for (category, term) in &categories {
        keyword_total += KEYWORD_WEIGHT;
        result.signals.push(Signal::new(
            SignalSource::CriticalKeyword,
            format!("critical_keyword:{category} ({term})"),
            KEYWORD_WEIGHT,
        ));
        result.critical_categories.push((*category).to_string());
    }
    total += keyword_total.min(KEYWORD_CAP);

    // Vitals
    if let Some(vitals) = &context.vitals {
        let findings = assess_vitals(vitals);
        let mut vital_max = 0.0f32;
        for finding in &findings {
            let weight = match finding.severity {
                VitalSeverity::LifeThreatening | VitalSeverity::Critical => CRITICAL_VITAL_WEIGHT,
                VitalSeverity::Abnormal => ABNORMAL_VITAL_WEIGHT,
            };
            if finding.severity == VitalSeverity::LifeThreatening {
                result.life_threatening = true;
            }
            vital_max = vital_max.max(weight);
            result.signals.push(Signal::new(
                SignalSource::VitalSign,
                finding.description.clone(),
                weight,
            ));
        }
        total += vital_max;
        result.vital_findings = findings;
    }

    // Self-reported severity and intensity language
    let mut severity_max = 0.0f32;
    let reported = context
        .self_reported_severity
        .or_else(|| reported_severity_in_text(&normalized));
    if let Some(level) = reported.filter(|l| *l >= HIGH_SELF_REPORTED_SEVERITY) {
        severity_max = HIGH_SELF_REPORTED_WEIGHT;
        result.signals.push(Signal::new(
            SignalSource::SelfReportedSeverity,
            format!("self_reported_severity:{level}/10"),
            HIGH_SELF_REPORTED_WEIGHT,
        ));
    }
    if let Some(word) = matched_terms(&normalized, INTENSITY_WORDS).first() {
        severity_max = severity_max.max(INTENSITY_WEIGHT);
        result.signals.push(Signal::new(
            SignalSource::SelfReportedSeverity,
            format!("intensity:{word}"),
            INTENSITY_WEIGHT,
        ));
    }
    total += severity_max;

    // Chronic conditions
    let chronic = context
        .conditions
        .iter()
        .find_map(|c| matched_terms(&normalize(c), CHRONIC_HIGH_RISK).first().copied())
        .or_else(|| matched_terms(&normalized, CHRONIC_HIGH_RISK).first().copied());
    if let Some(condition) = chronic {
        total += CHRONIC_WEIGHT;
        result.signals.push(Signal::new(
            SignalSource::ChronicCondition,
            format!("chronic_condition:{condition}"),
            CHRONIC_WEIGHT,
        ));
    }

    result.urgency = if result.life_threatening {
        1.0
    } else {
        total.clamp(0.0, 1.0)
    };
    result
}

fn reported_severity_in_text(normalized: &str) -> Option<u8> {
    SEVERITY_SCALE
        .captures_iter(normalized)
        .filter_map(|c| c.get(1)?.as_str().parse::<u8>().ok())
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Vitals;

    fn ctx() -> QueryContext {
        QueryContext::default()
    }

    #[test]
    fn test_chest_pain_and_breathing() {
        let s = score("severe chest pain, can't breathe", &ctx());
        assert!(s.urgency >= 0.8, "urgency {}", s.urgency);
        assert!(s.urgency < 1.0);
        assert_eq!(s.critical_categories, vec!["cardiac", "respiratory"]);
        assert!(s.has_specific_critical_keyword());
    }

    #[test]
    fn test_routine_medication_question_is_low() {
        let context = ctx().with_medication("metformin");
        let s = score("when should I take my metformin", &context);
        assert!(s.urgency < 0.4);
        assert!(s.signals.is_empty());
    }

    #[test]
    fn test_keyword_cap() {
        let s = score(
            "chest pain, can't breathe, seizure, overdose, anaphylaxis",
            &ctx(),
        );
        let keyword_sum: f32 = s
            .signals
            .iter()
            .filter(|x| x.source == SignalSource::CriticalKeyword)
            .map(|x| x.weight)
            .sum();
        assert!(keyword_sum > KEYWORD_CAP);
        assert!((s.urgency - KEYWORD_CAP).abs() < 1e-6);
    }

    #[test]
    fn test_single_keyword_does_not_saturate() {
        let s = score("emergency", &ctx());
        assert!(s.urgency < 1.0);
        assert!(!s.has_specific_critical_keyword());
    }

    #[test]
    fn test_life_threatening_spo2_saturates() {
        let context = ctx().with_vitals(Vitals {
            oxygen_saturation: Some(80.0),
            ..Vitals::default()
        });
        let s = score("feeling tired", &context);
        assert_eq!(s.urgency, 1.0);
        assert!(s.life_threatening);
        assert!(s.has_critical_vital());
    }

    #[test]
    fn test_vitals_take_maximum() {
        let context = ctx().with_vitals(Vitals {
            heart_rate: Some(160.0),
            temperature_c: Some(40.5),
            oxygen_saturation: Some(93.0),
            ..Vitals::default()
        });
        let s = score("", &context);
        assert!((s.urgency - CRITICAL_VITAL_WEIGHT).abs() < 1e-6);
        assert_eq!(s.vital_findings.len(), 3);
    }

    #[test]
    fn test_self_reported_severity() {
        let s = score("my pain is 9/10", &ctx());
        assert!((s.urgency - HIGH_SELF_REPORTED_WEIGHT).abs() < 1e-6);

        let s = score("it hurts", &ctx().with_self_reported_severity(8));
        assert!((s.urgency - HIGH_SELF_REPORTED_WEIGHT).abs() < 1e-6);

        let s = score("pain is 3 out of 10", &ctx());
        assert_eq!(s.urgency, 0.0);
    }

    #[test]
    fn test_severity_source_takes_max() {
        let s = score("severe pain, 10/10", &ctx());
        assert!((s.urgency - HIGH_SELF_REPORTED_WEIGHT).abs() < 1e-6);
        assert_eq!(s.signals.len(), 2);
    }

    #[test]
    fn test_chronic_condition_from_context_or_text() {
        let s = score("question", &ctx().with_condition("Type 2 diabetes"));
        assert!((s.urgency - CHRONIC_WEIGHT).abs() < 1e-6);

        let s = score("tôi bị tiểu đường", &ctx());
        assert!((s.urgency - CHRONIC_WEIGHT).abs() < 1e-6);
    }

    #[test]
    fn test_vietnamese_keywords() {
        let s = score("đau ngực dữ dội, khó thở", &ctx());
        assert!(s.urgency >= 0.8);
    }

    #[test]
    fn test_clamped_with_everything() {
        let context = ctx()
            .with_condition("heart failure")
            .with_self_reported_severity(10)
            .with_vitals(Vitals {
                heart_rate: Some(170.0),
                ..Vitals::default()
            });
        let s = score("severe chest pain, can't breathe, stroke", &context);
        assert!(s.urgency <= 1.0 && s.urgency >= 0.0);
        assert_eq!(s.urgency, 1.0);
    }

    #[test]
    fn test_garbage_input() {
        let s = score("\u{0}\u{fffd}\u{1b}[31m", &ctx());
        assert_eq!(s.urgency, 0.0);
        assert!(s.signals.is_empty());
    }

    #[test]
    fn test_strongest_signal() {
        let s = score("severe chest pain", &ctx());
        assert_eq!(
            s.strongest_signal().map(|x| x.source),
            Some(SignalSource::CriticalKeyword)
        );
    }
}
