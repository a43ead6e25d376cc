//! Vital-sign bands.

use serde::{Deserialize, Serialize};

use crate::query::Vitals;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalSeverity {
    Abnormal,
    Critical,
    /// Below the hard floor that saturates urgency on its own.
    LifeThreatening,
}

/// One vital sign outside its normal band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalFinding {
    pub vital: String,
    pub value: f32,
    pub severity: VitalSeverity,
    pub description: String,
}

impl VitalFinding {
    fn new(vital: &str, value: f32, severity: VitalSeverity, description: &str) -> Self {
        Self {
            vital: vital.to_string(),
            value,
            severity,
            description: format!("{description} ({vital} {value})"),
        }
    }

    pub fn is_critical(&self) -> bool {
        self.severity >= VitalSeverity::Critical
    }
}

/// Oxygen saturation below this saturates urgency.
pub const SPO2_LIFE_THREATENING: f32 = 85.0;

/// Findings for every vital outside its normal band, most severe first.
pub fn assess_vitals(vitals: &Vitals) -> Vec<VitalFinding> {
    use VitalSeverity::*;

    let mut findings = Vec::new();

    if let Some(hr) = vitals.heart_rate.filter(|v| v.is_finite()) {
        if !(40.0..=150.0).contains(&hr) {
            findings.push(VitalFinding::new("heart_rate", hr, Critical, "critical heart rate"));
        } else if !(50.0..=120.0).contains(&hr) {
            findings.push(VitalFinding::new("heart_rate", hr, Abnormal, "abnormal heart rate"));
        }
    }

    if let Some(t) = vitals.temperature_c.filter(|v| v.is_finite()) {
        if !(35.0..=40.0).contains(&t) {
            findings.push(VitalFinding::new("temperature_c", t, Critical, "critical temperature"));
        } else if !(36.0..=38.5).contains(&t) {
            findings.push(VitalFinding::new("temperature_c", t, Abnormal, "abnormal temperature"));
        }
    }

    if let Some(spo2) = vitals.oxygen_saturation.filter(|v| v.is_finite()) {
        if spo2 < SPO2_LIFE_THREATENING {
            findings.push(VitalFinding::new(
                "oxygen_saturation",
                spo2,
                LifeThreatening,
                "life-threatening oxygen saturation",
            ));
        } else if spo2 < 90.0 {
            findings.push(VitalFinding::new("oxygen_saturation", spo2, Critical, "critical oxygen saturation"));
        } else if spo2 < 95.0 {
            findings.push(VitalFinding::new("oxygen_saturation", spo2, Abnormal, "low oxygen saturation"));
        }
    }

    if let Some(rr) = vitals.respiratory_rate.filter(|v| v.is_finite()) {
        if !(8.0..=30.0).contains(&rr) {
            findings.push(VitalFinding::new("respiratory_rate", rr, Critical, "critical respiratory rate"));
        }
    }

    let systolic = vitals.systolic_bp.filter(|v| v.is_finite());
    let diastolic = vitals.diastolic_bp.filter(|v| v.is_finite());
    if systolic.is_some_and(|s| s >= 180.0) || diastolic.is_some_and(|d| d >= 120.0) {
        let value = systolic.or(diastolic).unwrap_or_default();
        findings.push(VitalFinding::new("blood_pressure", value, Abnormal, "severely elevated blood pressure"));
    }

    findings.sort_by(|a, b| b.severity.cmp(&a.severity));
    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vitals() -> Vitals {
        Vitals::default()
    }

    #[test]
    fn test_normal_vitals_have_no_findings() {
        let v = Vitals {
            heart_rate: Some(72.0),
            temperature_c: Some(36.8),
            oxygen_saturation: Some(98.0),
            respiratory_rate: Some(14.0),
            systolic_bp: Some(120.0),
            diastolic_bp: Some(80.0),
        };
        assert!(assess_vitals(&v).is_empty());
        assert!(assess_vitals(&vitals()).is_empty());
    }

    #[test]
    fn test_heart_rate_bands() {
        let critical = assess_vitals(&Vitals { heart_rate: Some(160.0), ..vitals() });
        assert_eq!(critical[0].severity, VitalSeverity::Critical);

        let abnormal = assess_vitals(&Vitals { heart_rate: Some(130.0), ..vitals() });
        assert_eq!(abnormal[0].severity, VitalSeverity::Abnormal);
    }

    #[test]
    fn test_spo2_floor() {
        let f = assess_vitals(&Vitals { oxygen_saturation: Some(82.0), ..vitals() });
        assert_eq!(f[0].severity, VitalSeverity::LifeThreatening);
        assert!(f[0].is_critical());

        let f = assess_vitals(&Vitals { oxygen_saturation: Some(88.0), ..vitals() });
        assert_eq!(f[0].severity, VitalSeverity::Critical);
    }

    #[test]
    fn test_sorted_most_severe_first() {
        let f = assess_vitals(&Vitals {
            temperature_c: Some(38.9),
            respiratory_rate: Some(34.0),
            ..vitals()
        });
        assert_eq!(f.len(), 2);
        assert_eq!(f[0].vital, "respiratory_rate");
    }

    #[test]
    fn test_finding_deserializes() {
        let f = assess_vitals(&Vitals { heart_rate: Some(160.0), ..vitals() });
        let json = serde_json::to_string(&f[0]).unwrap();
        let back: VitalFinding = serde_json::from_str(&json).unwrap();
        assert_eq!(back, f[0]);
        assert_eq!(back.vital, "heart_rate");
    }

    #[test]
    fn test_nan_ignored() {
        assert!(assess_vitals(&Vitals { heart_rate: Some(f32::NAN), ..vitals() }).is_empty());
    }
}
