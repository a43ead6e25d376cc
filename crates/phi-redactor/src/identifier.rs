//! Identifier and result types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kinds of sensitive identifier the redactor knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierType {
    Ssn,
    Phone,
    Email,
    Date,
    MedicalRecordNumber,
    IpAddress,
    Url,
    /// CMND (9 digits) or CCCD (12 digits).
    VietnameseId,
    VietnamesePassport,
    /// BHYT health-insurance card number.
    VietnameseInsurance,
    Name,
}

impl IdentifierType {
    /// Confidence assigned to a raw pattern hit before locale adjustments.
    pub fn base_confidence(self) -> f64 {
        match self {
            IdentifierType::Ssn => 0.95,
            IdentifierType::Email => 0.9,
            IdentifierType::MedicalRecordNumber => 0.9,
            IdentifierType::VietnameseId => 0.9,
            IdentifierType::VietnameseInsurance => 0.9,
            IdentifierType::Phone => 0.85,
            IdentifierType::VietnamesePassport => 0.85,
            IdentifierType::IpAddress => 0.8,
            IdentifierType::Name => 0.75,
            IdentifierType::Date => 0.7,
            IdentifierType::Url => 0.6,
        }
    }

    /// Types whose exposure alone identifies a patient.
    pub fn is_high_risk(self) -> bool {
        matches!(
            self,
            IdentifierType::Ssn
                | IdentifierType::MedicalRecordNumber
                | IdentifierType::VietnameseId
                | IdentifierType::VietnameseInsurance
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IdentifierType::Ssn => "ssn",
            IdentifierType::Phone => "phone",
            IdentifierType::Email => "email",
            IdentifierType::Date => "date",
            IdentifierType::MedicalRecordNumber => "medical_record_number",
            IdentifierType::IpAddress => "ip_address",
            IdentifierType::Url => "url",
            IdentifierType::VietnameseId => "vietnamese_id",
            IdentifierType::VietnamesePassport => "vietnamese_passport",
            IdentifierType::VietnameseInsurance => "vietnamese_insurance",
            IdentifierType::Name => "name",
        }
    }
}

impl fmt::Display for IdentifierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Byte range of an identifier in the original text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether two spans share at least one byte.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// One detected identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identifier {
    #[serde(rename = "type")]
    pub kind: IdentifierType,
    /// The matched text. Never serialized, so results can be logged safely.
    #[serde(skip_serializing, default)]
    pub value: String,
    pub span: Span,
    pub confidence: f64,
    pub masked_value: String,
}

/// Overall exposure level of a piece of text.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl RiskTier {
    /// Tier for a set of detected identifiers.
    ///
    /// `critical` with three or more high-risk identifiers, `high` with any
    /// high-risk identifier or five or more in total, `medium` with two or
    /// more, otherwise `low`.
    pub fn assess(identifiers: &[Identifier]) -> Self {
        let high_risk = identifiers.iter().filter(|i| i.kind.is_high_risk()).count();
        let total = identifiers.len();

        if high_risk >= 3 {
            RiskTier::Critical
        } else if high_risk > 0 || total >= 5 {
            RiskTier::High
        } else if total >= 2 {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskTier::Low => "low",
            RiskTier::Medium => "medium",
            RiskTier::High => "high",
            RiskTier::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of scanning one piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedactionResult {
    /// Input text. Never serialized.
    #[serde(skip_serializing, default)]
    pub original_text: String,
    pub redacted_text: String,
    /// Identifiers in ascending span order; spans never overlap.
    pub identifiers: Vec<Identifier>,
    /// Mean identifier confidence, 1.0 when nothing was found.
    pub confidence: f64,
    pub risk_tier: RiskTier,
}

impl RedactionResult {
    /// Whether any identifier was found.
    pub fn has_phi(&self) -> bool {
        !self.identifiers.is_empty()
    }

    /// Distinct identifier types, sorted.
    pub fn identifier_types(&self) -> Vec<IdentifierType> {
        let mut types: Vec<_> = self.identifiers.iter().map(|i| i.kind).collect();
        types.sort();
        types.dedup();
        types
    }

    /// Number of identifiers of a given type.
    pub fn count(&self, kind: IdentifierType) -> usize {
        self.identifiers.iter().filter(|i| i.kind == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(kind: IdentifierType) -> Identifier {
        Identifier {
            kind,
            value: String::new(),
            span: Span { start: 0, end: 1 },
            confidence: kind.base_confidence(),
            masked_value: String::new(),
        }
    }

    #[test]
    fn test_risk_tier_thresholds() {
        use IdentifierType::*;

        assert_eq!(RiskTier::assess(&[]), RiskTier::Low);
        assert_eq!(RiskTier::assess(&[ident(Email)]), RiskTier::Low);
        assert_eq!(RiskTier::assess(&[ident(Email), ident(Phone)]), RiskTier::Medium);
        assert_eq!(RiskTier::assess(&[ident(Ssn)]), RiskTier::High);
        assert_eq!(
            RiskTier::assess(&[ident(Email), ident(Phone), ident(Date), ident(Url), ident(Name)]),
            RiskTier::High
        );
        assert_eq!(
            RiskTier::assess(&[ident(Ssn), ident(VietnameseId), ident(MedicalRecordNumber)]),
            RiskTier::Critical
        );
    }

    #[test]
    fn test_adding_high_risk_never_lowers_tier() {
        use IdentifierType::*;

        let all = [
            Ssn, Phone, Email, Date, MedicalRecordNumber, IpAddress, Url, VietnameseId,
            VietnamesePassport, VietnameseInsurance, Name,
        ];
        let high_risk: Vec<_> = all.iter().copied().filter(|k| k.is_high_risk()).collect();

        for a in all {
            for b in all {
                let before = RiskTier::assess(&[ident(a), ident(b)]);
                for h in &high_risk {
                    let after = RiskTier::assess(&[ident(a), ident(b), ident(*h)]);
                    assert!(after >= before, "{a}+{b}+{h}: {after} < {before}");
                }
            }
        }
    }

    #[test]
    fn test_span_overlap() {
        let a = Span { start: 0, end: 5 };
        assert!(a.overlaps(&Span { start: 4, end: 8 }));
        assert!(!a.overlaps(&Span { start: 5, end: 8 }));
        assert_eq!(a.len(), 5);
    }

    #[test]
    fn test_identifier_value_not_serialized() {
        let mut id = ident(IdentifierType::Ssn);
        id.value = "123-45-6789".to_string();
        let json = serde_json::to_string(&id).unwrap();

        assert!(!json.contains("123-45-6789"));
        assert!(json.contains("\"type\":\"ssn\""));
    }
}
