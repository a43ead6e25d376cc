//! The identifier pattern table.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::error::RedactorError;
use crate::identifier::IdentifierType;

/// Common Vietnamese family names. A name match starting with one of these
/// gets a confidence boost.
pub const VIETNAMESE_SURNAMES: &[&str] = &[
    "Nguyễn", "Trần", "Lê", "Phạm", "Hoàng", "Huỳnh", "Phan", "Vũ", "Võ", "Đặng", "Bùi", "Đỗ",
    "Hồ", "Ngô", "Dương", "Lý",
];

/// Place and street names that look like personal names.
const NAME_EXCLUSIONS: &[&str] = &["Hồ Chí Minh", "Lê Lợi", "Trần Hưng Đạo", "Nguyễn Huệ"];

const MONTHS: &str = "jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";

fn builtin_specs() -> Vec<(IdentifierType, String)> {
    use IdentifierType::*;

    let surnames = VIETNAMESE_SURNAMES.join("|");
    vec![
        (Ssn, r"\b\d{3}-\d{2}-\d{4}\b".into()),
        (Ssn, r"\b\d{3} \d{2} \d{4}\b".into()),
        (Ssn, r"\b\d{9}\b".into()),
        (Phone, r"\b\d{3}-\d{3}-\d{4}\b".into()),
        (Phone, r"\(\d{3}\)\s?\d{3}-\d{4}\b".into()),
        (Phone, r"\b\d{3}\.\d{3}\.\d{4}\b".into()),
        (Phone, r"\+1\s?\d{3}\s?\d{3}\s?\d{4}\b".into()),
        (Phone, r"\+84\s?\d{8,9}\b".into()),
        (Phone, r"\b0\d{9,10}\b".into()),
        (Email, r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}".into()),
        (Date, r"\b\d{1,2}/\d{1,2}/\d{4}\b".into()),
        (Date, r"\b\d{1,2}-\d{1,2}-\d{4}\b".into()),
        (Date, r"\b\d{4}-\d{1,2}-\d{1,2}\b".into()),
        (Date, format!(r"(?i)\b(?:{})\.?\s+\d{{1,2}},?\s+\d{{4}}\b", MONTHS)),
        (Date, r"(?i)\bngày\s+\d{1,2}\s+tháng\s+\d{1,2}\s+năm\s+\d{4}\b".into()),
        (MedicalRecordNumber, r"(?i)\bMRN\s*[:#]?\s*\d+".into()),
        (
            MedicalRecordNumber,
            r"(?i)\bmedical\s+record\s+(?:number|no\.?|#)\s*:?\s*[A-Z0-9-]*\d[A-Z0-9-]*".into(),
        ),
        (MedicalRecordNumber, r"(?i)\bpatient\s+id\s*:?\s*[A-Z0-9-]*\d[A-Z0-9-]*".into()),
        (IpAddress, r"\b(?:\d{1,3}\.){3}\d{1,3}\b".into()),
        (Url, r"https?://\S+".into()),
        (Url, r"\bwww\.\S+".into()),
        (VietnameseId, r"(?i)\bCMND\s*:?\s*\d{9,12}\b".into()),
        (VietnameseId, r"(?i)\bCCCD\s*:?\s*\d{12}\b".into()),
        (VietnameseId, r"\b\d{12}\b".into()),
        (VietnamesePassport, r"(?i)\bhộ\s+chiếu\s*:?\s*[A-Z]\d{7,8}\b".into()),
        (VietnamesePassport, r"\b[A-Z]\d{7,8}\b".into()),
        (VietnameseInsurance, r"(?i)\bBHYT\s*:?\s*[A-Z]{2}\d{13}\b".into()),
        (VietnameseInsurance, r"\b[A-Z]{2}\d{13}\b".into()),
        (Name, format!(r"\b(?:{surnames})(?:\s+\p{{Lu}}\p{{Ll}}*){{1,3}}")),
        (
            Name,
            r"\b(?:Mr|Mrs|Ms|Miss|Dr|Ông|Bà|Anh|Chị)\.?(?:\s+\p{Lu}\p{Ll}+){1,3}"
                .into(),
        ),
    ]
}

static BUILTIN: LazyLock<Arc<PatternTable>> = LazyLock::new(|| {
    let table = PatternTable::from_specs(builtin_specs())
        .expect("builtin PHI patterns must compile")
        .with_surnames(VIETNAMESE_SURNAMES.iter().copied())
        .with_name_exclusions(NAME_EXCLUSIONS.iter().copied());
    Arc::new(table)
});

/// A compiled pattern tagged with the identifier type it detects.
#[derive(Debug, Clone)]
pub(crate) struct PatternEntry {
    pub(crate) kind: IdentifierType,
    pub(crate) regex: Regex,
}

/// An immutable table of identifier patterns.
///
/// Entry order matters: when two candidate matches start at the same offset
/// and have the same length, the earlier entry wins.
#[derive(Debug, Clone, Default)]
pub struct PatternTable {
    entries: Vec<PatternEntry>,
    surnames: Vec<String>,
    name_exclusions: Vec<String>,
}

impl PatternTable {
    /// The built-in table (US and Vietnamese formats), shared process-wide.
    pub fn builtin() -> Arc<PatternTable> {
        Arc::clone(&BUILTIN)
    }

    /// Compile a table from `(type, pattern)` pairs.
    pub fn from_specs<I, S>(specs: I) -> Result<Self, RedactorError>
    where
        I: IntoIterator<Item = (IdentifierType, S)>,
        S: AsRef<str>,
    {
        let entries = specs
            .into_iter()
            .map(|(kind, pattern)| {
                Regex::new(pattern.as_ref())
                    .map(|regex| PatternEntry { kind, regex })
                    .map_err(|source| RedactorError::InvalidPattern { kind, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            entries,
            surnames: Vec::new(),
            name_exclusions: Vec::new(),
        })
    }

    /// Surnames that raise name confidence.
    pub fn with_surnames<I, S>(mut self, surnames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.surnames = surnames.into_iter().map(Into::into).collect();
        self
    }

    /// Name-shaped phrases that are never treated as names.
    pub fn with_name_exclusions<I, S>(mut self, exclusions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.name_exclusions = exclusions.into_iter().map(Into::into).collect();
        self
    }

    /// Number of compiled patterns.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries(&self) -> &[PatternEntry] {
        &self.entries
    }

    pub(crate) fn starts_with_surname(&self, value: &str) -> bool {
        self.surnames.iter().any(|s| value.starts_with(s.as_str()))
    }

    pub(crate) fn is_excluded_name(&self, value: &str) -> bool {
        self.name_exclusions.iter().any(|e| value.starts_with(e.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_compiles_every_type() {
        let table = PatternTable::builtin();
        assert!(!table.is_empty());

        for kind in [
            IdentifierType::Ssn,
            IdentifierType::Phone,
            IdentifierType::Email,
            IdentifierType::Date,
            IdentifierType::MedicalRecordNumber,
            IdentifierType::IpAddress,
            IdentifierType::Url,
            IdentifierType::VietnameseId,
            IdentifierType::VietnamesePassport,
            IdentifierType::VietnameseInsurance,
            IdentifierType::Name,
        ] {
            assert!(
                table.entries().iter().any(|e| e.kind == kind),
                "no pattern for {kind}"
            );
        }
    }

    #[test]
    fn test_builtin_is_shared() {
        let a = PatternTable::builtin();
        let b = PatternTable::builtin();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_invalid_pattern_reports_type() {
        let err = PatternTable::from_specs([(IdentifierType::Email, "([unclosed")]).unwrap_err();
        assert!(matches!(
            err,
            RedactorError::InvalidPattern { kind: IdentifierType::Email, .. }
        ));
        assert!(err.to_string().starts_with("invalid email pattern"));
    }

    #[test]
    fn test_surname_lookup() {
        let table = PatternTable::builtin();
        assert!(table.starts_with_surname("Trần Thị Mai"));
        assert!(!table.starts_with_surname("Smith"));
        assert!(table.is_excluded_name("Hồ Chí Minh City"));
    }
}
