//! The detection and masking engine.

use std::borrow::Cow;
use std::sync::Arc;

use tracing::debug;

use crate::identifier::{Identifier, IdentifierType, RedactionResult, RiskTier, Span};
use crate::mask::{is_vietnamese_phone, mask};
use crate::patterns::PatternTable;

/// Confidence added to locale-formatted phone numbers.
const LOCALE_PHONE_BOOST: f64 = 0.1;
/// Confidence added to names that start with a known surname.
const SURNAME_BOOST: f64 = 0.15;

/// Detects and masks sensitive identifiers.
///
/// Stateless apart from its immutable pattern table; cheap to clone and safe
/// to share across tasks.
#[derive(Debug, Clone)]
pub struct Redactor {
    table: Arc<PatternTable>,
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new()
    }
}

struct Candidate {
    kind: IdentifierType,
    span: Span,
    order: usize,
}

impl Redactor {
    /// Create a redactor over the built-in pattern table.
    pub fn new() -> Self {
        Self::with_table(PatternTable::builtin())
    }

    /// Create a redactor over a custom table.
    pub fn with_table(table: Arc<PatternTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &PatternTable {
        &self.table
    }

    /// Scan `text` and return the masked copy with every identifier found.
    pub fn detect(&self, text: &str) -> RedactionResult {
        let selected = self.select(self.candidates(text));

        let identifiers: Vec<Identifier> = selected
            .into_iter()
            .map(|c| {
                let value = &text[c.span.start..c.span.end];
                Identifier {
                    kind: c.kind,
                    value: value.to_string(),
                    span: c.span,
                    confidence: self.confidence(c.kind, value),
                    masked_value: mask(c.kind, value),
                }
            })
            .collect();

        let redacted_text = apply_masks(text, &identifiers);
        let confidence = if identifiers.is_empty() {
            1.0
        } else {
            identifiers.iter().map(|i| i.confidence).sum::<f64>() / identifiers.len() as f64
        };
        let risk_tier = RiskTier::assess(&identifiers);

        if !identifiers.is_empty() {
            debug!(
                identifiers = identifiers.len(),
                risk_tier = %risk_tier,
                confidence,
                "PHI_DETECTED"
            );
        }

        RedactionResult {
            original_text: text.to_string(),
            redacted_text,
            identifiers,
            confidence,
            risk_tier,
        }
    }

    /// Scan raw bytes. Invalid UTF-8 sequences are replaced before scanning.
    pub fn detect_bytes(&self, bytes: &[u8]) -> RedactionResult {
        match String::from_utf8_lossy(bytes) {
            Cow::Borrowed(text) => self.detect(text),
            Cow::Owned(text) => self.detect(&text),
        }
    }

    /// Masked copy of `text`.
    pub fn redact(&self, text: &str) -> String {
        self.detect(text).redacted_text
    }

    fn candidates(&self, text: &str) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        for (order, entry) in self.table.entries().iter().enumerate() {
            for m in entry.regex.find_iter(text) {
                if m.as_str().is_empty() {
                    continue;
                }
                if entry.kind == IdentifierType::Name && self.table.is_excluded_name(m.as_str()) {
                    continue;
                }
                candidates.push(Candidate {
                    kind: entry.kind,
                    span: Span {
                        start: m.start(),
                        end: m.end(),
                    },
                    order,
                });
            }
        }

        candidates
    }

    /// Resolve overlapping candidates: earliest start, then longest, then
    /// table order. Returns non-overlapping candidates in ascending order.
    fn select(&self, mut candidates: Vec<Candidate>) -> Vec<Candidate> {
        candidates.sort_by(|a, b| {
            a.span
                .start
                .cmp(&b.span.start)
                .then(b.span.len().cmp(&a.span.len()))
                .then(a.order.cmp(&b.order))
        });

        let mut selected: Vec<Candidate> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let clear = selected
                .last()
                .map_or(true, |last| !last.span.overlaps(&candidate.span));
            if clear {
                selected.push(candidate);
            }
        }
        selected
    }

    fn confidence(&self, kind: IdentifierType, value: &str) -> f64 {
        let mut confidence = kind.base_confidence();
        match kind {
            IdentifierType::Phone if is_vietnamese_phone(value) => {
                confidence += LOCALE_PHONE_BOOST;
            }
            IdentifierType::Name if self.table.starts_with_surname(value) => {
                confidence += SURNAME_BOOST;
            }
            _ => {}
        }
        confidence.min(1.0)
    }
}

/// Replace identifiers in descending start order so that earlier
/// replacements never shift offsets still to be applied.
fn apply_masks(text: &str, identifiers: &[Identifier]) -> String {
    let mut ordered: Vec<&Identifier> = identifiers.iter().collect();
    ordered.sort_by(|a, b| b.span.start.cmp(&a.span.start));

    let mut redacted = text.to_string();
    for identifier in ordered {
        redacted.replace_range(identifier.span.start..identifier.span.end, &identifier.masked_value);
    }
    redacted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redactor() -> Redactor {
        Redactor::new()
    }

    #[test]
    fn test_ssn_example() {
        let result = redactor().detect("My SSN is 123-45-6789");

        assert_eq!(result.redacted_text, "My SSN is XXX-XX-XXXX");
        assert_eq!(result.identifiers.len(), 1);
        assert_eq!(result.identifiers[0].kind, IdentifierType::Ssn);
        assert!(result.identifiers[0].confidence >= 0.9);
        assert!(result.risk_tier >= RiskTier::Medium);
        assert_eq!(result.original_text, "My SSN is 123-45-6789");
    }

    #[test]
    fn test_empty_and_plain_text() {
        for text in ["", "   ", "I have a headache", "đau đầu và sốt"] {
            let result = redactor().detect(text);
            assert!(!result.has_phi(), "unexpected PHI in {text:?}");
            assert_eq!(result.redacted_text, text);
            assert_eq!(result.confidence, 1.0);
            assert_eq!(result.risk_tier, RiskTier::Low);
        }
    }

    #[test]
    fn test_binary_garbage_degrades() {
        let bytes = [0xff, 0xfe, 0x00, 0x41, 0xc3, 0x28, 0x9f];
        let result = redactor().detect_bytes(&bytes);
        assert!(!result.has_phi());
    }

    #[test]
    fn test_multiple_identifiers_masked_in_place() {
        let text = "Call 555-123-4567 or email jane.doe@example.com, DOB 03/14/1975.";
        let result = redactor().detect(text);

        assert_eq!(
            result.redacted_text,
            "Call XXX-XXX-XXXX or email j*******@example.com, DOB XX/XX/XXXX."
        );
        assert_eq!(
            result.identifier_types(),
            vec![IdentifierType::Phone, IdentifierType::Email, IdentifierType::Date]
        );
        assert_eq!(result.risk_tier, RiskTier::Medium);
    }

    #[test]
    fn test_adjacent_identifiers_keep_alignment() {
        // Masks change length, so a forward pass would shift later spans.
        let text = "a@b.co 123-45-6789 10.0.0.1 https://x.org/p";
        let result = redactor().detect(text);

        let mut expected = String::new();
        let mut cursor = 0;
        for id in &result.identifiers {
            expected.push_str(&text[cursor..id.span.start]);
            expected.push_str(&id.masked_value);
            cursor = id.span.end;
        }
        expected.push_str(&text[cursor..]);

        assert_eq!(result.identifiers.len(), 4);
        assert_eq!(result.redacted_text, expected);
        assert_eq!(result.redacted_text, "*@b.co XXX-XX-XXXX XXX.XXX.XXX.XXX [URL]");
    }

    #[test]
    fn test_overlapping_matches_resolved() {
        // The URL contains an email; only the URL is reported.
        let result = redactor().detect("see https://portal.example.com/?u=ann@example.com now");

        assert_eq!(result.identifiers.len(), 1);
        assert_eq!(result.identifiers[0].kind, IdentifierType::Url);
        assert_eq!(result.redacted_text, "see [URL] now");

        for pair in result.identifiers.windows(2) {
            assert!(!pair[0].span.overlaps(&pair[1].span));
        }
    }

    #[test]
    fn test_vietnamese_identifiers() {
        let text = "Bệnh nhân Nguyễn Văn An, CCCD 001234567890, BHYT: DN4010123456789, SĐT 0912345678";
        let result = redactor().detect(text);

        assert_eq!(result.count(IdentifierType::Name), 1);
        assert_eq!(result.count(IdentifierType::VietnameseId), 1);
        assert_eq!(result.count(IdentifierType::VietnameseInsurance), 1);
        assert_eq!(result.count(IdentifierType::Phone), 1);
        assert!(result.redacted_text.contains("N***** V** A*"));
        assert!(result.redacted_text.contains("CCCD XXXXXXXXXXXX"));
        assert!(result.redacted_text.contains("BHYT: XXXXXXXXXXXXXXX"));
        assert!(result.redacted_text.contains("+84-XXX-XXX-XXX"));
        assert_eq!(result.risk_tier, RiskTier::High);
    }

    #[test]
    fn test_locale_confidence_boosts() {
        let result = redactor().detect("Trần Thị Mai, phone +84 912345678, office (555) 123-4567");

        let name = &result.identifiers[0];
        assert_eq!(name.kind, IdentifierType::Name);
        assert!((name.confidence - 0.9).abs() < 1e-9);

        let phones: Vec<_> = result
            .identifiers
            .iter()
            .filter(|i| i.kind == IdentifierType::Phone)
            .collect();
        assert_eq!(phones.len(), 2);
        assert!((phones[0].confidence - 0.95).abs() < 1e-9);
        assert!((phones[1].confidence - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_place_names_not_redacted() {
        let result = redactor().detect("I live in Hồ Chí Minh City");
        assert!(!result.has_phi());
    }

    #[test]
    fn test_redaction_is_idempotent() {
        let samples = [
            "My SSN is 123-45-6789 and 987654321",
            "Call (555) 123-4567 or +1 555 123 4567 or 555.123.4567",
            "Reach me at j@x.io or jane.doe@example.com",
            "Seen on March 3, 1980 and 2021-07-04 and ngày 5 tháng 6 năm 1990",
            "MRN: 0042817, Patient ID AB-1234, medical record number 77123",
            "Server 192.168.1.20 and www.example.com/a and http://x.org",
            "CMND 123456789, Hộ chiếu: C7654321, B1234567, BHYT: DN4010123456789",
            "Ông Phạm Minh Tuấn và Dr. Smith",
        ];

        for text in samples {
            let first = redactor().detect(text);
            assert!(first.has_phi(), "nothing found in {text:?}");

            let second = redactor().detect(&first.redacted_text);
            for kind in first.identifier_types() {
                assert_eq!(
                    second.count(kind),
                    0,
                    "{kind} re-detected in {:?}",
                    first.redacted_text
                );
            }
        }
    }

    #[test]
    fn test_adding_high_risk_identifier_never_lowers_tier() {
        let base = "email a.b@example.com phone 555-123-4567";
        let before = redactor().detect(base).risk_tier;
        let after = redactor().detect(&format!("{base} MRN 889123")).risk_tier;

        assert_eq!(before, RiskTier::Medium);
        assert!(after >= before);
        assert_eq!(after, RiskTier::High);
    }

    #[test]
    fn test_custom_table() {
        let table = PatternTable::from_specs([(IdentifierType::MedicalRecordNumber, r"\bH-\d{6}\b")])
            .unwrap();
        let redactor = Redactor::with_table(Arc::new(table));

        let result = redactor.detect("chart H-123456, SSN 123-45-6789");
        assert_eq!(result.identifiers.len(), 1);
        assert_eq!(result.redacted_text, "chart X-XXXXXX, SSN 123-45-6789");
    }

    #[test]
    fn test_aggregate_confidence_is_mean() {
        let result = redactor().detect("123-45-6789 on 01/02/2003");
        let expected = (0.95 + 0.7) / 2.0;
        assert!((result.confidence - expected).abs() < 1e-9);
    }
}
