//! Type-specific masking.
//!
//! Every mask is built from `X`, `*` and punctuation so that a masked
//! value can never match the pattern that produced it.

use crate::identifier::IdentifierType;

const NAME_MASK: char = '*';

/// Produce the replacement for a detected value.
pub(crate) fn mask(kind: IdentifierType, value: &str) -> String {
    match kind {
        IdentifierType::Ssn => "XXX-XX-XXXX".to_string(),
        IdentifierType::Phone => {
            if is_vietnamese_phone(value) {
                "+84-XXX-XXX-XXX".to_string()
            } else {
                "XXX-XXX-XXXX".to_string()
            }
        }
        IdentifierType::Email => mask_email(value),
        IdentifierType::Date => "XX/XX/XXXX".to_string(),
        IdentifierType::IpAddress => "XXX.XXX.XXX.XXX".to_string(),
        IdentifierType::Url => "[URL]".to_string(),
        IdentifierType::Name => mask_name(value),
        IdentifierType::MedicalRecordNumber
        | IdentifierType::VietnameseId
        | IdentifierType::VietnamesePassport
        | IdentifierType::VietnameseInsurance => mask_trailing_token(value),
    }
}

pub(crate) fn is_vietnamese_phone(value: &str) -> bool {
    value.starts_with("+84") || value.starts_with('0')
}

/// `jane.doe@example.com` -> `j*******@example.com`.
///
/// Single-character local parts are fully masked.
fn mask_email(value: &str) -> String {
    let Some((local, domain)) = value.split_once('@') else {
        return NAME_MASK.to_string().repeat(value.chars().count());
    };

    let mut chars = local.chars();
    let count = local.chars().count();
    let mut masked = String::with_capacity(value.len());
    if count > 1 {
        if let Some(first) = chars.next() {
            masked.push(first);
        }
        masked.extend(std::iter::repeat(NAME_MASK).take(count - 1));
    } else {
        masked.extend(std::iter::repeat(NAME_MASK).take(count));
    }
    masked.push('@');
    masked.push_str(domain);
    masked
}

/// Keep each token's first character and mask the remaining letters/digits.
///
/// `Nguyễn Văn An` -> `N***** V** A*`.
fn mask_name(value: &str) -> String {
    let mut masked = String::with_capacity(value.len());
    let mut at_token_start = true;

    for ch in value.chars() {
        if ch.is_whitespace() {
            at_token_start = true;
            masked.push(ch);
        } else if at_token_start {
            at_token_start = false;
            masked.push(ch);
        } else if ch.is_alphanumeric() {
            masked.push(NAME_MASK);
        } else {
            masked.push(ch);
        }
    }

    masked
}

/// Keep a label such as `MRN:` or `CCCD` and replace the identifier token.
///
/// `MRN: 0042817` -> `MRN: XXXXXXX`, `B1234567` -> `XXXXXXXX`.
fn mask_trailing_token(value: &str) -> String {
    let token_start = value
        .char_indices()
        .rev()
        .take_while(|(_, ch)| ch.is_alphanumeric() || *ch == '-')
        .last()
        .map(|(i, _)| i)
        .unwrap_or(value.len());

    let (label, token) = value.split_at(token_start);
    let mut masked = String::with_capacity(value.len());
    masked.push_str(label);
    masked.extend(token.chars().map(|ch| if ch == '-' { '-' } else { 'X' }));
    masked
}
