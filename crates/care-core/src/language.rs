//! Language and cultural-context detection.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::keywords::{contains_any, normalize, MODERN_MEDICINE_TERMS, TRADITIONAL_PRACTICE_TERMS};
use crate::lexicon::find_herbs;

/// Language of a query or handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    English,
    Vietnamese,
    /// Both English and Vietnamese in the same text.
    Mixed,
    /// A preference outside the supported set, kept verbatim.
    Other(String),
}

impl Language {
    /// Parse a caller-supplied preference such as `"vi"`, `"en-US"` or `"Tiếng Việt"`.
    ///
    /// A parenthesized region such as `"English (US)"` is ignored, then the
    /// whole name is tried before its first subtag.
    pub fn from_preference(raw: &str) -> Self {
        let lowered = raw.trim().to_lowercase();
        let base = lowered.split('(').next().unwrap_or_default().trim();
        let primary = base
            .split(|c: char| c == '-' || c == '_' || c.is_whitespace())
            .next()
            .unwrap_or_default();

        let parsed = [base, primary]
            .into_iter()
            .find_map(Self::from_tag)
            .unwrap_or_else(|| Language::Other(raw.trim().to_string()));
        parsed
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "en" | "eng" | "english" | "tiếng anh" => Some(Language::English),
            "vi" | "vie" | "vn" | "vietnamese" | "tiếng việt" => Some(Language::Vietnamese),
            "mixed" | "bilingual" => Some(Language::Mixed),
            _ => None,
        }
    }

    /// Whether text in this language includes Vietnamese.
    pub fn includes_vietnamese(&self) -> bool {
        matches!(self, Language::Vietnamese | Language::Mixed)
    }

    /// Languages a handler must support to serve this one.
    pub fn required(&self) -> Vec<Language> {
        match self {
            Language::Mixed => vec![Language::English, Language::Vietnamese],
            other => vec![other.clone()],
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Language::English => "en",
            Language::Vietnamese => "vi",
            Language::Mixed => "mixed",
            Language::Other(raw) => raw,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Health-practice orientation expressed in a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CulturalContext {
    Traditional,
    Modern,
    /// Traditional and conventional care mentioned together.
    Mixed,
}

impl CulturalContext {
    /// Parse a caller-supplied preference. Unknown values yield `None`.
    pub fn from_preference(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "traditional" | "truyền thống" => Some(CulturalContext::Traditional),
            "modern" | "western" | "hiện đại" => Some(CulturalContext::Modern),
            "mixed" | "integrative" => Some(CulturalContext::Mixed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CulturalContext::Traditional => "traditional",
            CulturalContext::Modern => "modern",
            CulturalContext::Mixed => "mixed",
        }
    }
}

const VIETNAMESE_LETTERS: &str = "ăâđêôơưàảãạáằẳẵặắầẩẫậấèẻẽẹéềểễệếìỉĩịíòỏõọóồổỗộốờởỡợớùủũụúừửữựứỳỷỹỵý";

const ENGLISH_MARKERS: &[&str] = &[
    "the", "and", "is", "are", "my", "i", "what", "when", "how", "should", "can", "take", "with",
    "have", "for", "do", "pain", "help",
];

/// Whether `text` contains any Vietnamese-specific letter.
pub fn contains_vietnamese(text: &str) -> bool {
    text.chars()
        .flat_map(char::to_lowercase)
        .any(|c| VIETNAMESE_LETTERS.contains(c))
}

/// Detect the language of free text. Text with no signal defaults to English.
pub fn detect_language(text: &str) -> Language {
    let vietnamese = contains_vietnamese(text);
    let normalized = normalize(text);
    let english_words = normalized
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| ENGLISH_MARKERS.contains(w))
        .count();

    match (vietnamese, english_words) {
        (true, 0) => Language::Vietnamese,
        (true, n) if n >= 2 => Language::Mixed,
        (true, _) => Language::Vietnamese,
        (false, _) => Language::English,
    }
}

/// Detect whether the text leans on traditional practice, conventional care, or both.
///
/// Returns `None` when there is no signal either way.
pub fn detect_cultural_context(text: &str) -> Option<CulturalContext> {
    let normalized = normalize(text);
    let traditional = contains_any(&normalized, TRADITIONAL_PRACTICE_TERMS)
        || !find_herbs(&normalized).is_empty();
    let modern = contains_any(&normalized, MODERN_MEDICINE_TERMS);

    match (traditional, modern) {
        (true, true) => Some(CulturalContext::Mixed),
        (true, false) => Some(CulturalContext::Traditional),
        (false, true) => Some(CulturalContext::Modern),
        (false, false) => None,
    }
}
