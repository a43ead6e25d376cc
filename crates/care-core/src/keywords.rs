//! Keyword tables (English and Vietnamese) and whole-term matching.
//!
//! All terms are lowercase. Match against text passed through [`normalize`].

/// Critical-symptom categories. Each matched category adds a fixed urgency
/// increment; every category except `general` forces triage level 1.
pub const CRITICAL_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "cardiac",
        &[
            "chest pain",
            "chest pressure",
            "crushing chest",
            "heart attack",
            "cardiac arrest",
            "đau ngực",
            "đau tim",
            "nhồi máu cơ tim",
            "ngừng tim",
        ],
    ),
    (
        "respiratory",
        &[
            "difficulty breathing",
            "trouble breathing",
            "can't breathe",
            "cannot breathe",
            "can not breathe",
            "not breathing",
            "shortness of breath",
            "choking",
            "khó thở",
            "không thở được",
            "ngạt thở",
        ],
    ),
    (
        "neurological",
        &[
            "stroke",
            "unconscious",
            "unresponsive",
            "seizure",
            "passed out",
            "slurred speech",
            "face drooping",
            "severe head injury",
            "đột quỵ",
            "bất tỉnh",
            "co giật",
            "hôn mê",
            "chấn thương đầu nặng",
            "méo miệng",
        ],
    ),
    (
        "hemorrhage",
        &[
            "severe bleeding",
            "heavy bleeding",
            "bleeding heavily",
            "vomiting blood",
            "coughing up blood",
            "xuất huyết nặng",
            "chảy máu nhiều",
            "nôn ra máu",
            "ho ra máu",
        ],
    ),
    (
        "allergic",
        &[
            "allergic reaction",
            "anaphylaxis",
            "throat swelling",
            "throat closing",
            "sốc phản vệ",
            "dị ứng nặng",
        ],
    ),
    ("toxic", &["overdose", "poisoning", "poisoned", "quá liều", "ngộ độc"]),
    (
        "self_harm",
        &["suicide", "kill myself", "end my life", "tự tử", "muốn chết"],
    ),
    (
        "trauma",
        &["severe burn", "severe burns", "gunshot", "stab wound", "bỏng nặng"],
    ),
    (
        "general",
        &[
            "emergency",
            "life-threatening",
            "life threatening",
            "cấp cứu",
            "khẩn cấp",
            "nguy hiểm",
            "đe dọa tính mạng",
        ],
    ),
];

/// Category name that does not force triage level 1 on its own.
pub const GENERAL_EMERGENCY_CATEGORY: &str = "general";

/// Words describing intensity rather than a specific symptom.
pub const INTENSITY_WORDS: &[&str] = &[
    "severe",
    "excruciating",
    "unbearable",
    "worst",
    "extreme",
    "intense",
    "dữ dội",
    "nghiêm trọng",
    "rất đau",
    "không chịu nổi",
];

/// Long-term conditions that raise baseline risk.
pub const CHRONIC_HIGH_RISK: &[&str] = &[
    "heart disease",
    "coronary artery disease",
    "heart failure",
    "diabetes",
    "hypertension",
    "high blood pressure",
    "previous stroke",
    "history of stroke",
    "copd",
    "kidney disease",
    "cancer",
    "tiểu đường",
    "đái tháo đường",
    "cao huyết áp",
    "tăng huyết áp",
    "bệnh tim",
    "suy tim",
    "suy thận",
    "ung thư",
];

/// Terms that mark a medication question (drug names come from the lexicon).
pub const MEDICATION_TERMS: &[&str] = &[
    "medication",
    "medications",
    "medicine",
    "drug",
    "drugs",
    "pill",
    "pills",
    "tablet",
    "tablets",
    "dose",
    "dosage",
    "prescription",
    "side effect",
    "side effects",
    "interaction",
    "refill",
    "pharmacy",
    "pharmacist",
    "uống thuốc",
    "liều",
    "liều lượng",
    "đơn thuốc",
    "tác dụng phụ",
    "tương tác thuốc",
    "thuốc tây",
];

/// Traditional and alternative medicine practices.
pub const TRADITIONAL_PRACTICE_TERMS: &[&str] = &[
    "thuốc nam",
    "đông y",
    "y học cổ truyền",
    "thảo dược",
    "thuốc bắc",
    "châm cứu",
    "cạo gió",
    "giác hơi",
    "bấm huyệt",
    "traditional medicine",
    "herbal",
    "herbal remedy",
    "acupuncture",
    "cupping",
    "coining",
];

/// Conventional-medicine vocabulary, used to tell traditional from mixed care.
pub const MODERN_MEDICINE_TERMS: &[&str] = &[
    "bác sĩ",
    "bệnh viện",
    "phòng khám",
    "thuốc tây",
    "kháng sinh",
    "xét nghiệm",
    "đơn thuốc",
    "doctor",
    "hospital",
    "clinic",
    "antibiotic",
    "antibiotics",
    "prescription",
    "lab test",
];

/// General clinical vocabulary.
pub const CLINICAL_TERMS: &[&str] = &[
    "symptom",
    "symptoms",
    "diagnosis",
    "pain",
    "fever",
    "headache",
    "cough",
    "blood pressure",
    "blood sugar",
    "rash",
    "nausea",
    "dizzy",
    "dizziness",
    "test results",
    "lab results",
    "swelling",
    "fatigue",
    "triệu chứng",
    "chẩn đoán",
    "đau",
    "sốt",
    "ho",
    "đau đầu",
    "chóng mặt",
    "buồn nôn",
    "huyết áp",
    "đường huyết",
    "mệt mỏi",
    "phát ban",
];

/// Symptom vocabulary for entity extraction.
pub const SYMPTOM_TERMS: &[&str] = &[
    "chest pain",
    "shortness of breath",
    "difficulty breathing",
    "headache",
    "severe headache",
    "fever",
    "high fever",
    "cough",
    "abdominal pain",
    "stomach pain",
    "back pain",
    "nausea",
    "vomiting",
    "diarrhea",
    "dizziness",
    "fatigue",
    "rash",
    "sore throat",
    "runny nose",
    "palpitations",
    "swelling",
    "bleeding",
    "vision changes",
    "đau ngực",
    "khó thở",
    "đau đầu",
    "sốt",
    "sốt cao",
    "ho",
    "đau bụng",
    "đau lưng",
    "buồn nôn",
    "nôn",
    "tiêu chảy",
    "chóng mặt",
    "mệt mỏi",
    "phát ban",
    "đau họng",
    "sổ mũi",
    "hồi hộp",
];

/// Replace typographic apostrophes and lowercase.
pub fn normalize(text: &str) -> String {
    text.replace(['\u{2019}', '\u{2018}'], "'").to_lowercase()
}

/// Whether `term` occurs in `text` as a whole word or phrase.
///
/// Both arguments must already be normalized. A match needs a non-alphanumeric
/// character (or the string edge) on both sides, so `ho` does not match `how`.
pub fn contains_term(text: &str, term: &str) -> bool {
    if term.is_empty() {
        return false;
    }

    text.match_indices(term).any(|(start, matched)| {
        let end = start + matched.len();
        let before_ok = text[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = text[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}

/// Terms from `terms` that occur in `text`, in table order.
pub fn matched_terms<'a>(text: &str, terms: &[&'a str]) -> Vec<&'a str> {
    terms
        .iter()
        .copied()
        .filter(|term| contains_term(text, term))
        .collect()
}

/// Whether any term occurs in `text`.
pub fn contains_any(text: &str, terms: &[&str]) -> bool {
    terms.iter().any(|term| contains_term(text, term))
}

/// Critical categories matched in `text`, with the first matching term of each.
pub fn critical_categories(text: &str) -> Vec<(&'static str, &'static str)> {
    CRITICAL_CATEGORIES
        .iter()
        .filter_map(|(category, terms)| {
            terms
                .iter()
                .find(|term| contains_term(text, term))
                .map(|term| (*category, *term))
        })
        .collect()
}
