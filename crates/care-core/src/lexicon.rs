//! Drug and traditional-herb lexicon.

use serde::{Deserialize, Serialize};

use crate::keywords::contains_term;

/// Pharmacological class used by the interaction tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrugClass {
    Analgesic,
    Nsaid,
    Antiplatelet,
    Anticoagulant,
    Penicillin,
    Biguanide,
    Insulin,
    AceInhibitor,
    AngiotensinReceptorBlocker,
    CalciumChannelBlocker,
    Statin,
    Fibrate,
    ProtonPumpInhibitor,
    CardiacGlycoside,
    MoodStabilizer,
    Diuretic,
    PotassiumSupplement,
    Corticosteroid,
    ThyroidHormone,
}

/// A known drug.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrugInfo {
    /// Canonical lowercase name.
    pub name: &'static str,
    /// Brand names and local spellings.
    pub aliases: &'static [&'static str],
    pub classes: &'static [DrugClass],
    /// Narrow therapeutic index or serious harm on error.
    pub high_risk: bool,
}

impl DrugInfo {
    pub fn has_class(&self, class: DrugClass) -> bool {
        self.classes.contains(&class)
    }

    fn matches(&self, normalized: &str) -> bool {
        contains_term(normalized, self.name)
            || self.aliases.iter().any(|a| contains_term(normalized, a))
    }
}

const fn drug(
    name: &'static str,
    aliases: &'static [&'static str],
    classes: &'static [DrugClass],
    high_risk: bool,
) -> DrugInfo {
    DrugInfo {
        name,
        aliases,
        classes,
        high_risk,
    }
}

use DrugClass::*;

pub const DRUGS: &[DrugInfo] = &[
    drug("paracetamol", &["acetaminophen", "tylenol", "panadol", "efferalgan"], &[Analgesic], false),
    drug("aspirin", &["acetylsalicylic acid"], &[Antiplatelet, Nsaid], false),
    drug("ibuprofen", &["advil", "motrin"], &[Nsaid], false),
    drug("naproxen", &["aleve"], &[Nsaid], false),
    drug("amoxicillin", &["augmentin"], &[Penicillin], false),
    drug("metformin", &["glucophage"], &[Biguanide], false),
    drug("insulin", &["lantus", "novorapid"], &[Insulin], true),
    drug("lisinopril", &[], &[AceInhibitor], false),
    drug("enalapril", &[], &[AceInhibitor], false),
    drug("losartan", &[], &[AngiotensinReceptorBlocker], false),
    drug("amlodipine", &[], &[CalciumChannelBlocker], false),
    drug("atorvastatin", &["lipitor"], &[Statin], false),
    drug("simvastatin", &["zocor"], &[Statin], false),
    drug("fenofibrate", &[], &[Fibrate], false),
    drug("gemfibrozil", &[], &[Fibrate], false),
    drug("omeprazole", &["prilosec"], &[ProtonPumpInhibitor], false),
    drug("warfarin", &["coumadin"], &[Anticoagulant], true),
    drug("apixaban", &["eliquis"], &[Anticoagulant], true),
    drug("rivaroxaban", &["xarelto"], &[Anticoagulant], true),
    drug("heparin", &[], &[Anticoagulant], true),
    drug("clopidogrel", &["plavix"], &[Antiplatelet], false),
    drug("digoxin", &["lanoxin"], &[CardiacGlycoside], true),
    drug("lithium", &[], &[MoodStabilizer], true),
    drug("furosemide", &["lasix"], &[Diuretic], false),
    drug("hydrochlorothiazide", &["hctz"], &[Diuretic], false),
    drug("potassium chloride", &["potassium supplement"], &[PotassiumSupplement], false),
    drug("prednisone", &[], &[Corticosteroid], false),
    drug("levothyroxine", &["synthroid"], &[ThyroidHormone], false),
];

/// Drugs named in `normalized` text, in lexicon order.
pub fn find_drugs(normalized: &str) -> Vec<&'static DrugInfo> {
    DRUGS.iter().filter(|d| d.matches(normalized)).collect()
}

/// Look up a single drug by name or alias.
pub fn lookup_drug(name: &str) -> Option<&'static DrugInfo> {
    let normalized = name.trim().to_lowercase();
    DRUGS
        .iter()
        .find(|d| d.name == normalized || d.aliases.contains(&normalized.as_str()))
        .or_else(|| DRUGS.iter().find(|d| d.matches(&normalized)))
}

/// Safety rating of a traditional remedy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HerbSafety {
    Safe,
    Caution,
    Avoid,
}

/// A traditional remedy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HerbInfo {
    /// Vietnamese name, lowercase.
    pub name: &'static str,
    pub english: &'static str,
    pub scientific: &'static str,
    pub safety: HerbSafety,
    pub traditional_uses: &'static [&'static str],
    /// Conditions under which the herb should not be used.
    pub contraindications: &'static [&'static str],
    /// Drug classes the herb is known to interact with.
    pub interacts_with: &'static [DrugClass],
    pub interaction_effect: &'static str,
}

impl HerbInfo {
    fn matches(&self, normalized: &str) -> bool {
        contains_term(normalized, self.name) || contains_term(normalized, self.english)
    }
}

pub const HERBS: &[HerbInfo] = &[
    HerbInfo {
        name: "gừng",
        english: "ginger",
        scientific: "Zingiber officinale",
        safety: HerbSafety::Safe,
        traditional_uses: &["nausea", "digestion", "common cold"],
        contraindications: &["gallstones"],
        interacts_with: &[Anticoagulant, Antiplatelet],
        interaction_effect: "may increase bleeding risk",
    },
    HerbInfo {
        name: "nghệ",
        english: "turmeric",
        scientific: "Curcuma longa",
        safety: HerbSafety::Safe,
        traditional_uses: &["digestion", "inflammation", "wound healing"],
        contraindications: &["gallstones"],
        interacts_with: &[Anticoagulant],
        interaction_effect: "may increase bleeding risk",
    },
    HerbInfo {
        name: "cam thảo",
        english: "licorice",
        scientific: "Glycyrrhiza glabra",
        safety: HerbSafety::Caution,
        traditional_uses: &["cough", "sore throat", "stomach ulcers"],
        contraindications: &[
            "high blood pressure",
            "hypertension",
            "heart disease",
            "kidney disease",
            "cao huyết áp",
        ],
        interacts_with: &[AceInhibitor, Diuretic, CardiacGlycoside],
        interaction_effect: "may raise blood pressure and lower potassium",
    },
    HerbInfo {
        name: "nhân sâm",
        english: "ginseng",
        scientific: "Panax ginseng",
        safety: HerbSafety::Caution,
        traditional_uses: &["fatigue", "energy", "immune support"],
        contraindications: &["high blood pressure", "hypertension", "cao huyết áp"],
        interacts_with: &[Anticoagulant, Insulin, Biguanide],
        interaction_effect: "may alter blood sugar and bleeding risk",
    },
    HerbInfo {
        name: "đương quy",
        english: "dong quai",
        scientific: "Angelica sinensis",
        safety: HerbSafety::Caution,
        traditional_uses: &["menstrual complaints", "blood tonic"],
        contraindications: &["pregnancy", "bleeding disorder"],
        interacts_with: &[Anticoagulant, Antiplatelet],
        interaction_effect: "may increase bleeding risk",
    },
    HerbInfo {
        name: "ma hoàng",
        english: "ephedra",
        scientific: "Ephedra sinica",
        safety: HerbSafety::Avoid,
        traditional_uses: &["asthma", "cold"],
        contraindications: &["heart disease", "hypertension", "high blood pressure", "anxiety"],
        interacts_with: &[],
        interaction_effect: "stimulant; can cause dangerous heart rhythm changes",
    },
];

/// Herbs named in `normalized` text, in lexicon order.
pub fn find_herbs(normalized: &str) -> Vec<&'static HerbInfo> {
    HERBS.iter().filter(|h| h.matches(normalized)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_drugs_by_name_and_alias() {
        let found = find_drugs("i take coumadin and tylenol");
        let names: Vec<_> = found.iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["paracetamol", "warfarin"]);
    }

    #[test]
    fn test_lookup_drug() {
        assert_eq!(lookup_drug("Warfarin").map(|d| d.name), Some("warfarin"));
        assert_eq!(lookup_drug("Lasix 40mg").map(|d| d.name), Some("furosemide"));
        assert!(lookup_drug("unobtainium").is_none());
    }

    #[test]
    fn test_high_risk_drugs() {
        for name in ["warfarin", "insulin", "lithium", "digoxin", "apixaban"] {
            assert!(lookup_drug(name).unwrap().high_risk, "{name}");
        }
        assert!(!lookup_drug("metformin").unwrap().high_risk);
    }

    #[test]
    fn test_find_herbs_both_languages() {
        let found = find_herbs("uống gừng với nhân sâm, or licorice tea");
        let names: Vec<_> = found.iter().map(|h| h.name).collect();
        assert_eq!(names, vec!["gừng", "cam thảo", "nhân sâm"]);
    }

    #[test]
    fn test_herb_safety_ordering() {
        assert!(HerbSafety::Avoid > HerbSafety::Caution);
        assert!(HerbSafety::Caution > HerbSafety::Safe);
    }
}
