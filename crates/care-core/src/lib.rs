//! Shared vocabulary for the care pipeline.
//!
//! Everything in this crate is a pure function over text plus immutable
//! tables, so it can be called from any number of tasks without locking:
//!
//! - [`Query`] / [`QueryContext`] - what the caller submits
//! - [`score`] - additive urgency scoring over keywords, vitals, self-reported
//!   severity and chronic conditions
//! - [`classify`] - deterministic intent classification in fixed priority order
//! - [`detect_language`] / [`detect_cultural_context`] - locale signals
//! - [`extract_entities`] - symptoms, medications and conditions named in text
//! - [`Capability`] - what a handler declares it can process
//! - [`lexicon`] - drugs and traditional herbs with their classes and cautions
//!
//! All severities and urgencies are on `[0.0, 1.0]`.

mod capability;
mod entities;
mod intent;
pub mod keywords;
mod language;
pub mod lexicon;
mod query;
mod scoring;
mod vitals;

pub use capability::Capability;
pub use entities::{extract_entities, MedicalEntities};
pub use intent::{classify, detect_intent, Classification, Intent};
pub use language::{
    contains_vietnamese, detect_cultural_context, detect_language, CulturalContext, Language,
};
pub use query::{OrganFunction, PregnancyStatus, Query, QueryContext, Vitals};
pub use scoring::{score, Signal, SignalSource, UrgencyScore};
pub use vitals::{assess_vitals, VitalFinding, VitalSeverity};
