//! Specialist handlers for healthcare queries.
//!
//! Four handlers form a closed set behind [`Handler`]: medication safety,
//! emergency triage, clinical decision support and Vietnamese cultural
//! health. Each pairs rule-based domain analysis with a text-generation
//! backend and never fails outright; backend errors degrade to a
//! rule-based answer, and the emergency path always returns a safety
//! message pointing at emergency services.
//!
//! # Example
//!
//! ```rust,ignore
//! use care_agents::{Generator, Handler, HandlerConfig, HandlerRequest, MedicationHandler};
//!
//! let generator = Generator::new(brain, &HandlerConfig::from_env());
//! let handler = Handler::Medication(MedicationHandler::new(generator));
//! handler.check_capability(&classification.language, classification.urgency)?;
//! let envelope = handler.handle(&HandlerRequest::new(redacted, context, classification)).await;
//! ```

pub mod clinical;
mod config;
pub mod cultural;
pub mod emergency;
mod envelope;
mod error;
mod generation;
mod handler;
pub mod medication;
pub mod postprocess;
pub mod prompts;

pub use clinical::{ClinicalAssessment, ClinicalHandler};
pub use config::HandlerConfig;
pub use cultural::{CulturalGuidance, CulturalHandler};
pub use emergency::{EmergencyHandler, TriageAssessment, TriageLevel};
pub use envelope::{EnvelopeMetadata, HandlerDetails, RedactionFlags, ResponseEnvelope};
pub use error::{CapabilityRejection, HandlerError};
pub use generation::Generator;
pub use handler::{adjust_confidence, Handler, HandlerKind, HandlerRequest};
pub use medication::{MedicationAnalysis, MedicationHandler};
pub use postprocess::postprocess;
