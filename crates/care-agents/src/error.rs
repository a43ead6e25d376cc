//! Error types for handler operations.

use care_core::Language;
use thiserror::Error;

use crate::handler::HandlerKind;

/// Why a handler refused a query.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CapabilityRejection {
    /// No declared capability supports the query language.
    #[error("language {0} is not supported")]
    UnsupportedLanguage(Language),

    /// Urgency is above every declared maximum severity.
    #[error("urgency {urgency:.2} exceeds maximum severity {max_severity:.2}")]
    SeverityTooHigh { urgency: f32, max_severity: f32 },
}

/// Errors surfaced by the handler pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HandlerError {
    /// The handler's capabilities do not cover this query.
    #[error("{handler} handler cannot process query: {reason}")]
    CapabilityExceeded {
        handler: HandlerKind,
        reason: CapabilityRejection,
    },
}

impl HandlerError {
    /// Whether the rejection was on severity and could be served by a stronger handler.
    pub fn is_severity_rejection(&self) -> bool {
        matches!(
            self,
            HandlerError::CapabilityExceeded {
                reason: CapabilityRejection::SeverityTooHigh { .. },
                ..
            }
        )
    }
}
