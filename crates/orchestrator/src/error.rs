//! Error types for orchestrator operations.

use brain_core::BrainError;
use care_agents::{HandlerError, ResponseEnvelope};
use thiserror::Error;

use crate::audit::AuditError;

/// Errors that can occur during orchestration.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// No handler can serve the query.
    #[error("capability exceeded: {0}")]
    CapabilityExceeded(#[from] HandlerError),

    /// A high-risk interaction could not be audited.
    ///
    /// The envelope is still carried so the caller can deliver it.
    #[error("audit write failed: {source}")]
    AuditWriteFailure {
        source: AuditError,
        envelope: Box<ResponseEnvelope>,
    },

    /// Backend classification output could not be used.
    #[error("invalid classification: {0}")]
    InvalidClassification(String),

    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Backend failure.
    #[error("brain error: {0}")]
    Brain(#[from] BrainError),
}

impl OrchestratorError {
    /// The response produced before the error, if any.
    pub fn envelope(&self) -> Option<&ResponseEnvelope> {
        match self {
            OrchestratorError::AuditWriteFailure { envelope, .. } => Some(envelope),
            _ => None,
        }
    }
}
