//! Supervisor routing and pipeline orchestration for healthcare queries.
//!
//! This crate provides the [`Orchestrator`], which runs every query through
//! PHI redaction, classification, capability checks and a specialist
//! handler, then audits the result.
//!
//! # Architecture
//!
//! ```text
//! Query (text + session context)
//!          ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ORCHESTRATOR                           │
//! │                                                             │
//! │  1. Redact PHI (phi-redactor, once)                         │
//! │         ↓                                                   │
//! │  2. Classify + route (Supervisor)                           │
//! │     • keyword intent and urgency score                      │
//! │     • optional backend refinement, merged upward only       │
//! │     • urgency ≥ 0.8 → emergency                             │
//! │         ↓                                                   │
//! │  3. Capability check (severity rejection → emergency)       │
//! │         ↓                                                   │
//! │  4. Enhance context with extracted entities                 │
//! │         ↓                                                   │
//! │  5. Handle → post-process → metadata → audit                │
//! │     (own task on the emergency path)                        │
//! └─────────────────────────────────────────────────────────────┘
//!          ↓
//! ResponseEnvelope
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use orchestrator::{Orchestrator, Query};
//!
//! let orchestrator = Orchestrator::from_env()?;
//! let envelope = orchestrator
//!     .process(Query::new("session-1", "when should I take my metformin"))
//!     .await?;
//! println!("{}", envelope.text);
//! ```

mod audit;
mod config;
mod context_store;
mod error;
mod orchestrator;
mod supervisor;

pub use audit::{
    AuditError, AuditEventType, AuditRecord, AuditSeverity, AuditSink, LoggingAuditSink,
    MemoryAuditSink, NoOpAuditSink,
};
pub use config::OrchestratorConfig;
pub use context_store::{ContextStore, ContextStoreError, InMemoryContextStore};
pub use error::OrchestratorError;
pub use orchestrator::Orchestrator;
pub use supervisor::{
    load_supervisor_prompt, Supervisor, DEFAULT_SUPERVISOR_PROMPT_FILE,
    DEFAULT_SUPERVISOR_SYSTEM_PROMPT, EMERGENCY_ROUTING_THRESHOLD,
};

// Re-export commonly used types from dependencies
pub use care_agents::{HandlerKind, ResponseEnvelope};
pub use care_core::{Query, QueryContext, Vitals};
