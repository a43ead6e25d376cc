//! Audit sink trait, records and implementations.

use async_trait::async_trait;
use brain_core::fingerprint;
use care_agents::{HandlerKind, RedactionFlags, ResponseEnvelope};
use chrono::{DateTime, Utc};
use phi_redactor::RiskTier;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Errors from an audit sink.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuditError {
    #[error("audit sink unavailable: {0}")]
    Unavailable(String),

    #[error("audit record rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    EmergencyEscalation,
    MedicationAnalysis,
    PhiAccess,
    HealthcareQuery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// One audited interaction. Holds fingerprints, never text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub event_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    pub event_type: AuditEventType,
    pub severity: AuditSeverity,
    pub handler: HandlerKind,
    /// SHA-256 of the redacted query text.
    pub query_hash: String,
    /// SHA-256 of the response text.
    pub response_hash: String,
    pub redaction: RedactionFlags,
    pub risk_tier: RiskTier,
    pub urgency: f32,
    pub requires_escalation: bool,
    pub latency_ms: u64,
}

impl AuditRecord {
    pub fn new(session_id: impl Into<String>, redacted_query: &str, envelope: &ResponseEnvelope) -> Self {
        let redaction = envelope.metadata.redaction.clone();
        let emergency = envelope.handler == HandlerKind::Emergency;

        let event_type = if emergency {
            AuditEventType::EmergencyEscalation
        } else if envelope.handler == HandlerKind::Medication {
            AuditEventType::MedicationAnalysis
        } else if redaction.phi_detected {
            AuditEventType::PhiAccess
        } else {
            AuditEventType::HealthcareQuery
        };

        let severity = if emergency {
            AuditSeverity::Critical
        } else if redaction.phi_detected {
            AuditSeverity::High
        } else if envelope.requires_escalation {
            AuditSeverity::Medium
        } else {
            AuditSeverity::Low
        };

        Self {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            session_id: session_id.into(),
            event_type,
            severity,
            handler: envelope.handler,
            query_hash: fingerprint(redacted_query),
            response_hash: fingerprint(&envelope.text),
            risk_tier: redaction.risk_tier,
            redaction,
            urgency: envelope.urgency,
            requires_escalation: envelope.requires_escalation,
            latency_ms: envelope.metadata.latency_ms,
        }
    }

    /// Whether losing this record must be reported to the caller.
    ///
    /// True for high or critical risk tiers, escalations and emergencies.
    pub fn must_persist(&self) -> bool {
        self.risk_tier >= RiskTier::High
            || self.requires_escalation
            || self.handler == HandlerKind::Emergency
    }
}

/// Destination for audit records.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, record: &AuditRecord) -> Result<(), AuditError>;
}

/// Discards every record.
#[derive(Debug, Clone, Default)]
pub struct NoOpAuditSink;

#[async_trait]
impl AuditSink for NoOpAuditSink {
    async fn record(&self, _record: &AuditRecord) -> Result<(), AuditError> {
        Ok(())
    }
}

/// Writes each record as a structured log event.
#[derive(Debug, Clone, Default)]
pub struct LoggingAuditSink;

#[async_trait]
impl AuditSink for LoggingAuditSink {
    async fn record(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let json = serde_json::to_string(record).map_err(|e| AuditError::Rejected(e.to_string()))?;
        tracing::info!(
            event_id = %record.event_id,
            session_id = %record.session_id,
            severity = ?record.severity,
            record = %json,
            "AUDIT_RECORD"
        );
        Ok(())
    }
}

/// Keeps records in memory.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, record: &AuditRecord) -> Result<(), AuditError> {
        self.records.lock().await.push(record.clone());
        Ok(())
    }
}
