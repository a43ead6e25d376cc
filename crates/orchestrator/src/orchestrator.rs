//! Main orchestrator that runs every query through the care pipeline.

use std::sync::Arc;
use std::time::Instant;

use brain_core::Brain;
use care_agents::emergency::fallback_envelope;
use care_agents::{
    postprocess, ClinicalHandler, CulturalHandler, EmergencyHandler, Generator, Handler,
    HandlerKind, HandlerRequest, MedicationHandler, RedactionFlags, ResponseEnvelope,
};
use care_core::{Classification, Intent, Query, QueryContext};
use openai_brain::OpenAiBrain;
use phi_redactor::Redactor;
use tracing::{debug, error, info, warn};

use crate::audit::{AuditRecord, AuditSink, LoggingAuditSink, NoOpAuditSink};
use crate::config::OrchestratorConfig;
use crate::context_store::{ContextStore, InMemoryContextStore};
use crate::error::OrchestratorError;
use crate::supervisor::Supervisor;

/// Token limit for supervisor classification replies.
const SUPERVISOR_MAX_TOKENS: u32 = 256;

/// Main orchestrator that coordinates query processing.
///
/// The orchestrator:
/// - Redacts PHI once, before anything else sees the text
/// - Classifies and routes through the [`Supervisor`]
/// - Re-routes to the emergency handler when a handler rejects on severity
/// - Post-processes, attaches metadata and latency
/// - Audits every envelope, escalating audit loss for high-risk interactions
///
/// It holds no per-query state and can serve many queries concurrently.
pub struct Orchestrator {
    redactor: Redactor,
    supervisor: Supervisor,
    medication: Handler,
    emergency: Handler,
    clinical: Handler,
    cultural: Handler,
    audit: Arc<dyn AuditSink>,
    contexts: Arc<dyn ContextStore>,
}

impl Orchestrator {
    /// Create an orchestrator over one backend.
    ///
    /// Audit records are discarded and the context store is empty until
    /// replaced with [`with_audit_sink`](Self::with_audit_sink) and
    /// [`with_context_store`](Self::with_context_store).
    pub fn new(brain: Arc<dyn Brain>, config: OrchestratorConfig) -> Self {
        let generator = Generator::new(brain.clone(), &config.handler);

        let supervisor = if config.classify_with_backend {
            let supervisor_config = config
                .handler
                .clone()
                .with_temperature(0.0)
                .with_max_tokens(SUPERVISOR_MAX_TOKENS);
            Supervisor::new(Some(Generator::new(brain, &supervisor_config)))
        } else {
            Supervisor::rule_based()
        };

        Self {
            redactor: Redactor::new(),
            supervisor,
            medication: Handler::Medication(MedicationHandler::new(generator.clone())),
            emergency: Handler::Emergency(EmergencyHandler::new(generator.clone())),
            clinical: Handler::Clinical(ClinicalHandler::new(generator.clone())),
            cultural: Handler::CulturallyLocalized(CulturalHandler::new(generator)),
            audit: Arc::new(NoOpAuditSink),
            contexts: Arc::new(InMemoryContextStore::new()),
        }
    }

    /// Create an orchestrator from environment variables.
    ///
    /// Uses the OpenAI-compatible backend and logs audit records.
    pub fn from_env() -> Result<Self, OrchestratorError> {
        let brain = OpenAiBrain::from_env()?;
        let config = OrchestratorConfig::from_env();
        Ok(Self::new(Arc::new(brain), config).with_audit_sink(Arc::new(LoggingAuditSink)))
    }

    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_context_store(mut self, contexts: Arc<dyn ContextStore>) -> Self {
        self.contexts = contexts;
        self
    }

    pub fn with_supervisor(mut self, supervisor: Supervisor) -> Self {
        self.supervisor = supervisor;
        self
    }

    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    pub fn handler(&self, kind: HandlerKind) -> &Handler {
        match kind {
            HandlerKind::Medication => &self.medication,
            HandlerKind::Emergency => &self.emergency,
            HandlerKind::Clinical => &self.clinical,
            HandlerKind::CulturallyLocalized => &self.cultural,
        }
    }

    /// Process a query, loading its context from the context store.
    ///
    /// Store failures degrade to an empty context.
    pub async fn process_session(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<ResponseEnvelope, OrchestratorError> {
        let context = match self.contexts.load(session_id).await {
            Ok(Some(context)) => context,
            Ok(None) => QueryContext::default(),
            Err(e) => {
                warn!(error = %e, session_id, "CONTEXT_STORE_ERROR");
                QueryContext::default()
            }
        };
        self.process(Query::new(session_id, text).with_context(context))
            .await
    }

    /// Process one query end-to-end.
    ///
    /// 1. Redact
    /// 2. Classify and route
    /// 3. Check capability, re-routing severity rejections to emergency.
    ///    An emergency the handler cannot serve finishes with the safety fallback.
    /// 4. Enhance context
    /// 5. Handle, post-process, attach metadata, audit
    ///
    /// Step 5 runs in its own task on the emergency path so that dropping
    /// this future does not abandon it.
    pub async fn process(&self, query: Query) -> Result<ResponseEnvelope, OrchestratorError> {
        let started = Instant::now();
        let Query {
            text,
            session_id,
            context,
        } = query;

        let redaction = self.redactor.detect(&text);
        let flags = RedactionFlags::from(&redaction);
        let redacted = redaction.redacted_text;
        info!(
            session_id = %session_id,
            phi_detected = flags.phi_detected,
            identifiers = flags.identifier_count,
            risk_tier = flags.risk_tier.as_str(),
            "QUERY_REDACTED"
        );

        let classification = self.supervisor.classify(&redacted, &context).await;
        let routed = self.supervisor.route(&classification);
        info!(
            session_id = %session_id,
            intent = %classification.primary_intent,
            urgency = classification.urgency,
            handler = %routed,
            summary = Supervisor::routing_summary(&classification),
            "QUERY_ROUTED"
        );

        let Selection {
            handler,
            rerouted_from,
            fallback_only,
        } = self.select_handler(routed, &classification)?;
        let context = handler.enhance_context(&context, &classification);

        let completion = Completion {
            handler: handler.clone(),
            request: HandlerRequest::new(redacted, context, classification),
            session_id,
            flags,
            rerouted_from,
            started,
            audit: self.audit.clone(),
        };

        if handler.kind() != HandlerKind::Emergency {
            return completion.run().await;
        }

        let fallback = completion.fallback_parts();
        let task = if fallback_only {
            tokio::spawn(fallback.clone().run())
        } else {
            tokio::spawn(completion.run())
        };
        match task.await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "EMERGENCY_TASK_FAILED");
                fallback.run().await
            }
        }
    }

    /// Apply the capability check. Severity rejections go to emergency.
    ///
    /// Emergencies are never rejected: when the emergency handler cannot
    /// serve the query, the selection finishes with the safety fallback.
    fn select_handler(
        &self,
        routed: HandlerKind,
        classification: &Classification,
    ) -> Result<Selection<'_>, OrchestratorError> {
        let language = &classification.language;
        let urgency = classification.urgency;
        let handler = self.handler(routed);

        match handler.check_capability(language, urgency) {
            Ok(()) => Ok(Selection::direct(handler)),
            Err(e) if e.is_severity_rejection() => {
                info!(from = %routed, reason = %e, "CAPABILITY_REROUTE");
                Ok(Selection {
                    handler: &self.emergency,
                    rerouted_from: Some(routed),
                    fallback_only: self.emergency.check_capability(language, urgency).is_err(),
                })
            }
            Err(e)
                if routed == HandlerKind::Emergency
                    || classification.primary_intent == Intent::Emergency =>
            {
                warn!(handler = %routed, reason = %e, "EMERGENCY_CAPABILITY_FALLBACK");
                Ok(Selection {
                    handler: &self.emergency,
                    rerouted_from: (routed != HandlerKind::Emergency).then_some(routed),
                    fallback_only: true,
                })
            }
            Err(e) => {
                warn!(handler = %routed, reason = %e, "CAPABILITY_EXCEEDED");
                Err(OrchestratorError::CapabilityExceeded(e))
            }
        }
    }
}

/// Handler chosen after the capability check.
#[derive(Debug)]
struct Selection<'a> {
    handler: &'a Handler,
    rerouted_from: Option<HandlerKind>,
    /// Skip the handler and finish with the emergency safety fallback.
    fallback_only: bool,
}

impl<'a> Selection<'a> {
    fn direct(handler: &'a Handler) -> Self {
        Self {
            handler,
            rerouted_from: None,
            fallback_only: false,
        }
    }
}

/// Everything needed to finish one query, owned so it can move into a task.
#[derive(Clone)]
struct Completion {
    handler: Handler,
    request: HandlerRequest,
    session_id: String,
    flags: RedactionFlags,
    rerouted_from: Option<HandlerKind>,
    started: Instant,
    audit: Arc<dyn AuditSink>,
}

impl Completion {
    async fn run(self) -> Result<ResponseEnvelope, OrchestratorError> {
        let envelope = self.handler.handle(&self.request).await;
        self.finish(envelope).await
    }

    /// A copy that finishes with the emergency fallback instead of the handler.
    fn fallback_parts(&self) -> EmergencyFallback {
        EmergencyFallback(self.clone())
    }

    async fn finish(self, envelope: ResponseEnvelope) -> Result<ResponseEnvelope, OrchestratorError> {
        let classification = &self.request.classification;
        let mut envelope = postprocess(envelope, classification);

        let metadata = &mut envelope.metadata;
        metadata.redaction = self.flags;
        metadata.entities = classification.entities.clone();
        metadata.urgency_signals = classification.signals.iter().map(|s| s.label.clone()).collect();
        metadata.classification_reasoning = classification.reasoning.clone();
        metadata.rerouted_from = self.rerouted_from;
        metadata.latency_ms = self.started.elapsed().as_millis() as u64;

        let record = AuditRecord::new(&self.session_id, &self.request.text, &envelope);
        match self.audit.record(&record).await {
            Ok(()) => debug!(event_id = %record.event_id, "AUDIT_RECORDED"),
            Err(e) if record.must_persist() => {
                error!(
                    error = %e,
                    event_id = %record.event_id,
                    severity = ?record.severity,
                    "AUDIT_WRITE_FAILED"
                );
                return Err(OrchestratorError::AuditWriteFailure {
                    source: e,
                    envelope: Box::new(envelope),
                });
            }
            Err(e) => warn!(error = %e, event_id = %record.event_id, "AUDIT_WRITE_FAILED"),
        }

        info!(
            session_id = %self.session_id,
            handler = %envelope.handler,
            confidence = envelope.confidence,
            urgency = envelope.urgency,
            escalation = envelope.requires_escalation,
            degraded = envelope.metadata.degraded,
            latency_ms = envelope.metadata.latency_ms,
            "QUERY_PROCESSED"
        );
        Ok(envelope)
    }
}

/// Emergency completion used when the handler task panics or cannot serve the query.
#[derive(Clone)]
struct EmergencyFallback(Completion);

impl EmergencyFallback {
    async fn run(self) -> Result<ResponseEnvelope, OrchestratorError> {
        let envelope = fallback_envelope(self.0.request.classification.urgency);
        self.0.finish(envelope).await
    }
}
