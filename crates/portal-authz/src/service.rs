//! The authorization façade controllers call.
//!
//! Wraps the policy engine with the audit obligation: every decision is
//! recorded, allow and deny alike, before it is returned to the caller.

use std::sync::Arc;

use portal_audit::{AuditEvent, AuditEventType, AuditLogger, AuditOutcome, RequestContext};
use portal_core::{Action, PolicyDecision, ResourceAttributes, SubjectAttributes};

use crate::policy::PolicyEngine;

/// Authorization service: evaluate, audit, return.
pub struct AuthorizationService {
    engine: PolicyEngine,
    audit: Arc<AuditLogger>,
}

impl AuthorizationService {
    /// Creates the service over the production policy set.
    #[must_use]
    pub fn new(audit: Arc<AuditLogger>) -> Self {
        Self::with_engine(PolicyEngine::new(), audit)
    }

    /// Creates the service over an explicit engine.
    #[must_use]
    pub fn with_engine(engine: PolicyEngine, audit: Arc<AuditLogger>) -> Self {
        Self { engine, audit }
    }

    /// Evaluates the request and records the decision in the audit trail.
    ///
    /// `session_id`, when present, is hashed into the event; the raw id
    /// never reaches the trail.
    #[must_use]
    pub fn authorize(
        &self,
        subject: &SubjectAttributes,
        resource: &ResourceAttributes,
        action: Action,
        ctx: &RequestContext,
        session_id: Option<&str>,
    ) -> PolicyDecision {
        let decision = self.engine.authorize(subject, resource, action);

        let outcome = if decision.is_allowed() {
            AuditOutcome::Allow
        } else if decision.is_error() {
            AuditOutcome::Error
        } else {
            AuditOutcome::Deny
        };

        let (reason, missing) = match &decision {
            PolicyDecision::Allow { reason, .. } => (reason.clone(), Vec::new()),
            PolicyDecision::Deny(deny) => (deny.message.clone(), deny.missing.clone()),
            PolicyDecision::NotApplicable => (String::from("no decision"), Vec::new()),
        };

        let mut event = AuditEvent::new(AuditEventType::AuthzDecision, outcome)
            .with_subject(
                &subject.user_id,
                subject.auth_type.to_string(),
                subject.persona.as_str(),
            )
            .with_target(resource.resource_type.to_string(), &resource.id, action.as_str())
            .with_policy(decision.policy_id().map(ToString::to_string), reason, missing)
            .with_request(ctx);
        if let Some(raw) = session_id {
            event = event.with_session_id(raw);
        }
        self.audit.log(&event);

        decision
    }
}
