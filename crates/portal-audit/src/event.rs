//! Audit event model.
//!
//! Field names are a stable contract with the SIEM pipeline; renaming one
//! is a breaking change for downstream detection rules.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::hash::hash_session_id;
use crate::sanitize::{sanitize_correlation_id, sanitize_path, sanitize_user_agent};

/// Kind of decision the event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventType {
    /// A policy engine authorization decision.
    AuthzDecision,
    /// A session was created after a successful login.
    SessionCreated,
    /// A session id was rotated.
    SessionRotated,
    /// A session passed its idle TTL and was removed.
    SessionExpired,
    /// A session was explicitly invalidated (logout or forced).
    SessionInvalidated,
    /// A request's fingerprint did not match the stored session binding.
    SessionBindingFailed,
    /// A binding mismatch pattern consistent with session hijacking.
    SessionHijackDetected,
}

impl AuditEventType {
    /// Returns the stable wire name of this event type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AuthzDecision => "AUTHZ_DECISION",
            Self::SessionCreated => "SESSION_CREATED",
            Self::SessionRotated => "SESSION_ROTATED",
            Self::SessionExpired => "SESSION_EXPIRED",
            Self::SessionInvalidated => "SESSION_INVALIDATED",
            Self::SessionBindingFailed => "SESSION_BINDING_FAILED",
            Self::SessionHijackDetected => "SESSION_HIJACK_DETECTED",
        }
    }
}

/// Outcome classification of the recorded decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditOutcome {
    /// Authorization granted.
    Allow,
    /// Authorization denied by a business rule.
    Deny,
    /// Session operation completed normally.
    Success,
    /// Session operation failed (e.g., session not found).
    Failure,
    /// The request was blocked by a security control.
    Blocked,
    /// The decision pipeline itself failed; treated as a denial.
    Error,
}

impl AuditOutcome {
    /// Returns `true` for outcomes logged at elevated severity.
    #[must_use]
    pub fn is_security_relevant(self) -> bool {
        matches!(self, Self::Blocked | Self::Error)
    }
}

/// Sanitized request context attached to an event.
///
/// Construct via [`RequestContext::sanitized`]; raw client input should
/// never be placed in these fields directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Correlation id (validated or regenerated).
    pub correlation_id: String,

    /// Request path, control-stripped and capped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Client IP as reported by the trusted proxy layer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<String>,

    /// User agent, control-stripped and capped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl RequestContext {
    /// Builds a sanitized context from raw request values.
    #[must_use]
    pub fn sanitized(
        correlation_id: Option<&str>,
        path: Option<&str>,
        client_ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> Self {
        Self {
            correlation_id: sanitize_correlation_id(correlation_id),
            path: path.map(sanitize_path),
            client_ip: client_ip.map(ToString::to_string),
            user_agent: user_agent.map(sanitize_user_agent),
        }
    }
}

/// One immutable audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// What kind of decision this is.
    pub event_type: AuditEventType,

    /// How the decision came out.
    pub outcome: AuditOutcome,

    /// When the decision was made.
    #[serde(with = "time::serde::rfc3339")]
    pub occurred_at: OffsetDateTime,

    /// Correlation id tying the event to a request trace.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,

    /// Truncated SHA-256 of the session id. Never the raw id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id_hash: Option<String>,

    /// Subject identifier (member id or operator id).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,

    /// Auth type of the subject (`HSID`/`PROXY`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_type: Option<String>,

    /// Persona of the subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,

    /// Resource type the decision concerned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,

    /// Resource id the decision concerned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,

    /// Requested action.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    /// Policy that produced the decision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<String>,

    /// Human-readable reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Attribute names whose absence caused a denial.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,

    /// Client IP from the request context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<String>,

    /// Sanitized user agent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Sanitized request path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl AuditEvent {
    /// Creates a new event with the current timestamp.
    #[must_use]
    pub fn new(event_type: AuditEventType, outcome: AuditOutcome) -> Self {
        Self {
            event_type,
            outcome,
            occurred_at: OffsetDateTime::now_utc(),
            correlation_id: None,
            session_id_hash: None,
            subject_id: None,
            auth_type: None,
            persona: None,
            resource_type: None,
            resource_id: None,
            action: None,
            policy_id: None,
            reason: None,
            missing: Vec::new(),
            client_ip: None,
            user_agent: None,
            path: None,
        }
    }

    /// Attaches a session id, storing only its truncated hash.
    #[must_use]
    pub fn with_session_id(mut self, raw_session_id: &str) -> Self {
        self.session_id_hash = Some(hash_session_id(raw_session_id));
        self
    }

    /// Attaches subject identity fields.
    #[must_use]
    pub fn with_subject(
        mut self,
        subject_id: impl Into<String>,
        auth_type: impl Into<String>,
        persona: impl Into<String>,
    ) -> Self {
        self.subject_id = Some(subject_id.into());
        self.auth_type = Some(auth_type.into());
        self.persona = Some(persona.into());
        self
    }

    /// Attaches the resource and action under decision.
    #[must_use]
    pub fn with_target(
        mut self,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        self.resource_type = Some(resource_type.into());
        self.resource_id = Some(resource_id.into());
        self.action = Some(action.into());
        self
    }

    /// Attaches the deciding policy and reason.
    #[must_use]
    pub fn with_policy(
        mut self,
        policy_id: Option<String>,
        reason: impl Into<String>,
        missing: Vec<String>,
    ) -> Self {
        self.policy_id = policy_id;
        self.reason = Some(reason.into());
        self.missing = missing;
        self
    }

    /// Attaches a free-form reason without policy attribution.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches sanitized request context.
    #[must_use]
    pub fn with_request(mut self, ctx: &RequestContext) -> Self {
        self.correlation_id = Some(ctx.correlation_id.clone());
        self.client_ip = ctx.client_ip.clone();
        self.user_agent = ctx.user_agent.clone();
        self.path = ctx.path.clone();
        self
    }

    /// Flattens the event to a `key=value` line.
    ///
    /// Used as the lossless fallback when JSON serialization fails; the
    /// event must reach the trail in some form either way, carrying the
    /// same sanitized fields as the JSON form.
    #[must_use]
    pub fn flatten(&self) -> String {
        fn push_opt(parts: &mut Vec<String>, key: &str, value: &Option<String>) {
            if let Some(v) = value {
                parts.push(format!("{key}={}", v.replace(['\n', '\r', '='], "_")));
            }
        }

        let mut parts = vec![
            format!("event_type={}", self.event_type.as_str()),
            format!("outcome={}", format!("{:?}", self.outcome).to_uppercase()),
        ];
        if let Ok(ts) = self
            .occurred_at
            .format(&time::format_description::well_known::Rfc3339)
        {
            parts.push(format!("occurred_at={ts}"));
        }
        push_opt(&mut parts, "correlation_id", &self.correlation_id);
        push_opt(&mut parts, "session_id_hash", &self.session_id_hash);
        push_opt(&mut parts, "subject_id", &self.subject_id);
        push_opt(&mut parts, "auth_type", &self.auth_type);
        push_opt(&mut parts, "persona", &self.persona);
        push_opt(&mut parts, "resource_type", &self.resource_type);
        push_opt(&mut parts, "resource_id", &self.resource_id);
        push_opt(&mut parts, "action", &self.action);
        push_opt(&mut parts, "policy_id", &self.policy_id);
        push_opt(&mut parts, "reason", &self.reason);
        if !self.missing.is_empty() {
            parts.push(format!("missing={}", self.missing.join(",")));
        }
        push_opt(&mut parts, "client_ip", &self.client_ip);
        push_opt(&mut parts, "user_agent", &self.user_agent);
        push_opt(&mut parts, "path", &self.path);
        parts.join(" ")
    }
}
