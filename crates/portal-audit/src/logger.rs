//! Audit event emission.

use crate::event::{AuditEvent, AuditOutcome};

/// Dedicated tracing target for the audit channel.
///
/// The SIEM shipper subscribes to this target; application logs stay on
/// the default target.
pub const AUDIT_TARGET: &str = "audit";

/// Emits audit events as single-line JSON on the audit channel.
///
/// Severity routing: allow/success at info, deny/failure at warn,
/// blocked/error at error. If JSON serialization fails the event is
/// emitted as a flattened `key=value` line instead; events are never
/// dropped.
#[derive(Debug, Clone, Default)]
pub struct AuditLogger {
    /// Suppress allow/success events (high-volume environments).
    log_successes: bool,
}

impl AuditLogger {
    /// Creates a logger that records every outcome.
    #[must_use]
    pub fn new() -> Self {
        Self {
            log_successes: true,
        }
    }

    /// Controls whether allow/success events are recorded.
    #[must_use]
    pub fn with_success_logging(mut self, enabled: bool) -> Self {
        self.log_successes = enabled;
        self
    }

    /// Records one event.
    pub fn log(&self, event: &AuditEvent) {
        if !self.log_successes
            && matches!(event.outcome, AuditOutcome::Allow | AuditOutcome::Success)
        {
            return;
        }

        let line = match serde_json::to_string(event) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "Audit event serialization failed, using fallback");
                event.flatten()
            }
        };

        match event.outcome {
            AuditOutcome::Allow | AuditOutcome::Success => {
                tracing::info!(target: AUDIT_TARGET, event = %line);
            }
            AuditOutcome::Deny | AuditOutcome::Failure => {
                tracing::warn!(target: AUDIT_TARGET, event = %line);
            }
            AuditOutcome::Blocked | AuditOutcome::Error => {
                tracing::error!(target: AUDIT_TARGET, event = %line);
            }
        }
    }
}
