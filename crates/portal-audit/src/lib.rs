//! # portal-audit
//!
//! Structured, sanitized audit trail for authorization and session
//! security decisions.
//!
//! Every decision the BFF makes (policy allow/deny, session creation,
//! binding failures, rotation, invalidation) is recorded as an immutable
//! [`AuditEvent`] and emitted as single-line JSON on the dedicated
//! `audit` tracing target for SIEM ingestion.
//!
//! Ground rules:
//!
//! - Raw session identifiers never appear in events; a truncated SHA-256
//!   hash is stored instead ([`hash_session_id`]).
//! - Free-text request fields (correlation id, user agent, path) are
//!   validated and truncated before inclusion ([`sanitize`]).
//! - A serialization failure must not lose the event: the logger falls
//!   back to a flattened `key=value` line with the same sanitization.

pub mod event;
pub mod hash;
pub mod logger;
pub mod sanitize;

pub use event::{AuditEvent, AuditEventType, AuditOutcome, RequestContext};
pub use hash::hash_session_id;
pub use logger::AuditLogger;
