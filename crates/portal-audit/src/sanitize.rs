//! Sanitization of free-text fields before they enter the audit trail.
//!
//! Anything that originates from the client (correlation id, user agent,
//! request path) is validated or truncated here, closing log-injection
//! avenues before the event is serialized.

use uuid::Uuid;

/// Maximum accepted correlation id length.
pub const MAX_CORRELATION_ID_LEN: usize = 64;

/// Maximum user agent length kept in events.
pub const MAX_USER_AGENT_LEN: usize = 500;

/// Maximum request path length kept in events.
pub const MAX_PATH_LEN: usize = 2000;

/// Validates an inbound correlation id, regenerating it when unusable.
///
/// Accepted forms: a UUID, or 1-64 characters of `[A-Za-z0-9_-]`.
/// Anything else (including absence) is replaced with a fresh UUID so the
/// trail always carries a usable correlation id.
#[must_use]
pub fn sanitize_correlation_id(raw: Option<&str>) -> String {
    if let Some(value) = raw {
        if Uuid::parse_str(value).is_ok() {
            return value.to_string();
        }
        if !value.is_empty()
            && value.len() <= MAX_CORRELATION_ID_LEN
            && value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return value.to_string();
        }
    }
    Uuid::new_v4().to_string()
}

/// Strips control characters and caps the user agent at 500 characters.
#[must_use]
pub fn sanitize_user_agent(raw: &str) -> String {
    strip_and_truncate(raw, MAX_USER_AGENT_LEN)
}

/// Strips control characters and caps the request path at 2000 characters.
#[must_use]
pub fn sanitize_path(raw: &str) -> String {
    strip_and_truncate(raw, MAX_PATH_LEN)
}

fn strip_and_truncate(raw: &str, max_len: usize) -> String {
    raw.chars()
        .filter(|c| !c.is_control())
        .take(max_len)
        .collect()
}
