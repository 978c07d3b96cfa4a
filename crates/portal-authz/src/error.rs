//! Authorization error types.

use portal_session::SessionError;

/// Errors that can occur while building a subject or running the
/// authorization pipeline.
///
/// Policy denials are not errors; they come back as
/// [`portal_core::PolicyDecision::Deny`]. Errors here are the cases where
/// no decision could be produced at all.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthzError {
    /// The request carries no usable credentials (missing/invalid session,
    /// malformed proxy headers).
    #[error("Authentication required: {message}")]
    AuthenticationRequired {
        /// Description of what was missing or malformed.
        message: String,
    },

    /// A session security control blocked the request.
    #[error("Security incident: session binding rejected")]
    SecurityIncident {
        /// `true` when the pattern was escalated to a suspected hijack.
        hijack: bool,
    },

    /// An unexpected internal failure; treated as a denial upstream.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the failure.
        message: String,
    },
}

impl AuthzError {
    /// Creates a new `AuthenticationRequired` error.
    #[must_use]
    pub fn authentication_required(message: impl Into<String>) -> Self {
        Self::AuthenticationRequired {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if the caller must be treated as unauthenticated.
    #[must_use]
    pub fn is_authentication_error(&self) -> bool {
        matches!(self, Self::AuthenticationRequired { .. })
    }

    /// Returns `true` for a security incident rather than a routine miss.
    #[must_use]
    pub fn is_security_incident(&self) -> bool {
        matches!(self, Self::SecurityIncident { .. })
    }
}

impl From<SessionError> for AuthzError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound => Self::authentication_required("session not found"),
            SessionError::InvalidSessionId => {
                Self::authentication_required("malformed session id")
            }
            SessionError::BindingViolation { hijack } => Self::SecurityIncident { hijack },
            SessionError::Store { message } => Self::internal(message),
        }
    }
}
