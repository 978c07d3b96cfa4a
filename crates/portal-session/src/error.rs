//! Session error types.

/// Errors that can occur during session operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    /// The session id does not exist or has expired.
    #[error("Session not found")]
    NotFound,

    /// The session id is not a well-formed UUID.
    #[error("Invalid session id")]
    InvalidSessionId,

    /// The request's fingerprint does not match the stored binding.
    #[error("Session binding validation failed")]
    BindingViolation {
        /// `true` when the mismatch pattern was escalated to a suspected
        /// hijack rather than a soft binding failure.
        hijack: bool,
    },

    /// The backing store failed.
    #[error("Session store error: {message}")]
    Store {
        /// Description of the store failure.
        message: String,
    },
}

impl SessionError {
    /// Creates a new `Store` error.
    #[must_use]
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Returns `true` if the error means the caller must be treated as
    /// unauthenticated.
    #[must_use]
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            Self::NotFound | Self::InvalidSessionId | Self::BindingViolation { .. }
        )
    }

    /// Returns `true` for a security incident rather than a routine miss.
    #[must_use]
    pub fn is_security_incident(&self) -> bool {
        matches!(self, Self::BindingViolation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates() {
        assert!(SessionError::NotFound.is_authentication_failure());
        assert!(SessionError::InvalidSessionId.is_authentication_failure());
        assert!(SessionError::BindingViolation { hijack: true }.is_security_incident());
        assert!(!SessionError::store("down").is_authentication_failure());
        assert!(!SessionError::NotFound.is_security_incident());
    }
}
