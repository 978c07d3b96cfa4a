//! Error to HTTP response mapping.
//!
//! Internal failures and security incidents deliberately collapse into a
//! generic 403: the response never tells a probing client whether it hit
//! a bug, a tripwire, or a rule.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use portal_authz::AuthzError;
use portal_core::{DenyReason, PolicyDecision};

/// HTTP-facing error for guarded routes.
#[derive(Debug)]
pub enum ApiError {
    /// 401: no usable credentials.
    AuthRequired {
        /// Description for the response body.
        message: String,
    },
    /// 403 with a structured denial body.
    Denied(DenyReason),
    /// 403 with a generic body (incidents, internal failures).
    Forbidden,
}

impl ApiError {
    /// Creates an authentication-required error.
    #[must_use]
    pub fn auth_required(message: impl Into<String>) -> Self {
        Self::AuthRequired {
            message: message.into(),
        }
    }

    /// Maps an engine decision that was not an allow.
    ///
    /// Error-classified denials hide their detail behind the generic 403.
    #[must_use]
    pub fn from_decision(decision: PolicyDecision) -> Self {
        if decision.is_error() {
            return Self::Forbidden;
        }
        match decision {
            PolicyDecision::Deny(reason) => Self::Denied(reason),
            _ => Self::Forbidden,
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::AuthenticationRequired { message } => Self::AuthRequired { message },
            AuthzError::SecurityIncident { hijack } => {
                tracing::warn!(hijack, "Request blocked by session security");
                Self::Forbidden
            }
            AuthzError::Internal { message } => {
                tracing::error!(%message, "Authorization pipeline failure");
                Self::Forbidden
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::AuthRequired { message } => (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "AUTH_REQUIRED",
                    "message": message,
                })),
            )
                .into_response(),
            Self::Denied(reason) => (
                StatusCode::FORBIDDEN,
                Json(json!({
                    "error": "ACCESS_DENIED",
                    "code": reason.policy_id.unwrap_or(reason.code),
                    "message": reason.message,
                    "missing": reason.missing,
                })),
            )
                .into_response(),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                Json(json!({
                    "error": "ACCESS_DENIED",
                    "message": "access denied",
                })),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::PolicyDecision;

    #[test]
    fn test_authz_error_mapping() {
        assert!(matches!(
            ApiError::from(AuthzError::authentication_required("no cookie")),
            ApiError::AuthRequired { .. }
        ));
        assert!(matches!(
            ApiError::from(AuthzError::SecurityIncident { hijack: true }),
            ApiError::Forbidden
        ));
        assert!(matches!(
            ApiError::from(AuthzError::internal("store down")),
            ApiError::Forbidden
        ));
    }

    #[test]
    fn test_business_denial_keeps_detail() {
        let decision = PolicyDecision::deny(
            "PARENT_VIEW_DOCUMENT",
            "missing consent",
            vec!["ROI".to_string()],
        );
        match ApiError::from_decision(decision) {
            ApiError::Denied(reason) => {
                assert_eq!(reason.policy_id.as_deref(), Some("PARENT_VIEW_DOCUMENT"));
                assert_eq!(reason.missing, vec!["ROI"]);
            }
            other => panic!("expected denial, got {other:?}"),
        }
    }

    #[test]
    fn test_error_denial_is_generic() {
        let decision =
            PolicyDecision::Deny(portal_core::DenyReason::policy_error(None, "panicked"));
        assert!(matches!(
            ApiError::from_decision(decision),
            ApiError::Forbidden
        ));
    }
}
