//! Auth-type detection and per-request subject construction.
//!
//! HSID subjects are projected from the server-side session; proxy
//! subjects are built from headers the mTLS perimeter already validated.
//! Either way the subject is assembled fresh for every request and every
//! time-scoped input is resolved to a plain flag before evaluation.

use std::sync::Arc;

use axum::http::HeaderMap;
use uuid::Uuid;

use portal_core::{AuthType, Persona, SubjectAttributes};
use portal_session::{BffSession, SessionSecurity};

use crate::AuthzResult;
use crate::error::AuthzError;

/// Operator identifier header set by the trusted proxy perimeter.
pub const HEADER_OPERATOR_ID: &str = "x-operator-id";

/// Operator persona header set by the trusted proxy perimeter.
pub const HEADER_PERSONA: &str = "x-persona";

/// Comma-separated assigned member ids set by the trusted proxy perimeter.
pub const HEADER_ASSIGNED_MEMBERS: &str = "x-assigned-members";

/// Classifies the request's authentication path.
///
/// The operator header wins over a session cookie: a partner system call
/// is never silently downgraded to an end-user session, even if a cookie
/// rides along. Neither signal means the caller is unauthenticated.
#[must_use]
pub fn determine_auth_type(headers: &HeaderMap, has_session_cookie: bool) -> Option<AuthType> {
    if headers.contains_key(HEADER_OPERATOR_ID) {
        return Some(AuthType::Proxy);
    }
    if has_session_cookie {
        return Some(AuthType::Hsid);
    }
    None
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Builds [`SubjectAttributes`] for the two authentication paths.
pub struct SubjectBuilder {
    security: Arc<SessionSecurity>,
}

impl SubjectBuilder {
    /// Creates a builder backed by the session security service.
    #[must_use]
    pub fn new(security: Arc<SessionSecurity>) -> Self {
        Self { security }
    }

    /// Loads the session and projects it into subject attributes.
    ///
    /// Returns the session alongside the subject so the caller can run
    /// binding validation and rotation on the same record.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::AuthenticationRequired`] for a malformed id
    /// or a session miss, and [`AuthzError::Internal`] for store failures
    /// or a corrupt session record.
    pub async fn build_hsid_subject(
        &self,
        session_id: &str,
    ) -> AuthzResult<(BffSession, SubjectAttributes)> {
        let id = Uuid::parse_str(session_id)
            .map_err(|_| AuthzError::authentication_required("malformed session id"))?;

        let session = self
            .security
            .load(id)
            .await?
            .ok_or_else(|| AuthzError::authentication_required("session not found or expired"))?;

        let mut subject = SubjectAttributes::hsid(&session.hsid_uuid, session.persona)
            .map_err(|err| AuthzError::internal(format!("corrupt session record: {err}")))?
            .with_eligibility(session.has_active_eligibility());
        for (member_id, grants) in &session.delegate_grants {
            subject = subject.with_permissions(member_id, grants.iter().copied());
        }

        Ok((session, subject))
    }

    /// Builds a proxy subject from perimeter-validated headers.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::AuthenticationRequired`] when the operator
    /// id or persona header is missing, non-ASCII, or names an unknown or
    /// non-operator persona.
    pub fn build_proxy_subject(&self, headers: &HeaderMap) -> AuthzResult<SubjectAttributes> {
        let operator_id = header_str(headers, HEADER_OPERATOR_ID)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AuthzError::authentication_required("missing operator id header"))?;

        let persona: Persona = header_str(headers, HEADER_PERSONA)
            .ok_or_else(|| AuthzError::authentication_required("missing persona header"))?
            .parse()
            .map_err(|err| AuthzError::authentication_required(format!("{err}")))?;

        let assigned_member_ids: Vec<String> = header_str(headers, HEADER_ASSIGNED_MEMBERS)
            .map(|csv| {
                csv.split(',')
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default();

        SubjectAttributes::proxy(operator_id, persona, assigned_member_ids)
            .map_err(|err| AuthzError::authentication_required(format!("{err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_audit::{AuditLogger, RequestContext};
    use portal_core::Permission;
    use portal_session::{MemorySessionStore, NewSession, RequestBinding, SessionConfig};
    use std::collections::BTreeSet;

    fn builder() -> SubjectBuilder {
        let security = SessionSecurity::new(
            Arc::new(MemorySessionStore::new()),
            SessionConfig::default(),
            Arc::new(AuditLogger::new()),
        );
        SubjectBuilder::new(Arc::new(security))
    }

    fn proxy_headers(operator: &str, persona: &str, assigned: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_OPERATOR_ID, operator.parse().unwrap());
        headers.insert(HEADER_PERSONA, persona.parse().unwrap());
        if let Some(csv) = assigned {
            headers.insert(HEADER_ASSIGNED_MEMBERS, csv.parse().unwrap());
        }
        headers
    }

    #[test]
    fn test_operator_header_wins_over_cookie() {
        let headers = proxy_headers("OP1", "agent", None);
        assert_eq!(determine_auth_type(&headers, true), Some(AuthType::Proxy));
        assert_eq!(
            determine_auth_type(&HeaderMap::new(), true),
            Some(AuthType::Hsid)
        );
        assert_eq!(determine_auth_type(&HeaderMap::new(), false), None);
    }

    #[test]
    fn test_proxy_subject_from_headers() {
        let headers = proxy_headers("OP1", "case_worker", Some("M1, M2,,M3"));
        let subject = builder().build_proxy_subject(&headers).unwrap();

        assert_eq!(subject.auth_type, AuthType::Proxy);
        assert_eq!(subject.persona, Persona::CaseWorker);
        assert_eq!(subject.operator_id.as_deref(), Some("OP1"));
        assert_eq!(subject.assigned_member_ids, vec!["M1", "M2", "M3"]);
    }

    #[test]
    fn test_proxy_subject_rejects_end_user_personas() {
        let headers = proxy_headers("OP1", "parent", None);
        let err = builder().build_proxy_subject(&headers).unwrap_err();
        assert!(err.is_authentication_error());
    }

    #[test]
    fn test_proxy_subject_requires_operator_id() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_PERSONA, "agent".parse().unwrap());
        let err = builder().build_proxy_subject(&headers).unwrap_err();
        assert!(err.is_authentication_error());
    }

    #[tokio::test]
    async fn test_hsid_subject_rejects_malformed_id() {
        let err = builder()
            .build_hsid_subject("not-a-uuid")
            .await
            .unwrap_err();
        assert!(err.is_authentication_error());
    }

    #[tokio::test]
    async fn test_hsid_subject_rejects_unknown_session() {
        let err = builder()
            .build_hsid_subject(&Uuid::new_v4().to_string())
            .await
            .unwrap_err();
        assert!(err.is_authentication_error());
    }

    #[tokio::test]
    async fn test_hsid_subject_projects_session() {
        let security = Arc::new(SessionSecurity::new(
            Arc::new(MemorySessionStore::new()),
            SessionConfig::default(),
            Arc::new(AuditLogger::new()),
        ));

        let mut new = NewSession::individual("hsid-1", "Ada");
        new.persona = Persona::Parent;
        new.delegate_grants.insert(
            "D1".to_string(),
            BTreeSet::from([Permission::Daa, Permission::Rpr]),
        );
        let ctx = RequestContext::sanitized(None, None, None, None);
        let session = security
            .create_session(new, RequestBinding::default(), &ctx)
            .await
            .unwrap();

        let (loaded, subject) = SubjectBuilder::new(security)
            .build_hsid_subject(&session.id.to_string())
            .await
            .unwrap();

        assert_eq!(loaded.id, session.id);
        assert_eq!(subject.auth_type, AuthType::Hsid);
        assert_eq!(subject.persona, Persona::Parent);
        assert_eq!(subject.user_id, "hsid-1");
        assert!(subject.has_all_permissions("D1", portal_core::CAN_VIEW));
        assert!(!subject.has_all_permissions("D1", portal_core::CAN_VIEW_SENSITIVE));
        // No eligibility plans on the session.
        assert!(!subject.eligibility_active);
    }
}
