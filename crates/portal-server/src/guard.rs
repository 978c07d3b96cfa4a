//! Declarative route guards.
//!
//! Access rules live in one static table instead of being scattered
//! through handlers: each guarded prefix maps the remaining path to a
//! resource and action, and one middleware runs the full pipeline
//! (auth-type detection, subject construction, binding validation,
//! rotation, policy evaluation) before the handler is reached. A path
//! with no table entry passes through unguarded, so every data route
//! must have an entry.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use portal_audit::RequestContext;
use portal_authz::{AuthzError, determine_auth_type};
use portal_core::{Action, AuthType, ResourceAttributes, Sensitivity};
use portal_session::{BffSession, RequestBinding, SessionError};

use crate::error::ApiError;
use crate::state::{AppState, session_cookie};

/// One guarded route prefix.
pub struct RouteGuard {
    /// Path prefix, including the trailing slash.
    pub prefix: &'static str,

    /// Maps the path remainder to the resource and action under decision.
    pub parse: fn(&str) -> Option<(ResourceAttributes, Action)>,
}

/// The guard table. Order matters only if prefixes overlap.
pub static ROUTE_GUARDS: &[RouteGuard] = &[
    RouteGuard {
        prefix: "/api/members/",
        parse: parse_member,
    },
    RouteGuard {
        prefix: "/api/dependents/",
        parse: parse_dependent,
    },
    RouteGuard {
        prefix: "/api/documents/",
        parse: parse_document,
    },
];

/// Resolves a request path against the guard table.
#[must_use]
pub fn guard_for(path: &str) -> Option<(ResourceAttributes, Action)> {
    ROUTE_GUARDS
        .iter()
        .find_map(|guard| path.strip_prefix(guard.prefix).and_then(|rest| (guard.parse)(rest)))
}

fn segments(rest: &str) -> Vec<&str> {
    rest.split('/').filter(|s| !s.is_empty()).collect()
}

fn parse_member(rest: &str) -> Option<(ResourceAttributes, Action)> {
    match segments(rest).as_slice() {
        [id] => Some((ResourceAttributes::member(*id), Action::View)),
        [id, "sensitive"] => Some((ResourceAttributes::member(*id), Action::ViewSensitive)),
        _ => None,
    }
}

fn parse_dependent(rest: &str) -> Option<(ResourceAttributes, Action)> {
    match segments(rest).as_slice() {
        [id] => Some((
            ResourceAttributes::dependent(*id, Sensitivity::Normal),
            Action::View,
        )),
        [id, "sensitive"] => Some((
            ResourceAttributes::dependent(*id, Sensitivity::Normal),
            Action::ViewSensitive,
        )),
        _ => None,
    }
}

fn parse_document(rest: &str) -> Option<(ResourceAttributes, Action)> {
    match segments(rest).as_slice() {
        [owner_id] => Some((
            ResourceAttributes::document(*owner_id, *owner_id),
            Action::List,
        )),
        [owner_id, document_id] => Some((
            ResourceAttributes::document(*document_id, *owner_id),
            Action::View,
        )),
        _ => None,
    }
}

/// First address in `X-Forwarded-For`, as set by the trusted edge proxy.
pub(crate) fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Builds the sanitized audit context for the current request.
pub(crate) fn request_context(headers: &HeaderMap, path: &str) -> RequestContext {
    RequestContext::sanitized(
        headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some(path),
        client_ip(headers).as_deref(),
        headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok()),
    )
}

fn request_binding(headers: &HeaderMap) -> RequestBinding {
    RequestBinding::new(
        client_ip(headers),
        headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string),
    )
}

/// The guard middleware: authenticate, authorize, then run the handler.
///
/// An HSID session due for rotation is rotated only after the request
/// is allowed, and the successor cookie is set on the response; a
/// denial must leave the current id untouched or the client would be
/// stranded holding a cookie for a dead session.
pub async fn authorize_request(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = req.uri().path().to_string();
    let Some((resource, action)) = guard_for(&path) else {
        return Ok(next.run(req).await);
    };

    let headers = req.headers().clone();
    let raw_session_id = jar
        .get(state.cookie.name.as_str())
        .map(|c| c.value().to_string());
    let ctx = request_context(&headers, &path);
    let binding = request_binding(&headers);

    let auth_type = determine_auth_type(&headers, raw_session_id.is_some())
        .ok_or_else(|| ApiError::auth_required("no credentials presented"))?;

    let mut hsid_session: Option<BffSession> = None;
    let (subject, session_id) = match auth_type {
        AuthType::Proxy => (state.subjects.build_proxy_subject(&headers)?, None),
        AuthType::Hsid => {
            let raw = raw_session_id
                .ok_or_else(|| ApiError::auth_required("missing session cookie"))?;
            let (session, subject) = state.subjects.build_hsid_subject(&raw).await?;
            state
                .security
                .validate_binding(&session, &binding, &ctx)
                .await
                .map_err(AuthzError::from)?;
            hsid_session = Some(session);
            (subject, Some(raw))
        }
    };

    let decision = state
        .authz
        .authorize(&subject, &resource, action, &ctx, session_id.as_deref());
    if !decision.is_allowed() {
        return Err(ApiError::from_decision(decision));
    }

    let mut rotated: Option<BffSession> = None;
    if let Some(session) = &hsid_session {
        if state.security.needs_rotation(session) {
            match state.security.rotate(session, &ctx).await {
                Ok(successor) => rotated = Some(successor),
                // Lost a rotation race; the winner's response carries
                // the successor cookie.
                Err(SessionError::NotFound) => {}
                Err(err) => return Err(AuthzError::from(err).into()),
            }
        }
    }

    req.extensions_mut().insert(subject);
    let mut response = next.run(req).await;

    if let Some(successor) = rotated {
        let cookie = session_cookie(&state.cookie, &successor.id.to_string());
        if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::ResourceType;

    #[test]
    fn test_member_routes() {
        let (resource, action) = guard_for("/api/members/M1").unwrap();
        assert_eq!(resource.resource_type, ResourceType::Member);
        assert_eq!(resource.id, "M1");
        assert_eq!(action, Action::View);

        let (_, action) = guard_for("/api/members/M1/sensitive").unwrap();
        assert_eq!(action, Action::ViewSensitive);
    }

    #[test]
    fn test_dependent_routes() {
        let (resource, action) = guard_for("/api/dependents/D1").unwrap();
        assert_eq!(resource.resource_type, ResourceType::Dependent);
        assert_eq!(resource.owner_id, "D1");
        assert_eq!(action, Action::View);

        let (_, action) = guard_for("/api/dependents/D1/sensitive").unwrap();
        assert_eq!(action, Action::ViewSensitive);
    }

    #[test]
    fn test_document_routes() {
        let (resource, action) = guard_for("/api/documents/M1").unwrap();
        assert_eq!(resource.resource_type, ResourceType::Document);
        assert_eq!(resource.owner_id, "M1");
        assert_eq!(action, Action::List);

        let (resource, action) = guard_for("/api/documents/M1/doc-9").unwrap();
        assert_eq!(resource.id, "doc-9");
        assert_eq!(resource.owner_id, "M1");
        assert_eq!(action, Action::View);
    }

    #[test]
    fn test_unguarded_paths_have_no_entry() {
        assert!(guard_for("/health").is_none());
        assert!(guard_for("/auth/logout").is_none());
        assert!(guard_for("/api/members/").is_none());
        assert!(guard_for("/api/documents/M1/doc-9/extra").is_none());
    }

    #[test]
    fn test_client_ip_takes_first_forwarded_entry() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            "203.0.113.9, 10.0.0.1".parse().unwrap(),
        );
        assert_eq!(client_ip(&headers).as_deref(), Some("203.0.113.9"));
        assert!(client_ip(&HeaderMap::new()).is_none());
    }
}
