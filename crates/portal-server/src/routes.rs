//! Router assembly and handlers.
//!
//! Handlers behind the guard are thin: by the time one runs, the request
//! is authenticated, bound, and authorized, with the subject available
//! as an extension. Upstream data fetching is out of scope here; the
//! handlers return the authorized resource reference.

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::HeaderMap,
    middleware,
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use portal_authz::AuthzError;
use portal_core::SubjectAttributes;

use crate::error::ApiError;
use crate::guard::{self, request_context};
use crate::state::{AppState, removal_cookie};

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/members/{member_id}", get(get_member))
        .route("/api/members/{member_id}/sensitive", get(get_member_sensitive))
        .route("/api/dependents/{dependent_id}", get(get_dependent))
        .route(
            "/api/dependents/{dependent_id}/sensitive",
            get(get_dependent_sensitive),
        )
        .route("/api/documents/{owner_id}", get(list_documents))
        .route("/api/documents/{owner_id}/{document_id}", get(get_document))
        .route("/auth/logout", post(logout))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            guard::authorize_request,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn get_member(
    Path(member_id): Path<String>,
    Extension(subject): Extension<SubjectAttributes>,
) -> Json<Value> {
    Json(json!({
        "memberId": member_id,
        "requestedBy": subject.user_id,
    }))
}

async fn get_member_sensitive(
    Path(member_id): Path<String>,
    Extension(subject): Extension<SubjectAttributes>,
) -> Json<Value> {
    Json(json!({
        "memberId": member_id,
        "sensitive": true,
        "requestedBy": subject.user_id,
    }))
}

async fn get_dependent(
    Path(dependent_id): Path<String>,
    Extension(subject): Extension<SubjectAttributes>,
) -> Json<Value> {
    Json(json!({
        "dependentId": dependent_id,
        "requestedBy": subject.user_id,
    }))
}

async fn get_dependent_sensitive(
    Path(dependent_id): Path<String>,
    Extension(subject): Extension<SubjectAttributes>,
) -> Json<Value> {
    Json(json!({
        "dependentId": dependent_id,
        "sensitive": true,
        "requestedBy": subject.user_id,
    }))
}

async fn list_documents(
    Path(owner_id): Path<String>,
    Extension(subject): Extension<SubjectAttributes>,
) -> Json<Value> {
    Json(json!({
        "ownerId": owner_id,
        "documents": [],
        "requestedBy": subject.user_id,
    }))
}

async fn get_document(
    Path((owner_id, document_id)): Path<(String, String)>,
    Extension(subject): Extension<SubjectAttributes>,
) -> Json<Value> {
    Json(json!({
        "documentId": document_id,
        "ownerId": owner_id,
        "requestedBy": subject.user_id,
    }))
}

/// Destroys the session and clears the cookie.
///
/// Idempotent: an absent or unknown session still clears the cookie and
/// answers 200, so a double-submitted logout never errors at the user.
async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<(CookieJar, Json<Value>), ApiError> {
    let ctx = request_context(&headers, "/auth/logout");

    if let Some(id) = jar
        .get(state.cookie.name.as_str())
        .and_then(|c| Uuid::parse_str(c.value()).ok())
    {
        state
            .security
            .invalidate(id, "user logout", &ctx)
            .await
            .map_err(AuthzError::from)?;
    }

    let jar = jar.add(removal_cookie(&state.cookie));
    Ok((jar, Json(json!({ "status": "logged_out" }))))
}
