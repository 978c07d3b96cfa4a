//! Shared application state and session cookie construction.

use std::sync::Arc;

use cookie::{Cookie, SameSite};

use portal_audit::{AuditLogger, RequestContext};
use portal_authz::{AuthorizationService, SubjectBuilder};
use portal_session::{
    BffSession, CookieConfig, NewSession, RequestBinding, SessionError, SessionSecurity,
};

/// State shared by the route guard and the handlers.
#[derive(Clone)]
pub struct AppState {
    /// Session security service (binding, rotation, invalidation).
    pub security: Arc<SessionSecurity>,

    /// Per-request subject construction.
    pub subjects: Arc<SubjectBuilder>,

    /// Policy evaluation plus audit.
    pub authz: Arc<AuthorizationService>,

    /// Session cookie settings.
    pub cookie: CookieConfig,
}

impl AppState {
    /// Wires the state from the session security service and audit logger.
    #[must_use]
    pub fn new(security: Arc<SessionSecurity>, audit: Arc<AuditLogger>, cookie: CookieConfig) -> Self {
        Self {
            subjects: Arc::new(SubjectBuilder::new(Arc::clone(&security))),
            authz: Arc::new(AuthorizationService::new(audit)),
            security,
            cookie,
        }
    }

    /// Completes a login: creates the bound session and returns it with
    /// the cookie to set.
    ///
    /// The OIDC code exchange happens upstream; this is the hand-off
    /// point once the identity payload is assembled.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store write fails.
    pub async fn establish_session(
        &self,
        new: NewSession,
        binding: RequestBinding,
        ctx: &RequestContext,
    ) -> Result<(BffSession, Cookie<'static>), SessionError> {
        let session = self.security.create_session(new, binding, ctx).await?;
        let cookie = session_cookie(&self.cookie, &session.id.to_string());
        Ok((session, cookie))
    }
}

/// Builds the session cookie with the configured attributes.
#[must_use]
pub fn session_cookie(config: &CookieConfig, value: &str) -> Cookie<'static> {
    let mut builder = Cookie::build((config.name.clone(), value.to_string()))
        .path("/")
        .http_only(config.http_only)
        .secure(config.secure)
        .same_site(parse_same_site(&config.same_site));
    if let Some(domain) = &config.domain {
        builder = builder.domain(domain.clone());
    }
    builder.build()
}

/// Builds the expired cookie that clears the session on the client.
#[must_use]
pub fn removal_cookie(config: &CookieConfig) -> Cookie<'static> {
    let mut cookie = session_cookie(config, "");
    cookie.make_removal();
    cookie
}

fn parse_same_site(value: &str) -> SameSite {
    match value.to_ascii_lowercase().as_str() {
        "strict" => SameSite::Strict,
        "none" => SameSite::None,
        _ => SameSite::Lax,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_attributes_follow_config() {
        let config = CookieConfig::default();
        let cookie = session_cookie(&config, "abc");

        assert_eq!(cookie.name(), "BFF_SESSION");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.domain(), None);
    }

    #[test]
    fn test_same_site_parsing_defaults_to_lax() {
        assert_eq!(parse_same_site("strict"), SameSite::Strict);
        assert_eq!(parse_same_site("None"), SameSite::None);
        assert_eq!(parse_same_site("weird"), SameSite::Lax);
    }

    #[test]
    fn test_removal_cookie_is_expired() {
        let cookie = removal_cookie(&CookieConfig::default());
        assert_eq!(cookie.name(), "BFF_SESSION");
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(cookie::time::Duration::ZERO));
    }
}
