//! Session security service.
//!
//! Owns the security-relevant parts of the session lifecycle:
//!
//! - creation at the login callback, capturing the client fingerprint
//! - binding validation on every request (hijack/replay detection)
//! - id rotation once a session reaches a configured age
//! - explicit invalidation with cross-instance fan-out
//!
//! Every transition emits an audit event. Binding failures block the
//! request and destroy the session; the caller must treat the bearer as
//! unauthenticated.

use std::sync::Arc;

use time::OffsetDateTime;
use tokio::sync::broadcast;
use uuid::Uuid;

use portal_audit::{AuditEvent, AuditEventType, AuditLogger, AuditOutcome, RequestContext};

use crate::SessionResult;
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::model::{BffSession, NewSession, SessionBinding};
use crate::store::SessionStore;

/// Fingerprint of the current request, compared against the stored
/// session binding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestBinding {
    /// Client IP as reported by the trusted proxy layer.
    pub client_ip: Option<String>,

    /// Browser fingerprint derived from the user agent.
    pub browser_fingerprint: Option<String>,
}

impl RequestBinding {
    /// Builds a request binding from raw values.
    #[must_use]
    pub fn new(client_ip: Option<String>, browser_fingerprint: Option<String>) -> Self {
        Self {
            client_ip,
            browser_fingerprint,
        }
    }
}

/// Capacity of the invalidation fan-out channel.
const INVALIDATION_CHANNEL_CAPACITY: usize = 256;

/// Session security service.
///
/// The store is the single source of truth; this service layers the
/// security state machine on top of it.
pub struct SessionSecurity {
    store: Arc<dyn SessionStore>,
    config: SessionConfig,
    audit: Arc<AuditLogger>,
    invalidations: broadcast::Sender<Uuid>,
}

impl SessionSecurity {
    /// Creates the service.
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>, config: SessionConfig, audit: Arc<AuditLogger>) -> Self {
        let (invalidations, _) = broadcast::channel(INVALIDATION_CHANNEL_CAPACITY);
        Self {
            store,
            config,
            audit,
            invalidations,
        }
    }

    /// Returns the active session configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Creates a session after a successful login callback, binding the
    /// current client fingerprint.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub async fn create_session(
        &self,
        new: NewSession,
        binding: RequestBinding,
        ctx: &RequestContext,
    ) -> SessionResult<BffSession> {
        let now = OffsetDateTime::now_utc();
        let session = BffSession {
            id: Uuid::new_v4(),
            hsid_uuid: new.hsid_uuid,
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            persona: new.persona,
            delegate_grants: new.delegate_grants,
            managed_members: new.managed_members,
            eligibility_plans: new.eligibility_plans,
            tokens: new.tokens,
            created_at: now,
            last_accessed_at: now,
            binding: SessionBinding {
                client_ip: binding.client_ip,
                browser_fingerprint: binding.browser_fingerprint,
            },
        };

        self.store.save(&session).await?;

        self.audit.log(
            &AuditEvent::new(AuditEventType::SessionCreated, AuditOutcome::Success)
                .with_session_id(&session.id.to_string())
                .with_subject(&session.hsid_uuid, "HSID", session.persona.as_str())
                .with_request(ctx),
        );

        Ok(session)
    }

    /// Loads and refreshes a session under the configured store timeout.
    ///
    /// A timed-out lookup is reported as a miss: the bearer becomes
    /// unauthenticated rather than implicitly allowed. A store that
    /// answers but reports expiry also yields a miss (lazy expiry).
    ///
    /// # Errors
    ///
    /// Returns an error only when the store answers with a failure.
    pub async fn load(&self, id: Uuid) -> SessionResult<Option<BffSession>> {
        let lookup = tokio::time::timeout(self.config.store_timeout, self.store.find(id)).await;
        let session = match lookup {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!("Session store lookup timed out, treating as not found");
                return Ok(None);
            }
        };

        match session {
            Some(s) if s.is_expired(self.config.ttl) => {
                // Lazy expiry: the sweep has not reached it yet.
                let _ = self.store.delete(id).await;
                self.audit.log(
                    &AuditEvent::new(AuditEventType::SessionExpired, AuditOutcome::Success)
                        .with_session_id(&id.to_string())
                        .with_reason("expired on access"),
                );
                Ok(None)
            }
            Some(_) => {
                match tokio::time::timeout(self.config.store_timeout, self.store.touch(id)).await {
                    Ok(result) => result,
                    Err(_) => {
                        tracing::warn!("Session store refresh timed out, treating as not found");
                        Ok(None)
                    }
                }
            }
            None => Ok(None),
        }
    }

    /// Validates the request fingerprint against the stored binding.
    ///
    /// A mismatch on any enabled dimension blocks the request and
    /// destroys the session: the id is deleted from the store and
    /// broadcast on the invalidation channel, so a stolen cookie cannot
    /// keep the victim's session alive through repeated attempts. When
    /// every enabled dimension mismatches at once and escalation is on,
    /// the event is recorded as `SESSION_HIJACK_DETECTED` instead of
    /// `SESSION_BINDING_FAILED`; the block is the same either way.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::BindingViolation`] on mismatch.
    pub async fn validate_binding(
        &self,
        session: &BffSession,
        request: &RequestBinding,
        ctx: &RequestContext,
    ) -> Result<(), SessionError> {
        let binding = &self.config.binding;

        let ip_checked = binding.bind_ip && session.binding.client_ip.is_some();
        let ip_mismatch = ip_checked && session.binding.client_ip != request.client_ip;

        let ua_checked = binding.bind_user_agent && session.binding.browser_fingerprint.is_some();
        let ua_mismatch =
            ua_checked && session.binding.browser_fingerprint != request.browser_fingerprint;

        if !ip_mismatch && !ua_mismatch {
            return Ok(());
        }

        let checked = [ip_checked, ua_checked].iter().filter(|c| **c).count();
        let mismatched = [ip_mismatch, ua_mismatch].iter().filter(|m| **m).count();
        let hijack = binding.escalate_on_full_mismatch && checked > 1 && mismatched == checked;

        let event_type = if hijack {
            AuditEventType::SessionHijackDetected
        } else {
            AuditEventType::SessionBindingFailed
        };
        let reason = match (ip_mismatch, ua_mismatch) {
            (true, true) => "ip and fingerprint mismatch",
            (true, false) => "ip mismatch",
            _ => "fingerprint mismatch",
        };

        // A session that failed binding validation is never trusted
        // again; the legitimate owner re-authenticates.
        let _ = self.store.delete(session.id).await;
        let _ = self.invalidations.send(session.id);

        self.audit.log(
            &AuditEvent::new(event_type, AuditOutcome::Blocked)
                .with_session_id(&session.id.to_string())
                .with_subject(&session.hsid_uuid, "HSID", session.persona.as_str())
                .with_reason(reason)
                .with_request(ctx),
        );

        Err(SessionError::BindingViolation { hijack })
    }

    /// Returns `true` if the session is due for id rotation.
    #[must_use]
    pub fn needs_rotation(&self, session: &BffSession) -> bool {
        session.needs_rotation(self.config.rotation_interval)
    }

    /// Rotates the session id: issues a new id, copies the session data,
    /// and invalidates the old id.
    ///
    /// The new record's creation time restarts the rotation clock; the
    /// stored binding is carried over unchanged.
    ///
    /// Concurrent rotations of the same id elect a single winner: only
    /// the caller whose `delete` removes the old record mints the
    /// successor, so two racing requests can never leave two divergent
    /// live sessions behind.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] when another rotation (or an
    /// invalidation) already removed the old id, or a store error if
    /// either operation fails.
    pub async fn rotate(&self, session: &BffSession, ctx: &RequestContext) -> SessionResult<BffSession> {
        let now = OffsetDateTime::now_utc();
        let mut successor = session.clone();
        successor.id = Uuid::new_v4();
        successor.created_at = now;
        successor.last_accessed_at = now;

        if !self.store.delete(session.id).await? {
            return Err(SessionError::NotFound);
        }
        self.store.save(&successor).await?;
        let _ = self.invalidations.send(session.id);

        self.audit.log(
            &AuditEvent::new(AuditEventType::SessionRotated, AuditOutcome::Success)
                .with_session_id(&successor.id.to_string())
                .with_subject(&successor.hsid_uuid, "HSID", successor.persona.as_str())
                .with_reason(format!(
                    "rotated from {}",
                    portal_audit::hash_session_id(&session.id.to_string())
                ))
                .with_request(ctx),
        );

        Ok(successor)
    }

    /// Invalidates a session immediately (logout or forced logout).
    ///
    /// The id is broadcast so every subscriber drops it without waiting
    /// for TTL expiry.
    ///
    /// # Errors
    ///
    /// Returns an error if the store delete fails.
    pub async fn invalidate(&self, id: Uuid, reason: &str, ctx: &RequestContext) -> SessionResult<bool> {
        let removed = self.store.delete(id).await?;
        let _ = self.invalidations.send(id);

        let outcome = if removed {
            AuditOutcome::Success
        } else {
            AuditOutcome::Failure
        };
        self.audit.log(
            &AuditEvent::new(AuditEventType::SessionInvalidated, outcome)
                .with_session_id(&id.to_string())
                .with_reason(reason)
                .with_request(ctx),
        );

        Ok(removed)
    }

    /// Subscribes to invalidation fan-out.
    ///
    /// A shared-store deployment bridges its pub/sub onto this channel so
    /// forced logouts take effect on every replica.
    #[must_use]
    pub fn subscribe_invalidations(&self) -> broadcast::Receiver<Uuid> {
        self.invalidations.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::memory::MemorySessionStore;
    use portal_core::Persona;

    fn service() -> (Arc<MemorySessionStore>, SessionSecurity) {
        let store = Arc::new(MemorySessionStore::new());
        let security = SessionSecurity::new(
            store.clone(),
            SessionConfig::default(),
            Arc::new(AuditLogger::new()),
        );
        (store, security)
    }

    fn ctx() -> RequestContext {
        RequestContext::sanitized(Some("test-req"), Some("/api"), Some("10.0.0.5"), None)
    }

    fn binding(ip: &str, fp: &str) -> RequestBinding {
        RequestBinding::new(Some(ip.to_string()), Some(fp.to_string()))
    }

    async fn created(security: &SessionSecurity) -> BffSession {
        security
            .create_session(
                NewSession::individual("hsid-1", "Ada"),
                binding("10.0.0.5", "fp-1"),
                &ctx(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_binds_fingerprint() {
        let (store, security) = service();
        let session = created(&security).await;

        assert_eq!(session.binding.client_ip.as_deref(), Some("10.0.0.5"));
        assert_eq!(session.persona, Persona::Individual);
        assert!(store.find(session.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_binding_match_passes() {
        let (_, security) = service();
        let session = created(&security).await;

        security
            .validate_binding(&session, &binding("10.0.0.5", "fp-1"), &ctx())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_ip_mismatch_blocks_as_soft_failure() {
        let (_, security) = service();
        let session = created(&security).await;

        let err = security
            .validate_binding(&session, &binding("203.0.113.9", "fp-1"), &ctx())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::BindingViolation { hijack: false }));
        assert!(err.is_authentication_failure());
    }

    #[tokio::test]
    async fn test_full_mismatch_escalates_to_hijack() {
        let (_, security) = service();
        let session = created(&security).await;

        let err = security
            .validate_binding(&session, &binding("203.0.113.9", "fp-other"), &ctx())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::BindingViolation { hijack: true }));
    }

    #[tokio::test]
    async fn test_binding_failure_destroys_session() {
        let (store, security) = service();
        let session = created(&security).await;
        let mut rx = security.subscribe_invalidations();

        security
            .validate_binding(&session, &binding("203.0.113.9", "fp-1"), &ctx())
            .await
            .unwrap_err();

        // Blocked once means gone: the id must not survive for replays.
        assert!(store.find(session.id).await.unwrap().is_none());
        assert!(security.load(session.id).await.unwrap().is_none());
        assert_eq!(rx.try_recv().unwrap(), session.id);
    }

    #[tokio::test]
    async fn test_disabled_dimension_is_skipped() {
        let store = Arc::new(MemorySessionStore::new());
        let mut config = SessionConfig::default();
        config.binding.bind_ip = false;
        let security = SessionSecurity::new(store, config, Arc::new(AuditLogger::new()));
        let session = created(&security).await;

        // IP changed but IP binding is off; fingerprint still matches.
        security
            .validate_binding(&session, &binding("203.0.113.9", "fp-1"), &ctx())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_rotation_issues_new_id_and_drops_old() {
        let (store, security) = service();
        let session = created(&security).await;

        let successor = security.rotate(&session, &ctx()).await.unwrap();
        assert_ne!(successor.id, session.id);
        assert_eq!(successor.hsid_uuid, session.hsid_uuid);
        assert_eq!(successor.binding, session.binding);
        assert!(store.find(session.id).await.unwrap().is_none());
        assert!(store.find(successor.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_racing_rotations_elect_single_winner() {
        let (store, security) = service();
        let session = created(&security).await;

        // Both callers hold the same pre-rotation record; only the one
        // that removes the old id may mint a successor.
        let winner = security.rotate(&session, &ctx()).await.unwrap();
        let loser = security.rotate(&session, &ctx()).await.unwrap_err();

        assert!(matches!(loser, SessionError::NotFound));
        assert_eq!(store.len(), 1);
        assert!(store.find(winner.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_invalidate_broadcasts_to_subscribers() {
        let (store, security) = service();
        let session = created(&security).await;
        let mut rx = security.subscribe_invalidations();

        assert!(security.invalidate(session.id, "logout", &ctx()).await.unwrap());
        assert!(store.find(session.id).await.unwrap().is_none());
        assert_eq!(rx.try_recv().unwrap(), session.id);

        // Second invalidation is a failure outcome, not an error.
        assert!(!security.invalidate(session.id, "logout", &ctx()).await.unwrap());
    }

    #[tokio::test]
    async fn test_load_misses_unknown_session() {
        let (_, security) = service();
        assert!(security.load(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_expires_stale_session_lazily() {
        let (store, security) = service();
        let mut session = created(&security).await;
        session.last_accessed_at = OffsetDateTime::now_utc() - time::Duration::hours(2);
        // Write the stale access time directly, bypassing touch.
        store.save(&session).await.unwrap();

        assert!(security.load(session.id).await.unwrap().is_none());
        assert!(store.find(session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_refreshes_live_session() {
        let (_, security) = service();
        let session = created(&security).await;

        let loaded = security.load(session.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, session.id);
        assert!(loaded.last_accessed_at >= session.last_accessed_at);
    }

    /// Store whose `touch` hangs, simulating a stalled shared backend.
    struct SlowTouchStore {
        inner: MemorySessionStore,
    }

    #[async_trait::async_trait]
    impl SessionStore for SlowTouchStore {
        async fn find(&self, id: Uuid) -> SessionResult<Option<BffSession>> {
            self.inner.find(id).await
        }

        async fn save(&self, session: &BffSession) -> SessionResult<()> {
            self.inner.save(session).await
        }

        async fn delete(&self, id: Uuid) -> SessionResult<bool> {
            self.inner.delete(id).await
        }

        async fn touch(&self, id: Uuid) -> SessionResult<Option<BffSession>> {
            tokio::time::sleep(std::time::Duration::from_secs(30)).await;
            self.inner.touch(id).await
        }
    }

    #[tokio::test]
    async fn test_load_treats_stalled_refresh_as_miss() {
        let store = Arc::new(SlowTouchStore {
            inner: MemorySessionStore::new(),
        });
        let mut config = SessionConfig::default();
        config.store_timeout = std::time::Duration::from_millis(50);
        let security = SessionSecurity::new(store, config, Arc::new(AuditLogger::new()));
        let session = created(&security).await;

        // find answers but touch hangs past the budget: fail closed.
        assert!(security.load(session.id).await.unwrap().is_none());
    }
}
