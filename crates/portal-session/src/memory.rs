//! In-memory session store.
//!
//! Process-local store for single-instance and development deployments.
//! Populated at startup, swept periodically, cleared on shutdown. With
//! this backend exactly one instance is authoritative; cross-instance
//! correctness requires a shared store implementing [`SessionStore`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use time::OffsetDateTime;
use uuid::Uuid;

use portal_audit::{AuditEvent, AuditEventType, AuditLogger, AuditOutcome};

use crate::SessionResult;
use crate::model::BffSession;
use crate::store::SessionStore;

/// DashMap-backed session store.
///
/// Per-entry locking gives `touch` the required per-session atomicity:
/// concurrent refreshes of one id serialize on its shard entry.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: DashMap<Uuid, BffSession>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if no sessions are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Removes sessions whose last access is older than `ttl`.
    ///
    /// Returns the removed sessions so the caller can audit each one.
    pub fn sweep_expired(&self, ttl: Duration) -> Vec<BffSession> {
        let now = OffsetDateTime::now_utc();
        let expired: Vec<Uuid> = self
            .sessions
            .iter()
            .filter(|entry| now - entry.value().last_accessed_at > ttl)
            .map(|entry| *entry.key())
            .collect();

        expired
            .into_iter()
            .filter_map(|id| self.sessions.remove(&id).map(|(_, session)| session))
            .collect()
    }

    /// Spawns the periodic expiry sweep.
    ///
    /// Each removed session is recorded as a `SESSION_EXPIRED` audit
    /// event. The task runs until the process shuts down.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        sweep_interval: Duration,
        ttl: Duration,
        audit: Arc<AuditLogger>,
    ) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let removed = store.sweep_expired(ttl);
                if removed.is_empty() {
                    continue;
                }
                tracing::debug!(count = removed.len(), "Swept expired sessions");
                for session in removed {
                    audit.log(
                        &AuditEvent::new(AuditEventType::SessionExpired, AuditOutcome::Success)
                            .with_session_id(&session.id.to_string())
                            .with_reason("idle TTL exceeded"),
                    );
                }
            }
        })
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn find(&self, id: Uuid) -> SessionResult<Option<BffSession>> {
        Ok(self.sessions.get(&id).map(|entry| entry.value().clone()))
    }

    async fn save(&self, session: &BffSession) -> SessionResult<()> {
        self.sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> SessionResult<bool> {
        Ok(self.sessions.remove(&id).is_some())
    }

    async fn touch(&self, id: Uuid) -> SessionResult<Option<BffSession>> {
        Ok(self.sessions.get_mut(&id).map(|mut entry| {
            entry.last_accessed_at = OffsetDateTime::now_utc();
            entry.value().clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SessionBinding, SessionTokens};
    use portal_core::Persona;
    use std::collections::HashMap;

    fn test_session() -> BffSession {
        let now = OffsetDateTime::now_utc();
        BffSession {
            id: Uuid::new_v4(),
            hsid_uuid: "hsid-1".to_string(),
            first_name: "Ada".to_string(),
            last_name: "L".to_string(),
            email: None,
            persona: Persona::Individual,
            delegate_grants: HashMap::new(),
            managed_members: HashMap::new(),
            eligibility_plans: Vec::new(),
            tokens: SessionTokens::default(),
            created_at: now,
            last_accessed_at: now,
            binding: SessionBinding::default(),
        }
    }

    #[tokio::test]
    async fn test_save_find_delete() {
        let store = MemorySessionStore::new();
        let session = test_session();

        store.save(&session).await.unwrap();
        assert_eq!(store.len(), 1);

        let found = store.find(session.id).await.unwrap().unwrap();
        assert_eq!(found.hsid_uuid, "hsid-1");

        assert!(store.delete(session.id).await.unwrap());
        assert!(store.find(session.id).await.unwrap().is_none());
        assert!(!store.delete(session.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_touch_refreshes_access_time() {
        let store = MemorySessionStore::new();
        let mut session = test_session();
        session.last_accessed_at = OffsetDateTime::now_utc() - time::Duration::minutes(10);
        store.save(&session).await.unwrap();

        let touched = store.touch(session.id).await.unwrap().unwrap();
        assert!(touched.last_accessed_at > session.last_accessed_at);

        // Unknown id is a miss, not an error.
        assert!(store.touch(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired() {
        let store = MemorySessionStore::new();

        let mut stale = test_session();
        stale.last_accessed_at = OffsetDateTime::now_utc() - time::Duration::hours(2);
        store.save(&stale).await.unwrap();

        let fresh = test_session();
        store.save(&fresh).await.unwrap();

        let removed = store.sweep_expired(Duration::from_secs(1800));
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id, stale.id);
        assert!(store.find(fresh.id).await.unwrap().is_some());
    }
}
