//! Session storage trait.
//!
//! # Implementation Notes
//!
//! Implementations must:
//!
//! - Treat the store as the single source of truth for session state
//! - Make `touch` atomic per session id: two concurrent refreshes of the
//!   same session must not produce divergent successor records. Shared
//!   stores should use native conditional-set/versioning primitives
//!   rather than application-level locks.
//! - Never log raw session ids

use async_trait::async_trait;
use uuid::Uuid;

use crate::SessionResult;
use crate::model::BffSession;

/// Storage interface for BFF sessions.
///
/// Key-value semantics keyed by session UUID. The bundled in-memory
/// implementation is [`crate::MemorySessionStore`]; a shared backend
/// (e.g., Redis) would implement the same contract with TTL support.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Finds a session by id without refreshing its access time.
    ///
    /// Returns `None` if the id is unknown. Expiry is the caller's
    /// concern; stores may also evict lazily.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find(&self, id: Uuid) -> SessionResult<Option<BffSession>>;

    /// Persists a session, replacing any existing record with the same id.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn save(&self, session: &BffSession) -> SessionResult<()>;

    /// Removes a session.
    ///
    /// Returns `true` if a record was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn delete(&self, id: Uuid) -> SessionResult<bool>;

    /// Atomically refreshes `last_accessed_at` and returns the updated
    /// session.
    ///
    /// Returns `None` if the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn touch(&self, id: Uuid) -> SessionResult<Option<BffSession>>;
}
