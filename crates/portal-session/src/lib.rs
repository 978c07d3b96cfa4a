//! # portal-session
//!
//! Server-side session lifecycle and session security for the portal BFF.
//!
//! A [`BffSession`] is created at a successful login callback, read on
//! every request to build subject attributes, rotated once it reaches a
//! configured age, and destroyed on logout, TTL expiry, or a binding
//! validation failure.
//!
//! State machine per session:
//!
//! ```text
//! CREATED -> ACTIVE -> (ROTATED -> ACTIVE)* -> INVALIDATED | EXPIRED
//! ```
//!
//! The [`SessionStore`] is the single source of truth. The bundled
//! [`MemorySessionStore`] is authoritative for a single instance only;
//! multi-instance deployments need a shared backend honoring the trait's
//! atomicity contract.

pub mod config;
pub mod error;
pub mod memory;
pub mod model;
pub mod security;
pub mod store;

pub use config::{BindingConfig, CookieConfig, SessionConfig};
pub use error::SessionError;
pub use memory::MemorySessionStore;
pub use model::{BffSession, EligibilityPlan, NewSession, SessionBinding, SessionTokens};
pub use security::{RequestBinding, SessionSecurity};
pub use store::SessionStore;

/// Type alias for session operation results.
pub type SessionResult<T> = Result<T, SessionError>;
