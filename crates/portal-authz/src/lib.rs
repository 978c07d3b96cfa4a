//! # portal-authz
//!
//! Attribute-based authorization engine for the portal BFF.
//!
//! Two rule families share one resource/action vocabulary:
//!
//! - **HSID** (end-users): relationship-based access through delegate
//!   permission tuples (DAA/RPR/ROI) granted per managed member
//! - **PROXY** (partner systems): role-based access through operator
//!   personas and assigned member lists
//!
//! The pipeline per request: determine auth type, build subject
//! attributes (session projection or trusted proxy headers), evaluate
//! the fixed policy set in priority order, audit the decision, and
//! return it. The engine fails closed: no matching rule is a denial.
//!
//! ## Modules
//!
//! - [`policy`] - the policy trait, the closed rule set, and the engine
//! - [`subject`] - auth-type detection and subject construction
//! - [`service`] - the authorization façade controllers call
//! - [`error`] - error types

pub mod error;
pub mod policy;
pub mod service;
pub mod subject;

pub use error::AuthzError;
pub use policy::{Policy, PolicyEngine, default_policies};
pub use service::AuthorizationService;
pub use subject::{
    HEADER_ASSIGNED_MEMBERS, HEADER_OPERATOR_ID, HEADER_PERSONA, SubjectBuilder,
    determine_auth_type,
};

/// Type alias for authorization results.
pub type AuthzResult<T> = Result<T, AuthzError>;
