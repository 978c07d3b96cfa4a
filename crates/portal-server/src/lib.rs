//! # portal-server
//!
//! HTTP surface for the portal BFF. This crate stays thin: the policy
//! engine lives in `portal-authz`, session security in `portal-session`,
//! and the audit trail in `portal-audit`. What belongs here is the wiring:
//!
//! - [`config`] - layered configuration (TOML file + environment)
//! - [`observability`] - tracing bootstrap
//! - [`state`] - shared application state and cookie construction
//! - [`guard`] - the declarative route-guard table and middleware
//! - [`routes`] - router assembly and handlers
//! - [`error`] - error to HTTP response mapping

pub mod config;
pub mod error;
pub mod guard;
pub mod observability;
pub mod routes;
pub mod state;

pub use config::{AppConfig, load_config};
pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
