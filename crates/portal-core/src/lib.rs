//! # portal-core
//!
//! Shared authorization vocabulary for the portal BFF.
//!
//! This crate holds the value types that the policy engine, session layer,
//! and HTTP surface all agree on:
//!
//! - [`SubjectAttributes`] - the authenticated principal making a request
//! - [`ResourceAttributes`] - the target of the requested action
//! - [`Action`] - the closed set of operations a policy can rule on
//! - [`Permission`] - delegate permission tokens (DAA, RPR, ROI)
//! - [`PolicyDecision`] - the outcome of a policy evaluation
//!
//! Types here carry no evaluation logic. Policies and the engine live in
//! `portal-authz`; sessions live in `portal-session`.

pub mod action;
pub mod decision;
pub mod permission;
pub mod resource;
pub mod subject;

pub use action::Action;
pub use decision::{
    CODE_NO_MATCHING_POLICY, CODE_POLICY_DENIED, CODE_POLICY_ERROR, DenyReason, PolicyDecision,
};
pub use permission::{CAN_VIEW, CAN_VIEW_SENSITIVE, Permission};
pub use resource::{ResourceAttributes, ResourceType, Sensitivity};
pub use subject::{AuthType, Persona, SubjectAttributes, SubjectError};
