//! Policy trait, the closed rule set, and the evaluation engine.
//!
//! The production rule set is a fixed, audited business contract, not a
//! plugin system: [`default_policies`] constructs the only set that ships.
//! The [`Policy`] trait exists so the engine stays generic and tests can
//! inject synthetic rules.

mod engine;
mod rules;

pub use engine::PolicyEngine;
pub use rules::{
    HsidViewDependent, ParentViewDocument, ProxyDocument, ProxyViewSensitive, YouthOwnsDocument,
    default_policies,
};

use portal_core::{Action, PolicyDecision, ResourceAttributes, SubjectAttributes};

/// One named, prioritized authorization rule.
///
/// `applies_to` is a cheap filter and the sole gate deciding whether the
/// rule participates; `evaluate` re-checks it defensively and returns
/// [`PolicyDecision::NotApplicable`] if it somehow does not hold, so a
/// misused engine can never turn an out-of-scope rule into an allow.
pub trait Policy: Send + Sync {
    /// Stable policy identifier, surfaced in denials and audit events.
    fn id(&self) -> &'static str;

    /// Human-readable description of the business rule.
    fn description(&self) -> &'static str;

    /// Evaluation priority; higher runs first. Ties keep registration
    /// order.
    fn priority(&self) -> u16;

    /// Returns `true` if this rule has an opinion about the request.
    fn applies_to(
        &self,
        subject: &SubjectAttributes,
        resource: &ResourceAttributes,
        action: Action,
    ) -> bool;

    /// Produces this rule's decision for the request.
    ///
    /// Must be a pure function of its inputs: no clock reads, no I/O.
    fn evaluate(
        &self,
        subject: &SubjectAttributes,
        resource: &ResourceAttributes,
        action: Action,
    ) -> PolicyDecision;
}
