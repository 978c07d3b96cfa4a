//! Priority-ordered, fail-closed policy evaluation.

use std::cmp::Reverse;
use std::panic::{self, AssertUnwindSafe};

use portal_core::{Action, DenyReason, PolicyDecision, ResourceAttributes, SubjectAttributes};
use tracing::{debug, error};

use super::Policy;

/// Evaluates a fixed set of policies against a request.
///
/// Policies are sorted by descending priority once, at construction; the
/// sort is stable so equal priorities keep registration order. Evaluation
/// walks the sorted list and returns the first conclusive decision. If no
/// policy is conclusive the engine denies with
/// [`DenyReason::no_matching_policy`].
pub struct PolicyEngine {
    policies: Vec<Box<dyn Policy>>,
}

impl PolicyEngine {
    /// Creates an engine over the production rule set.
    #[must_use]
    pub fn new() -> Self {
        Self::with_policies(super::default_policies())
    }

    /// Creates an engine over an explicit policy list.
    #[must_use]
    pub fn with_policies(mut policies: Vec<Box<dyn Policy>>) -> Self {
        policies.sort_by_key(|p| Reverse(p.priority()));
        Self { policies }
    }

    /// Number of registered policies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Returns `true` if no policies are registered (every request denies).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Evaluates the request and returns the first conclusive decision.
    ///
    /// A panicking policy is converted into an error denial attributed to
    /// that policy; it never aborts the request or falls through to a
    /// lower-priority allow.
    #[must_use]
    pub fn authorize(
        &self,
        subject: &SubjectAttributes,
        resource: &ResourceAttributes,
        action: Action,
    ) -> PolicyDecision {
        for policy in &self.policies {
            if !policy.applies_to(subject, resource, action) {
                continue;
            }

            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                policy.evaluate(subject, resource, action)
            }));

            let decision = match result {
                Ok(decision) => decision,
                Err(_) => {
                    error!(
                        policy_id = policy.id(),
                        %action,
                        "policy evaluation panicked; denying"
                    );
                    return PolicyDecision::Deny(DenyReason::policy_error(
                        Some(policy.id().to_string()),
                        "policy evaluation failed",
                    ));
                }
            };

            if decision.is_conclusive() {
                debug!(
                    policy_id = policy.id(),
                    allowed = decision.is_allowed(),
                    %action,
                    "policy produced a conclusive decision"
                );
                return decision;
            }
        }

        PolicyDecision::Deny(DenyReason::no_matching_policy())
    }
}

impl Default for PolicyEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::{
        CAN_VIEW_SENSITIVE, CODE_NO_MATCHING_POLICY, CODE_POLICY_ERROR, Persona, Sensitivity,
    };

    struct Fixed {
        id: &'static str,
        priority: u16,
        decision: PolicyDecision,
    }

    impl Policy for Fixed {
        fn id(&self) -> &'static str {
            self.id
        }

        fn description(&self) -> &'static str {
            "synthetic test policy"
        }

        fn priority(&self) -> u16 {
            self.priority
        }

        fn applies_to(
            &self,
            _subject: &SubjectAttributes,
            _resource: &ResourceAttributes,
            _action: Action,
        ) -> bool {
            true
        }

        fn evaluate(
            &self,
            _subject: &SubjectAttributes,
            _resource: &ResourceAttributes,
            _action: Action,
        ) -> PolicyDecision {
            self.decision.clone()
        }
    }

    struct Panicking;

    impl Policy for Panicking {
        fn id(&self) -> &'static str {
            "PANICS"
        }

        fn description(&self) -> &'static str {
            "synthetic panicking policy"
        }

        fn priority(&self) -> u16 {
            200
        }

        fn applies_to(
            &self,
            _subject: &SubjectAttributes,
            _resource: &ResourceAttributes,
            _action: Action,
        ) -> bool {
            true
        }

        fn evaluate(
            &self,
            _subject: &SubjectAttributes,
            _resource: &ResourceAttributes,
            _action: Action,
        ) -> PolicyDecision {
            panic!("boom")
        }
    }

    fn any_subject() -> SubjectAttributes {
        SubjectAttributes::hsid("M1", Persona::Individual).unwrap()
    }

    fn any_resource() -> ResourceAttributes {
        ResourceAttributes::member("M1")
    }

    #[test]
    fn test_empty_engine_fails_closed() {
        let engine = PolicyEngine::with_policies(vec![]);
        let decision = engine.authorize(&any_subject(), &any_resource(), Action::View);
        assert!(decision.is_denied());
        assert_eq!(decision.deny_reason().unwrap().code, CODE_NO_MATCHING_POLICY);
    }

    #[test]
    fn test_unmatched_request_fails_closed() {
        // Production set, but an edit on a member profile matches no rule.
        let engine = PolicyEngine::new();
        let decision = engine.authorize(&any_subject(), &any_resource(), Action::Edit);
        assert!(decision.is_denied());
        assert_eq!(decision.deny_reason().unwrap().code, CODE_NO_MATCHING_POLICY);
    }

    #[test]
    fn test_higher_priority_deny_beats_lower_allow() {
        let engine = PolicyEngine::with_policies(vec![
            Box::new(Fixed {
                id: "LOW_ALLOW",
                priority: 50,
                decision: PolicyDecision::allow("LOW_ALLOW", "permissive"),
            }),
            Box::new(Fixed {
                id: "HIGH_DENY",
                priority: 200,
                decision: PolicyDecision::deny("HIGH_DENY", "restrictive", vec![]),
            }),
        ]);
        let decision = engine.authorize(&any_subject(), &any_resource(), Action::View);
        assert!(decision.is_denied());
        assert_eq!(decision.policy_id(), Some("HIGH_DENY"));
    }

    #[test]
    fn test_equal_priority_keeps_registration_order() {
        let engine = PolicyEngine::with_policies(vec![
            Box::new(Fixed {
                id: "FIRST",
                priority: 100,
                decision: PolicyDecision::allow("FIRST", "registered first"),
            }),
            Box::new(Fixed {
                id: "SECOND",
                priority: 100,
                decision: PolicyDecision::deny("SECOND", "registered second", vec![]),
            }),
        ]);
        let decision = engine.authorize(&any_subject(), &any_resource(), Action::View);
        assert_eq!(decision.policy_id(), Some("FIRST"));
    }

    #[test]
    fn test_not_applicable_falls_through() {
        let engine = PolicyEngine::with_policies(vec![
            Box::new(Fixed {
                id: "ABSTAINS",
                priority: 200,
                decision: PolicyDecision::NotApplicable,
            }),
            Box::new(Fixed {
                id: "DECIDES",
                priority: 50,
                decision: PolicyDecision::allow("DECIDES", "fallback"),
            }),
        ]);
        let decision = engine.authorize(&any_subject(), &any_resource(), Action::View);
        assert!(decision.is_allowed());
        assert_eq!(decision.policy_id(), Some("DECIDES"));
    }

    #[test]
    fn test_panicking_policy_denies_without_falling_through() {
        let engine = PolicyEngine::with_policies(vec![
            Box::new(Panicking),
            Box::new(Fixed {
                id: "WOULD_ALLOW",
                priority: 10,
                decision: PolicyDecision::allow("WOULD_ALLOW", "should never run"),
            }),
        ]);
        let decision = engine.authorize(&any_subject(), &any_resource(), Action::View);
        assert!(decision.is_denied());
        assert!(decision.is_error());
        let reason = decision.deny_reason().unwrap();
        assert_eq!(reason.code, CODE_POLICY_ERROR);
        assert_eq!(reason.policy_id.as_deref(), Some("PANICS"));
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let engine = PolicyEngine::new();
        let subject = SubjectAttributes::hsid("P1", Persona::Parent)
            .unwrap()
            .with_permissions("D1", CAN_VIEW_SENSITIVE.iter().copied());
        let doc = ResourceAttributes::document("doc-1", "D1");

        let first = engine.authorize(&subject, &doc, Action::ViewSensitive);
        for _ in 0..10 {
            assert_eq!(engine.authorize(&subject, &doc, Action::ViewSensitive), first);
        }
    }

    #[test]
    fn test_owner_override_beats_delegate_rules() {
        // An individual reading their own document wins on priority even
        // though the parent document rule would have denied it.
        let engine = PolicyEngine::new();
        let subject = any_subject();
        let doc = ResourceAttributes::document("doc-1", "M1");
        let decision = engine.authorize(&subject, &doc, Action::ViewSensitive);
        assert!(decision.is_allowed());
        assert_eq!(decision.policy_id(), Some("YOUTH_OWNS_DOCUMENT"));
    }

    #[test]
    fn test_sensitive_dependent_view_not_satisfied_by_daa_rpr() {
        let engine = PolicyEngine::new();
        let subject = SubjectAttributes::hsid("P1", Persona::Parent)
            .unwrap()
            .with_permissions("D1", portal_core::CAN_VIEW.iter().copied());
        let dep = ResourceAttributes::dependent("D1", Sensitivity::Sensitive);
        let decision = engine.authorize(&subject, &dep, Action::View);
        assert!(decision.is_denied());
        assert_eq!(decision.policy_id(), Some("HSID_VIEW_DEPENDENT"));
        assert_eq!(decision.deny_reason().unwrap().missing, vec!["ROI"]);
    }
}
