//! The production rule set.
//!
//! One type per business rule. Each `evaluate` re-checks `applies_to`
//! and answers `NotApplicable` when it does not hold; a rule never
//! produces an allow for a request shape it was not designed for.

use portal_core::{
    Action, AuthType, CAN_VIEW, CAN_VIEW_SENSITIVE, Permission, Persona, PolicyDecision,
    ResourceAttributes, ResourceType, Sensitivity, SubjectAttributes,
};

use super::Policy;

/// Constructs the fixed policy set, in registration order.
///
/// Order matters only for equal priorities; the engine's sort is stable.
#[must_use]
pub fn default_policies() -> Vec<Box<dyn Policy>> {
    vec![
        Box::new(YouthOwnsDocument),
        Box::new(ParentViewDocument),
        Box::new(HsidViewDependent),
        Box::new(ProxyViewSensitive),
        Box::new(ProxyDocument),
    ]
}

fn missing_names(missing: &[Permission]) -> Vec<String> {
    missing.iter().map(|p| p.as_str().to_string()).collect()
}

// =============================================================================
// Youth owns document
// =============================================================================

/// Owner override: a member always has full access to their own documents.
///
/// Highest priority so ownership wins before any delegate rule runs.
pub struct YouthOwnsDocument;

impl Policy for YouthOwnsDocument {
    fn id(&self) -> &'static str {
        "YOUTH_OWNS_DOCUMENT"
    }

    fn description(&self) -> &'static str {
        "Members acting for themselves have full access to their own documents"
    }

    fn priority(&self) -> u16 {
        150
    }

    fn applies_to(
        &self,
        subject: &SubjectAttributes,
        resource: &ResourceAttributes,
        _action: Action,
    ) -> bool {
        subject.auth_type == AuthType::Hsid
            && subject.persona == Persona::Individual
            && resource.resource_type == ResourceType::Document
    }

    fn evaluate(
        &self,
        subject: &SubjectAttributes,
        resource: &ResourceAttributes,
        action: Action,
    ) -> PolicyDecision {
        if !self.applies_to(subject, resource, action) {
            return PolicyDecision::NotApplicable;
        }
        if subject.user_id == resource.owner_id {
            PolicyDecision::allow(self.id(), "subject owns the document")
        } else {
            PolicyDecision::deny(
                self.id(),
                "document belongs to another member",
                vec!["ownerId".to_string()],
            )
        }
    }
}

// =============================================================================
// Parent views document
// =============================================================================

/// Delegate document access: parents need the full DAA+RPR+ROI tuple.
///
/// All documents are treated as maximally sensitive, so ROI is required
/// even for a plain VIEW.
pub struct ParentViewDocument;

impl Policy for ParentViewDocument {
    fn id(&self) -> &'static str {
        "PARENT_VIEW_DOCUMENT"
    }

    fn description(&self) -> &'static str {
        "Delegates may read a managed member's documents with DAA, RPR, and ROI"
    }

    fn priority(&self) -> u16 {
        100
    }

    fn applies_to(
        &self,
        subject: &SubjectAttributes,
        resource: &ResourceAttributes,
        action: Action,
    ) -> bool {
        subject.auth_type == AuthType::Hsid
            && subject.persona == Persona::Parent
            && resource.resource_type == ResourceType::Document
            && matches!(action, Action::View | Action::ViewSensitive | Action::List)
    }

    fn evaluate(
        &self,
        subject: &SubjectAttributes,
        resource: &ResourceAttributes,
        action: Action,
    ) -> PolicyDecision {
        if !self.applies_to(subject, resource, action) {
            return PolicyDecision::NotApplicable;
        }
        let missing = subject.missing_permissions(&resource.owner_id, CAN_VIEW_SENSITIVE);
        if missing.is_empty() {
            PolicyDecision::allow(self.id(), "delegate holds DAA, RPR, and ROI")
        } else {
            PolicyDecision::deny(
                self.id(),
                "delegate lacks required grants for this member",
                missing_names(&missing),
            )
        }
    }
}

// =============================================================================
// HSID views dependent
// =============================================================================

/// Dependent profile access for end-users.
///
/// Non-sensitive views need DAA and RPR; a sensitive read (explicit
/// VIEW_SENSITIVE, or VIEW of a sensitive-flagged dependent) additionally
/// needs ROI.
pub struct HsidViewDependent;

impl Policy for HsidViewDependent {
    fn id(&self) -> &'static str {
        "HSID_VIEW_DEPENDENT"
    }

    fn description(&self) -> &'static str {
        "End-users may view a dependent with DAA and RPR; sensitive reads also need ROI"
    }

    fn priority(&self) -> u16 {
        90
    }

    fn applies_to(
        &self,
        subject: &SubjectAttributes,
        resource: &ResourceAttributes,
        action: Action,
    ) -> bool {
        subject.auth_type == AuthType::Hsid
            && resource.resource_type == ResourceType::Dependent
            && matches!(action, Action::View | Action::ViewSensitive)
    }

    fn evaluate(
        &self,
        subject: &SubjectAttributes,
        resource: &ResourceAttributes,
        action: Action,
    ) -> PolicyDecision {
        if !self.applies_to(subject, resource, action) {
            return PolicyDecision::NotApplicable;
        }
        let required = if resource.is_sensitive_for(action) {
            CAN_VIEW_SENSITIVE
        } else {
            CAN_VIEW
        };
        let missing = subject.missing_permissions(&resource.id, required);
        if missing.is_empty() {
            PolicyDecision::allow(self.id(), "subject holds the required grants")
        } else {
            PolicyDecision::deny(
                self.id(),
                "subject lacks required grants for this dependent",
                missing_names(&missing),
            )
        }
    }
}

// =============================================================================
// Proxy views sensitive data
// =============================================================================

/// Sensitive member/dependent data is restricted to configuration
/// specialists on the proxy path.
pub struct ProxyViewSensitive;

impl Policy for ProxyViewSensitive {
    fn id(&self) -> &'static str {
        "PROXY_VIEW_SENSITIVE"
    }

    fn description(&self) -> &'static str {
        "Only configuration specialists may read sensitive member data via proxy"
    }

    fn priority(&self) -> u16 {
        120
    }

    fn applies_to(
        &self,
        subject: &SubjectAttributes,
        resource: &ResourceAttributes,
        action: Action,
    ) -> bool {
        let sensitive_read = action == Action::ViewSensitive
            || (action == Action::View && resource.sensitivity == Sensitivity::Sensitive);
        subject.auth_type == AuthType::Proxy
            && matches!(
                resource.resource_type,
                ResourceType::Member | ResourceType::Dependent
            )
            && sensitive_read
    }

    fn evaluate(
        &self,
        subject: &SubjectAttributes,
        resource: &ResourceAttributes,
        action: Action,
    ) -> PolicyDecision {
        if !self.applies_to(subject, resource, action) {
            return PolicyDecision::NotApplicable;
        }
        if subject.persona == Persona::Config {
            PolicyDecision::allow(self.id(), "configuration specialists have full access")
        } else {
            PolicyDecision::deny(
                self.id(),
                "persona may not read sensitive member data",
                vec!["persona".to_string()],
            )
        }
    }
}

// =============================================================================
// Proxy document access
// =============================================================================

/// Document access on the proxy path: config has full access; agents and
/// case workers only for members they are assigned to.
pub struct ProxyDocument;

impl Policy for ProxyDocument {
    fn id(&self) -> &'static str {
        "PROXY_DOCUMENT"
    }

    fn description(&self) -> &'static str {
        "Operators may access documents of assigned members; config is unrestricted"
    }

    fn priority(&self) -> u16 {
        100
    }

    fn applies_to(
        &self,
        subject: &SubjectAttributes,
        resource: &ResourceAttributes,
        _action: Action,
    ) -> bool {
        subject.auth_type == AuthType::Proxy
            && resource.resource_type == ResourceType::Document
    }

    fn evaluate(
        &self,
        subject: &SubjectAttributes,
        resource: &ResourceAttributes,
        action: Action,
    ) -> PolicyDecision {
        if !self.applies_to(subject, resource, action) {
            return PolicyDecision::NotApplicable;
        }
        match subject.persona {
            Persona::Config => {
                PolicyDecision::allow(self.id(), "configuration specialists have full access")
            }
            Persona::Agent | Persona::CaseWorker
                if subject.is_assigned_to(&resource.owner_id) =>
            {
                PolicyDecision::allow(self.id(), "operator is assigned to the document owner")
            }
            _ => PolicyDecision::deny(
                self.id(),
                "operator is not assigned to the document owner",
                vec!["memberId".to_string()],
            ),
        }
    }
}
