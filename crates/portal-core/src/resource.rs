//! Resource attributes: the target of a requested action.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::action::Action;

/// Kind of resource the portal exposes to authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    /// A plan member (the primary account holder).
    Member,
    /// A dependent managed by a member.
    Dependent,
    /// A stored document belonging to a member or dependent.
    Document,
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Member => "member",
            Self::Dependent => "dependent",
            Self::Document => "document",
        };
        f.write_str(name)
    }
}

/// Sensitivity classification of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sensitivity {
    /// No special handling beyond the base permission set.
    Normal,
    /// Release requires explicit consent (ROI).
    Sensitive,
}

/// The target of an authorization request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceAttributes {
    /// Kind of resource.
    pub resource_type: ResourceType,

    /// Identifier of the resource itself.
    pub id: String,

    /// Identifier of the member the resource belongs to.
    /// For member/dependent resources this equals `id`.
    pub owner_id: String,

    /// Declared sensitivity. Documents are treated as sensitive for read
    /// actions regardless of this flag; see [`Self::is_sensitive_for`].
    pub sensitivity: Sensitivity,
}

impl ResourceAttributes {
    /// Creates attributes for a member resource.
    #[must_use]
    pub fn member(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            resource_type: ResourceType::Member,
            owner_id: id.clone(),
            id,
            sensitivity: Sensitivity::Normal,
        }
    }

    /// Creates attributes for a dependent resource.
    #[must_use]
    pub fn dependent(id: impl Into<String>, sensitivity: Sensitivity) -> Self {
        let id = id.into();
        Self {
            resource_type: ResourceType::Dependent,
            owner_id: id.clone(),
            id,
            sensitivity,
        }
    }

    /// Creates attributes for a document owned by `owner_id`.
    #[must_use]
    pub fn document(id: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Self {
            resource_type: ResourceType::Document,
            id: id.into(),
            owner_id: owner_id.into(),
            sensitivity: Sensitivity::Sensitive,
        }
    }

    /// Returns `true` if this resource must be treated as sensitive for
    /// the given action.
    ///
    /// Documents are implicitly sensitive for every read action, whatever
    /// their declared `sensitivity` says.
    #[must_use]
    pub fn is_sensitive_for(&self, action: Action) -> bool {
        if self.resource_type == ResourceType::Document && action.is_read() {
            return true;
        }
        self.sensitivity == Sensitivity::Sensitive || action == Action::ViewSensitive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_owner_is_self() {
        let resource = ResourceAttributes::member("M1");
        assert_eq!(resource.id, "M1");
        assert_eq!(resource.owner_id, "M1");
        assert_eq!(resource.sensitivity, Sensitivity::Normal);
    }

    #[test]
    fn test_documents_always_sensitive_for_reads() {
        let mut doc = ResourceAttributes::document("doc-1", "M1");
        // Even if something downgrades the flag, reads stay sensitive.
        doc.sensitivity = Sensitivity::Normal;
        assert!(doc.is_sensitive_for(Action::View));
        assert!(doc.is_sensitive_for(Action::List));
        assert!(doc.is_sensitive_for(Action::ViewSensitive));
    }

    #[test]
    fn test_dependent_sensitivity_flag() {
        let dep = ResourceAttributes::dependent("D1", Sensitivity::Normal);
        assert!(!dep.is_sensitive_for(Action::View));
        assert!(dep.is_sensitive_for(Action::ViewSensitive));

        let dep = ResourceAttributes::dependent("D1", Sensitivity::Sensitive);
        assert!(dep.is_sensitive_for(Action::View));
    }
}
