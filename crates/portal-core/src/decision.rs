//! Policy decisions.
//!
//! A [`PolicyDecision`] is constructed once per evaluation and never
//! mutated. Denials carry a structured [`DenyReason`] with a stable code,
//! the deciding policy id, and the attribute names whose absence caused
//! the denial (used to build actionable error responses).

use serde::{Deserialize, Serialize};

/// Deny code used when no registered policy produced a conclusive decision.
pub const CODE_NO_MATCHING_POLICY: &str = "no-matching-policy";

/// Deny code used when a policy explicitly denied access.
pub const CODE_POLICY_DENIED: &str = "policy-denied";

/// Deny code used when policy evaluation itself failed.
pub const CODE_POLICY_ERROR: &str = "policy-error";

/// Result of evaluating one policy, or of a full engine run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    /// Access is granted.
    Allow {
        /// Id of the policy that granted access.
        policy_id: String,
        /// Human-readable reason for the grant.
        reason: String,
    },
    /// Access is denied.
    Deny(DenyReason),
    /// The policy has no opinion; the engine continues to the next one.
    NotApplicable,
}

impl PolicyDecision {
    /// Creates an allow decision.
    #[must_use]
    pub fn allow(policy_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Allow {
            policy_id: policy_id.into(),
            reason: reason.into(),
        }
    }

    /// Creates a deny decision attributed to a policy.
    #[must_use]
    pub fn deny(
        policy_id: impl Into<String>,
        reason: impl Into<String>,
        missing: Vec<String>,
    ) -> Self {
        Self::Deny(DenyReason {
            code: CODE_POLICY_DENIED.to_string(),
            policy_id: Some(policy_id.into()),
            message: reason.into(),
            missing,
        })
    }

    /// Returns `true` if access was granted.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow { .. })
    }

    /// Returns `true` if access was denied.
    #[must_use]
    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Deny(_))
    }

    /// Returns `true` if the decision settles the request (allow or deny).
    #[must_use]
    pub fn is_conclusive(&self) -> bool {
        !matches!(self, Self::NotApplicable)
    }

    /// Returns the deny reason if access was denied.
    #[must_use]
    pub fn deny_reason(&self) -> Option<&DenyReason> {
        match self {
            Self::Deny(reason) => Some(reason),
            _ => None,
        }
    }

    /// Returns the id of the policy that produced this decision, if any.
    #[must_use]
    pub fn policy_id(&self) -> Option<&str> {
        match self {
            Self::Allow { policy_id, .. } => Some(policy_id),
            Self::Deny(reason) => reason.policy_id.as_deref(),
            Self::NotApplicable => None,
        }
    }

    /// Returns `true` if this denial stems from an evaluation failure
    /// rather than a business rule.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Deny(reason) if reason.code == CODE_POLICY_ERROR)
    }
}

/// Structured reason for an access denial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DenyReason {
    /// Stable code for programmatic handling.
    pub code: String,

    /// Id of the policy that denied access, when one did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<String>,

    /// Human-readable denial message.
    pub message: String,

    /// Attribute names whose absence caused the denial.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
}

impl DenyReason {
    /// Denial used when no policy produced a conclusive decision.
    ///
    /// Absence of a matching rule is never an allow.
    #[must_use]
    pub fn no_matching_policy() -> Self {
        Self {
            code: CODE_NO_MATCHING_POLICY.to_string(),
            policy_id: None,
            message: "No policy matched the request".to_string(),
            missing: Vec::new(),
        }
    }

    /// Denial used when policy evaluation failed.
    #[must_use]
    pub fn policy_error(policy_id: Option<String>, message: impl Into<String>) -> Self {
        Self {
            code: CODE_POLICY_ERROR.to_string(),
            policy_id,
            message: message.into(),
            missing: Vec::new(),
        }
    }
}
