//! Subject attributes: the authenticated principal making a request.
//!
//! A subject is built fresh for every request, either from a server-side
//! session (HSID end-users) or from perimeter-validated proxy headers
//! (partner systems). It is never persisted beyond request scope.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::permission::Permission;

/// How the subject authenticated, which selects the applicable rule family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthType {
    /// End-user authenticated through the identity provider (session-backed).
    Hsid,
    /// Partner/proxy system authenticated at the mTLS perimeter.
    Proxy,
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hsid => f.write_str("HSID"),
            Self::Proxy => f.write_str("PROXY"),
        }
    }
}

/// Role classification of the authenticated subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    /// A member acting on their own behalf.
    Individual,
    /// A delegate (parent/guardian) acting for managed members.
    Parent,
    /// Partner call-center agent with an assigned member list.
    Agent,
    /// Partner case worker with an assigned member list.
    CaseWorker,
    /// Partner configuration specialist with unrestricted access.
    Config,
}

impl Persona {
    /// Returns `true` if this persona is valid for the given auth type.
    ///
    /// HSID subjects are end-users (individual, parent); proxy subjects are
    /// operator roles (agent, case worker, config).
    #[must_use]
    pub fn matches_auth_type(self, auth_type: AuthType) -> bool {
        match auth_type {
            AuthType::Hsid => matches!(self, Self::Individual | Self::Parent),
            AuthType::Proxy => matches!(self, Self::Agent | Self::CaseWorker | Self::Config),
        }
    }

    /// Returns the stable wire name of this persona.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Parent => "parent",
            Self::Agent => "agent",
            Self::CaseWorker => "case_worker",
            Self::Config => "config",
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Persona {
    type Err = SubjectError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "individual" => Ok(Self::Individual),
            "parent" => Ok(Self::Parent),
            "agent" => Ok(Self::Agent),
            "case_worker" => Ok(Self::CaseWorker),
            "config" => Ok(Self::Config),
            other => Err(SubjectError::UnknownPersona {
                persona: other.to_string(),
            }),
        }
    }
}

/// Errors raised while constructing subject attributes.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SubjectError {
    /// Persona does not belong to the auth type's rule family.
    #[error("Persona '{persona}' is not valid for auth type {auth_type}")]
    PersonaMismatch {
        /// The rejected persona.
        persona: Persona,
        /// The auth type it was combined with.
        auth_type: AuthType,
    },

    /// Persona string from an inbound header was not recognized.
    #[error("Unknown persona '{persona}'")]
    UnknownPersona {
        /// The unrecognized value.
        persona: String,
    },
}

/// The authenticated principal, resolved once per request.
///
/// All time-scoped inputs (eligibility grace windows, delegate date ranges)
/// are resolved into plain attributes before evaluation, so the policy
/// engine never consults the clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectAttributes {
    /// Which rule family applies.
    pub auth_type: AuthType,

    /// Identifier of the subject (member id for HSID, operator id for proxy).
    pub user_id: String,

    /// Role classification.
    pub persona: Persona,

    /// Granted permission tokens keyed by resource-owner (member) id.
    #[serde(default)]
    pub permissions_by_resource: HashMap<String, BTreeSet<Permission>>,

    /// Operator identifier (proxy subjects only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator_id: Option<String>,

    /// Member ids the operator is assigned to (proxy subjects only).
    #[serde(default)]
    pub assigned_member_ids: Vec<String>,

    /// Whether the subject has an active (or in-grace-period) eligibility
    /// plan. Precomputed at subject build time.
    #[serde(default)]
    pub eligibility_active: bool,
}

impl SubjectAttributes {
    /// Creates attributes for a session-backed HSID subject.
    ///
    /// # Errors
    ///
    /// Returns [`SubjectError::PersonaMismatch`] unless the persona is
    /// `individual` or `parent`.
    pub fn hsid(user_id: impl Into<String>, persona: Persona) -> Result<Self, SubjectError> {
        if !persona.matches_auth_type(AuthType::Hsid) {
            return Err(SubjectError::PersonaMismatch {
                persona,
                auth_type: AuthType::Hsid,
            });
        }
        Ok(Self {
            auth_type: AuthType::Hsid,
            user_id: user_id.into(),
            persona,
            permissions_by_resource: HashMap::new(),
            operator_id: None,
            assigned_member_ids: Vec::new(),
            eligibility_active: false,
        })
    }

    /// Creates attributes for a proxy subject from perimeter identity.
    ///
    /// # Errors
    ///
    /// Returns [`SubjectError::PersonaMismatch`] unless the persona is
    /// `agent`, `case_worker`, or `config`.
    pub fn proxy(
        operator_id: impl Into<String>,
        persona: Persona,
        assigned_member_ids: Vec<String>,
    ) -> Result<Self, SubjectError> {
        if !persona.matches_auth_type(AuthType::Proxy) {
            return Err(SubjectError::PersonaMismatch {
                persona,
                auth_type: AuthType::Proxy,
            });
        }
        let operator_id = operator_id.into();
        Ok(Self {
            auth_type: AuthType::Proxy,
            user_id: operator_id.clone(),
            persona,
            permissions_by_resource: HashMap::new(),
            operator_id: Some(operator_id),
            assigned_member_ids,
            eligibility_active: true,
        })
    }

    /// Grants permission tokens for a resource owner (builder style).
    #[must_use]
    pub fn with_permissions(
        mut self,
        owner_id: impl Into<String>,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Self {
        self.permissions_by_resource
            .entry(owner_id.into())
            .or_default()
            .extend(permissions);
        self
    }

    /// Marks the subject's eligibility as active (builder style).
    #[must_use]
    pub fn with_eligibility(mut self, active: bool) -> Self {
        self.eligibility_active = active;
        self
    }

    /// Returns `true` if the subject holds every listed token for the owner.
    #[must_use]
    pub fn has_all_permissions(&self, owner_id: &str, required: &[Permission]) -> bool {
        self.missing_permissions(owner_id, required).is_empty()
    }

    /// Returns the tokens from `required` the subject does not hold for the
    /// owner, in declaration order.
    #[must_use]
    pub fn missing_permissions(&self, owner_id: &str, required: &[Permission]) -> Vec<Permission> {
        let granted = self.permissions_by_resource.get(owner_id);
        required
            .iter()
            .copied()
            .filter(|p| granted.is_none_or(|set| !set.contains(p)))
            .collect()
    }

    /// Returns `true` if the operator is assigned to the given member.
    #[must_use]
    pub fn is_assigned_to(&self, member_id: &str) -> bool {
        self.assigned_member_ids.iter().any(|m| m == member_id)
    }
}
