//! Session record types.
//!
//! # Security
//!
//! - Session ids are random UUIDs; the raw id only ever appears in the
//!   `BFF_SESSION` cookie and the store key. Logs carry a hash.
//! - The binding fingerprint captured at creation is validated on every
//!   request (see [`crate::security::SessionSecurity`]).

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use portal_core::{Permission, Persona};

/// Server-side session record, owned exclusively by the session store.
///
/// The authorization layer only reads it to build subject attributes;
/// all mutation goes through the store and the security service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BffSession {
    /// Session identifier (cookie value).
    pub id: Uuid,

    /// Identity provider subject id for the logged-in user.
    pub hsid_uuid: String,

    /// User's given name.
    pub first_name: String,

    /// User's family name.
    pub last_name: String,

    /// Contact email, when the identity provider supplied one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// End-user persona (individual or parent).
    pub persona: Persona,

    /// Delegate permission tokens keyed by managed member id.
    #[serde(default)]
    pub delegate_grants: HashMap<String, BTreeSet<Permission>>,

    /// Managed members: member id to display name.
    #[serde(default)]
    pub managed_members: HashMap<String, String>,

    /// Eligibility plans with precomputed grace-period flags.
    #[serde(default)]
    pub eligibility_plans: Vec<EligibilityPlan>,

    /// Opaque upstream tokens held for the frontend.
    pub tokens: SessionTokens,

    /// When the session was created. Rotation resets this.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// Last time the session was read or refreshed.
    #[serde(with = "time::serde::rfc3339")]
    pub last_accessed_at: OffsetDateTime,

    /// Client fingerprint captured at creation.
    pub binding: SessionBinding,
}

impl BffSession {
    /// Returns `true` if the session passed its idle TTL.
    #[must_use]
    pub fn is_expired(&self, ttl: Duration) -> bool {
        OffsetDateTime::now_utc() - self.last_accessed_at > ttl
    }

    /// Returns `true` once the session id is old enough to rotate.
    #[must_use]
    pub fn needs_rotation(&self, rotation_interval: Duration) -> bool {
        OffsetDateTime::now_utc() - self.created_at > rotation_interval
    }

    /// Returns `true` if any eligibility plan is active or within its
    /// post-termination grace window.
    ///
    /// The grace computation happens upstream when the plan list is
    /// assembled; here it is already a plain flag.
    #[must_use]
    pub fn has_active_eligibility(&self) -> bool {
        self.eligibility_plans
            .iter()
            .any(|p| p.active || p.in_grace_period)
    }
}

/// One eligibility plan attached to the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityPlan {
    /// Plan identifier.
    pub plan_id: String,

    /// Whether the plan is currently active.
    pub active: bool,

    /// Whether a terminated plan is still within its access grace window.
    /// Precomputed upstream; never derived from the clock here.
    #[serde(default)]
    pub in_grace_period: bool,
}

/// Opaque upstream tokens carried by the session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTokens {
    /// Access token for upstream health-data calls.
    pub access_token: String,

    /// Refresh token, when issued.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// OIDC id token, kept for logout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}

/// Client fingerprint a session is bound to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionBinding {
    /// Client IP observed at creation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<String>,

    /// Browser fingerprint (user-agent derivative) observed at creation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_fingerprint: Option<String>,
}

/// Payload for creating a session at the login callback.
#[derive(Debug, Clone)]
pub struct NewSession {
    /// Identity provider subject id.
    pub hsid_uuid: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact email.
    pub email: Option<String>,
    /// End-user persona.
    pub persona: Persona,
    /// Delegate grants keyed by member id.
    pub delegate_grants: HashMap<String, BTreeSet<Permission>>,
    /// Managed members keyed by member id.
    pub managed_members: HashMap<String, String>,
    /// Eligibility plans with precomputed grace flags.
    pub eligibility_plans: Vec<EligibilityPlan>,
    /// Upstream tokens.
    pub tokens: SessionTokens,
}

impl NewSession {
    /// Minimal payload for a self-service member.
    #[must_use]
    pub fn individual(hsid_uuid: impl Into<String>, first_name: impl Into<String>) -> Self {
        Self {
            hsid_uuid: hsid_uuid.into(),
            first_name: first_name.into(),
            last_name: String::new(),
            email: None,
            persona: Persona::Individual,
            delegate_grants: HashMap::new(),
            managed_members: HashMap::new(),
            eligibility_plans: Vec::new(),
            tokens: SessionTokens::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with_ages(created_secs_ago: i64, accessed_secs_ago: i64) -> BffSession {
        let now = OffsetDateTime::now_utc();
        BffSession {
            id: Uuid::new_v4(),
            hsid_uuid: "hsid-1".to_string(),
            first_name: "Ada".to_string(),
            last_name: "L".to_string(),
            email: None,
            persona: Persona::Individual,
            delegate_grants: HashMap::new(),
            managed_members: HashMap::new(),
            eligibility_plans: Vec::new(),
            tokens: SessionTokens::default(),
            created_at: now - time::Duration::seconds(created_secs_ago),
            last_accessed_at: now - time::Duration::seconds(accessed_secs_ago),
            binding: SessionBinding::default(),
        }
    }

    #[test]
    fn test_expiry_uses_last_access() {
        let session = session_with_ages(3600, 10);
        assert!(!session.is_expired(Duration::from_secs(60)));
        assert!(session.is_expired(Duration::from_secs(5)));
    }

    #[test]
    fn test_rotation_uses_creation_time() {
        let session = session_with_ages(1200, 1);
        assert!(session.needs_rotation(Duration::from_secs(900)));
        assert!(!session.needs_rotation(Duration::from_secs(3600)));
    }

    #[test]
    fn test_grace_period_counts_as_eligible() {
        let mut session = session_with_ages(0, 0);
        assert!(!session.has_active_eligibility());

        session.eligibility_plans.push(EligibilityPlan {
            plan_id: "P1".to_string(),
            active: false,
            in_grace_period: true,
        });
        assert!(session.has_active_eligibility());
    }

    #[test]
    fn test_session_round_trips_through_json() {
        let mut session = session_with_ages(0, 0);
        session
            .delegate_grants
            .entry("D1".to_string())
            .or_default()
            .extend([Permission::Daa, Permission::Rpr]);

        let json = serde_json::to_string(&session).unwrap();
        let back: BffSession = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, session.id);
        assert_eq!(back.delegate_grants["D1"].len(), 2);
        assert_eq!(back.persona, Persona::Individual);
    }
}
