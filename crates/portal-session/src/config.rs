//! Session configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Session lifecycle and security configuration.
///
/// # Example (TOML)
///
/// ```toml
/// [session]
/// ttl = "30m"
/// rotation_interval = "15m"
///
/// [session.binding]
/// bind_ip = true
/// bind_user_agent = true
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Idle TTL: sessions unread for this long are expired.
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,

    /// Age after which the session id is rotated.
    #[serde(with = "humantime_serde")]
    pub rotation_interval: Duration,

    /// How often the expiry sweep runs.
    #[serde(with = "humantime_serde")]
    pub sweep_interval: Duration,

    /// Upper bound on a single store lookup. A timed-out lookup is
    /// treated as session-not-found, never as an allow.
    #[serde(with = "humantime_serde")]
    pub store_timeout: Duration,

    /// Binding validation strictness.
    pub binding: BindingConfig,

    /// Session cookie settings.
    pub cookie: CookieConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30 * 60),
            rotation_interval: Duration::from_secs(15 * 60),
            sweep_interval: Duration::from_secs(60),
            store_timeout: Duration::from_secs(2),
            binding: BindingConfig::default(),
            cookie: CookieConfig::default(),
        }
    }
}

/// Session binding validation settings.
///
/// Each dimension can be toggled independently; disabling one skips its
/// comparison entirely.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BindingConfig {
    /// Compare the request IP against the stored binding.
    pub bind_ip: bool,

    /// Compare the browser fingerprint against the stored binding.
    pub bind_user_agent: bool,

    /// Escalate to a hijack event when every enabled dimension
    /// mismatches at once. A single-dimension mismatch stays a soft
    /// binding failure.
    pub escalate_on_full_mismatch: bool,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            bind_ip: true,
            bind_user_agent: true,
            escalate_on_full_mismatch: true,
        }
    }
}

/// Session cookie settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CookieConfig {
    /// Cookie name.
    pub name: String,

    /// Set the `Secure` attribute.
    pub secure: bool,

    /// Set the `HttpOnly` attribute.
    pub http_only: bool,

    /// `SameSite` policy: `strict`, `lax`, or `none`.
    pub same_site: String,

    /// Optional cookie domain scope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "BFF_SESSION".to_string(),
            secure: true,
            http_only: true,
            same_site: "lax".to_string(),
            domain: None,
        }
    }
}
