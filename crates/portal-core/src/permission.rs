//! Delegate permission tokens.
//!
//! Delegate access to a member's data is granted as a tuple of permission
//! tokens per member. The tokens compose: viewing requires legal authority
//! plus registration, viewing sensitive data additionally requires consent
//! to release.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single delegate permission token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    /// Legal authority to act on behalf of the member.
    Daa,
    /// Representative registration for the member.
    Rpr,
    /// Consent to release sensitive information.
    Roi,
}

/// Tokens required to view non-sensitive member data.
pub const CAN_VIEW: &[Permission] = &[Permission::Daa, Permission::Rpr];

/// Tokens required to view sensitive member data.
pub const CAN_VIEW_SENSITIVE: &[Permission] = &[Permission::Daa, Permission::Rpr, Permission::Roi];

impl Permission {
    /// Returns the stable wire name of this token.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daa => "DAA",
            Self::Rpr => "RPR",
            Self::Roi => "ROI",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
