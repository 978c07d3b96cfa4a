//! Actions a subject can request against a resource.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The closed set of operations the authorization engine rules on.
///
/// Adding a variant is a deliberate contract change: every policy must be
/// reviewed so that unknown actions stay reject-by-default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Read non-sensitive data.
    View,
    /// Read data classified as sensitive (requires consent to release).
    ViewSensitive,
    /// Modify an existing resource.
    Edit,
    /// Remove a resource.
    Delete,
    /// Enumerate resources (e.g., a document listing).
    List,
    /// Add a new resource (e.g., a document upload).
    Upload,
}

impl Action {
    /// Returns `true` for actions that read data rather than mutate it.
    #[must_use]
    pub fn is_read(self) -> bool {
        matches!(self, Self::View | Self::ViewSensitive | Self::List)
    }

    /// Returns the stable wire name of this action.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::View => "VIEW",
            Self::ViewSensitive => "VIEW_SENSITIVE",
            Self::Edit => "EDIT",
            Self::Delete => "DELETE",
            Self::List => "LIST",
            Self::Upload => "UPLOAD",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
