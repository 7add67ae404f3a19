//! Access scope enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Area of the system to which access can be granted.
///
/// The discriminants are persisted; new scopes must take new values.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[repr(i64)]
#[serde(rename_all = "snake_case")]
pub enum AccessScope {
    /// Creating, inspecting and deleting accounts, sessions and invites.
    UserManagement = 0,
    /// The raw SQL console.
    DangerousSql = 1,
    /// The file storage browser.
    FileStorage = 2,
    /// Media library.
    Media = 3,
}

impl AccessScope {
    /// Every known scope, in discriminant order.
    pub const ALL: [AccessScope; 4] = [
        Self::UserManagement,
        Self::DangerousSql,
        Self::FileStorage,
        Self::Media,
    ];

    /// Return the scope as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserManagement => "user_management",
            Self::DangerousSql => "dangerous_sql",
            Self::FileStorage => "file_storage",
            Self::Media => "media",
        }
    }

    /// Human-readable label.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::UserManagement => "User Management",
            Self::DangerousSql => "Dangerous SQL",
            Self::FileStorage => "File Storage",
            Self::Media => "Media",
        }
    }
}

impl fmt::Display for AccessScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AccessScope {
    type Err = lod2_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|scope| scope.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| lod2_core::AppError::validation(format!("Invalid access scope: '{s}'")))
    }
}
