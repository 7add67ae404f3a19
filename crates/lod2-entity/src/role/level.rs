//! Access level enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Capability tier within a scope.
///
/// Levels are totally ordered: `None < View < Edit`. A higher level implies
/// every capability of the lower ones in the same scope.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[repr(i64)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    /// No access to the scope.
    #[default]
    None = 0,
    /// Read-only access.
    View = 1,
    /// Read and modify access.
    Edit = 2,
}

impl AccessLevel {
    /// Every level, lowest first.
    pub const ALL: [AccessLevel; 3] = [Self::None, Self::View, Self::Edit];

    /// Check if this level grants at least `minimum`.
    pub fn satisfies(&self, minimum: AccessLevel) -> bool {
        *self >= minimum
    }

    /// Return the level as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::View => "view",
            Self::Edit => "edit",
        }
    }

    /// Human-readable label.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::View => "View",
            Self::Edit => "Edit",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = lod2_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "view" => Ok(Self::View),
            "edit" => Ok(Self::Edit),
            _ => Err(lod2_core::AppError::validation(format!(
                "Invalid access level: '{s}'. Expected one of: none, view, edit"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(AccessLevel::Edit.satisfies(AccessLevel::View));
        assert!(AccessLevel::Edit.satisfies(AccessLevel::Edit));
        assert!(AccessLevel::View.satisfies(AccessLevel::None));
        assert!(!AccessLevel::View.satisfies(AccessLevel::Edit));
        assert!(!AccessLevel::None.satisfies(AccessLevel::View));
    }

    #[test]
    fn test_from_str() {
        assert_eq!("EDIT".parse::<AccessLevel>().unwrap(), AccessLevel::Edit);
        assert!("admin".parse::<AccessLevel>().is_err());
    }
}
