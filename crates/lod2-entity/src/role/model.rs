//! Role grant value.

use serde::{Deserialize, Serialize};

use super::{AccessLevel, AccessScope};

/// A (scope, level) pair held by a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Role {
    pub scope: AccessScope,
    pub level: AccessLevel,
}

impl Role {
    pub fn new(scope: AccessScope, level: AccessLevel) -> Self {
        Self { scope, level }
    }

    /// Edit on every known scope.
    pub fn all_edit() -> Vec<Role> {
        AccessScope::ALL
            .into_iter()
            .map(|scope| Role::new(scope, AccessLevel::Edit))
            .collect()
    }

    /// Label such as `User Management: Edit`.
    pub fn display_name(&self) -> String {
        format!("{}: {}", self.scope.display_name(), self.level.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        let role = Role::new(AccessScope::UserManagement, AccessLevel::Edit);
        assert_eq!(role.display_name(), "User Management: Edit");
        let role = Role::new(AccessScope::DangerousSql, AccessLevel::None);
        assert_eq!(role.display_name(), "Dangerous SQL: None");
    }

    #[test]
    fn test_serde_shape() {
        let role = Role::new(AccessScope::FileStorage, AccessLevel::View);
        let json = serde_json::to_value(role).unwrap();
        assert_eq!(json, serde_json::json!({"scope": "file_storage", "level": "view"}));
    }

    #[test]
    fn test_all_edit_covers_every_scope() {
        let roles = Role::all_edit();
        assert_eq!(roles.len(), AccessScope::ALL.len());
        assert!(roles.iter().all(|r| r.level == AccessLevel::Edit));
    }
}
