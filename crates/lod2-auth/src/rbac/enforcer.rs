//! The authorization primitive every role check builds on.

use lod2_entity::role::{AccessLevel, AccessScope, Role};

/// True iff some entry for `scope` holds at least `minimum`.
pub fn has_role(roles: &[Role], scope: AccessScope, minimum: AccessLevel) -> bool {
    roles
        .iter()
        .any(|role| role.scope == scope && role.level.satisfies(minimum))
}

/// Highest level held in `scope`, `None` when absent.
pub fn effective_level(roles: &[Role], scope: AccessScope) -> AccessLevel {
    roles
        .iter()
        .filter(|role| role.scope == scope)
        .map(|role| role.level)
        .max()
        .unwrap_or(AccessLevel::None)
}

/// Expands a possibly sparse grant list to exactly one entry per scope.
pub fn complete(roles: &[Role]) -> Vec<Role> {
    AccessScope::ALL
        .into_iter()
        .map(|scope| Role::new(scope, effective_level(roles, scope)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_implies_view() {
        let roles = vec![Role::new(AccessScope::FileStorage, AccessLevel::Edit)];
        assert!(has_role(&roles, AccessScope::FileStorage, AccessLevel::View));
        assert!(has_role(&roles, AccessScope::FileStorage, AccessLevel::Edit));
    }

    #[test]
    fn test_view_does_not_imply_edit() {
        let roles = vec![Role::new(AccessScope::Media, AccessLevel::View)];
        assert!(!has_role(&roles, AccessScope::Media, AccessLevel::Edit));
    }

    #[test]
    fn test_grants_do_not_leak_across_scopes() {
        let roles = vec![Role::new(AccessScope::UserManagement, AccessLevel::Edit)];
        assert!(!has_role(&roles, AccessScope::DangerousSql, AccessLevel::View));
    }

    #[test]
    fn test_complete_fills_missing_scopes() {
        let roles = complete(&[Role::new(AccessScope::DangerousSql, AccessLevel::View)]);
        assert_eq!(roles.len(), AccessScope::ALL.len());
        assert_eq!(effective_level(&roles, AccessScope::DangerousSql), AccessLevel::View);
        assert_eq!(effective_level(&roles, AccessScope::Media), AccessLevel::None);
        assert!(has_role(&roles, AccessScope::Media, AccessLevel::None));
    }
}
