//! Claim set shared by refresh and access tokens.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lod2_entity::role::{AccessLevel, AccessScope, Role};

/// Audience of a refresh token.
pub const AUDIENCE_REFRESH: &str = "refresh";
/// Audience of an access token.
pub const AUDIENCE_ACCESS: &str = "access";

/// JWT claims payload.
///
/// A refresh token's subject is a session ID; an access token's subject is
/// a user ID and `sid` names the session it was minted from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Issuer.
    pub iss: String,
    /// Issued-at (seconds since epoch).
    pub iat: i64,
    /// Expiration (seconds since epoch).
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// `refresh` or `access`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    /// Grants above `None` at issuance time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<BTreeMap<AccessScope, AccessLevel>>,
}

impl TokenClaims {
    pub fn is_refresh(&self) -> bool {
        self.aud.as_deref() == Some(AUDIENCE_REFRESH)
    }

    pub fn is_access(&self) -> bool {
        self.aud.as_deref() == Some(AUDIENCE_ACCESS)
    }

    /// Returns the expiration as a `DateTime<Utc>`.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_default()
    }

    /// Remaining lifetime in seconds, zero once expired.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        (self.exp - now.timestamp()).max(0)
    }

    /// The cached role claim as one entry per known scope.
    pub fn role_list(&self) -> Vec<Role> {
        AccessScope::ALL
            .iter()
            .map(|scope| {
                let level = self
                    .roles
                    .as_ref()
                    .and_then(|roles| roles.get(scope).copied())
                    .unwrap_or_default();
                Role::new(*scope, level)
            })
            .collect()
    }
}

/// Compacts a role list into the claim form, dropping `None` levels.
pub fn compact_roles(roles: &[Role]) -> BTreeMap<AccessScope, AccessLevel> {
    roles
        .iter()
        .filter(|role| role.level > AccessLevel::None)
        .map(|role| (role.scope, role.level))
        .collect()
}

/// A signed token together with the claims it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedToken {
    /// Compact JWS serialization.
    pub token: String,
    pub claims: TokenClaims,
}

impl SignedToken {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.claims.expires_at()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn access_claims() -> TokenClaims {
        TokenClaims {
            iss: "https://lod2.zip".into(),
            iat: 1_700_000_000,
            exp: 1_700_000_900,
            sub: Some("user_x".into()),
            aud: Some(AUDIENCE_ACCESS.into()),
            username: Some("alice".into()),
            sid: Some("session_y".into()),
            roles: Some(compact_roles(&[
                Role::new(AccessScope::UserManagement, AccessLevel::View),
                Role::new(AccessScope::Media, AccessLevel::None),
            ])),
        }
    }

    #[test]
    fn test_roles_claim_is_compact() {
        let json = serde_json::to_value(access_claims()).unwrap();
        assert_eq!(json["roles"], serde_json::json!({ "user_management": "view" }));
        assert_eq!(json["aud"], "access");
    }

    #[test]
    fn test_absent_claims_are_omitted() {
        let claims = TokenClaims {
            sub: None,
            aud: None,
            username: None,
            sid: None,
            roles: None,
            ..access_claims()
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert!(json.get("sub").is_none());
        assert!(json.get("roles").is_none());

        let back: TokenClaims = serde_json::from_value(json).unwrap();
        assert!(!back.is_refresh());
        assert!(!back.is_access());
    }

    #[test]
    fn test_role_list_expands_every_scope() {
        let roles = access_claims().role_list();
        assert_eq!(roles.len(), AccessScope::ALL.len());
        assert_eq!(roles[0].level, AccessLevel::View);
        assert!(roles[1..].iter().all(|r| r.level == AccessLevel::None));
    }

    #[test]
    fn test_remaining_seconds_floors_at_zero() {
        let claims = access_claims();
        let before = DateTime::from_timestamp(1_700_000_600, 0).unwrap();
        let after = DateTime::from_timestamp(1_700_009_999, 0).unwrap();
        assert_eq!(claims.remaining_seconds(before), 300);
        assert_eq!(claims.remaining_seconds(after), 0);
    }
}
