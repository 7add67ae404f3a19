//! Explicit per-request identity.

use lod2_core::types::{SessionId, UserId};
use lod2_entity::role::{AccessLevel, AccessScope, Role};

use crate::jwt::TokenClaims;
use crate::rbac::has_role;

/// The authenticated caller as described by a trusted access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub username: String,
    pub session_id: SessionId,
    /// Grants cached in the access token; may lag the Role Store until the
    /// next refresh.
    pub roles: Vec<Role>,
}

impl Identity {
    /// Builds an identity from access token claims. `None` if the claims do
    /// not name a user and a session.
    pub fn from_access_claims(claims: &TokenClaims) -> Option<Self> {
        let user_id = claims.sub.as_deref()?.parse().ok()?;
        let session_id = claims.sid.as_deref()?.parse().ok()?;
        Some(Self {
            user_id,
            username: claims.username.clone().unwrap_or_default(),
            session_id,
            roles: claims.role_list(),
        })
    }
}

/// Request-scoped authentication state handed to handlers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    identity: Option<Identity>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self { identity: None }
    }

    pub fn authenticated(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.identity.is_some()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.identity.as_ref().map(|i| i.user_id)
    }

    pub fn username(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.username.as_str())
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.identity.as_ref().map(|i| i.session_id)
    }

    /// Roles captured in the access token, empty when anonymous.
    pub fn cached_roles(&self) -> &[Role] {
        self.identity
            .as_ref()
            .map(|i| i.roles.as_slice())
            .unwrap_or_default()
    }

    /// Role check against the cached claim, without a store round trip.
    pub fn has_cached_role(&self, scope: AccessScope, minimum: AccessLevel) -> bool {
        self.is_logged_in() && has_role(self.cached_roles(), scope, minimum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::claims::{AUDIENCE_ACCESS, compact_roles};

    fn access_claims() -> TokenClaims {
        TokenClaims {
            iss: "https://lod2.zip".into(),
            iat: 0,
            exp: 0,
            sub: Some(UserId::new().to_string()),
            aud: Some(AUDIENCE_ACCESS.into()),
            username: Some("alice".into()),
            sid: Some(SessionId::new().to_string()),
            roles: Some(compact_roles(&[Role::new(
                AccessScope::FileStorage,
                AccessLevel::Edit,
            )])),
        }
    }

    #[test]
    fn test_identity_from_access_claims() {
        let identity = Identity::from_access_claims(&access_claims()).unwrap();
        let ctx = AuthContext::authenticated(identity);

        assert!(ctx.is_logged_in());
        assert_eq!(ctx.username(), Some("alice"));
        assert!(ctx.has_cached_role(AccessScope::FileStorage, AccessLevel::View));
        assert!(!ctx.has_cached_role(AccessScope::UserManagement, AccessLevel::View));
    }

    #[test]
    fn test_claims_without_session_are_not_an_identity() {
        let mut claims = access_claims();
        claims.sid = None;
        assert!(Identity::from_access_claims(&claims).is_none());

        let mut claims = access_claims();
        claims.sub = Some("session_nope".into());
        assert!(Identity::from_access_claims(&claims).is_none());
    }

    #[test]
    fn test_anonymous_has_nothing() {
        let ctx = AuthContext::anonymous();
        assert!(ctx.user_id().is_none());
        assert!(ctx.cached_roles().is_empty());
        assert!(!ctx.has_cached_role(AccessScope::Media, AccessLevel::None));
    }
}
