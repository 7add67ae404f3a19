//! The access control facade: login, transparent access token refresh,
//! role checks and sign-out.

use std::sync::Arc;

use tracing::{debug, warn};

use lod2_core::types::SessionId;
use lod2_entity::role::{AccessLevel, AccessScope};
use lod2_entity::user::User;

use super::context::{AuthContext, Identity};
use crate::error::{AuthError, AuthResult};
use crate::jwt::{SignedToken, TokenService};
use crate::rbac::{RoleStore, has_role};
use crate::session::SessionStore;

/// Tokens handed out on a successful login.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub refresh: SignedToken,
    pub access: SignedToken,
}

/// What the HTTP layer must do with the token cookies after a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieAction {
    /// Leave the cookies as they are.
    Keep,
    /// Store a freshly minted access token.
    SetAccess(SignedToken),
    /// Remove both token cookies.
    Clear,
}

/// Outcome of resolving a request's token pair.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub context: AuthContext,
    pub cookies: CookieAction,
}

impl Resolution {
    fn anonymous(cookies: CookieAction) -> Self {
        Self {
            context: AuthContext::anonymous(),
            cookies,
        }
    }
}

/// Public contract consumed by request handling code.
#[derive(Debug, Clone)]
pub struct AccessControl {
    tokens: Arc<TokenService>,
    sessions: Arc<SessionStore>,
    roles: Arc<RoleStore>,
}

impl AccessControl {
    pub fn new(
        tokens: Arc<TokenService>,
        sessions: Arc<SessionStore>,
        roles: Arc<RoleStore>,
    ) -> Self {
        Self {
            tokens,
            sessions,
            roles,
        }
    }

    /// Issues a refresh token, then mints the first access token from it.
    pub async fn login(&self, username: &str, password: &str) -> AuthResult<IssuedTokens> {
        let refresh = self.tokens.issue_refresh_token(username, password).await?;
        self.with_access(refresh).await
    }

    /// Signs in a user without a password check. Used right after
    /// registration, where the password was just set.
    pub async fn login_as(&self, user: &User) -> AuthResult<IssuedTokens> {
        let refresh = self.tokens.issue_refresh_token_for(user).await?;
        self.with_access(refresh).await
    }

    async fn with_access(&self, refresh: SignedToken) -> AuthResult<IssuedTokens> {
        let access = self.tokens.issue_access_token_from(&refresh.claims).await?;
        Ok(IssuedTokens { refresh, access })
    }

    /// Resolves the identity of a request from its token cookies.
    ///
    /// A valid access token is trusted only if it was minted from the
    /// presented refresh token's session. Otherwise a new one is minted
    /// while the session lives. A missing or broken refresh token makes
    /// the caller anonymous and discards any stale access token.
    pub async fn resolve(&self, refresh: Option<&str>, access: Option<&str>) -> Resolution {
        let Some(refresh) = refresh else {
            return Resolution::anonymous(if access.is_some() {
                CookieAction::Clear
            } else {
                CookieAction::Keep
            });
        };

        let refresh_claims = match self.tokens.parse_token(refresh) {
            Ok(claims) if claims.is_refresh() => claims,
            _ => return Resolution::anonymous(CookieAction::Clear),
        };

        if let Some(identity) = access
            .and_then(|token| self.tokens.parse_token(token).ok())
            .filter(|claims| claims.is_access() && claims.sid == refresh_claims.sub)
            .and_then(|claims| Identity::from_access_claims(&claims))
        {
            return Resolution {
                context: AuthContext::authenticated(identity),
                cookies: CookieAction::Keep,
            };
        }

        match self.tokens.issue_access_token_from(&refresh_claims).await {
            Ok(signed) => match Identity::from_access_claims(&signed.claims) {
                Some(identity) => Resolution {
                    context: AuthContext::authenticated(identity),
                    cookies: CookieAction::SetAccess(signed),
                },
                None => Resolution::anonymous(CookieAction::Clear),
            },
            Err(e) if e.is_internal() => {
                warn!(error = %e, "Access token refresh failed");
                Resolution::anonymous(CookieAction::Keep)
            }
            Err(e) => {
                debug!(error = %e, "Refresh token no longer usable");
                if let Some(session_id) = session_of(refresh_claims.sub.as_deref()) {
                    self.expire_session(session_id).await;
                }
                Resolution::anonymous(CookieAction::Clear)
            }
        }
    }

    /// Role check against the Role Store, not the cached claim.
    pub async fn verify_role(
        &self,
        ctx: &AuthContext,
        scope: AccessScope,
        minimum: AccessLevel,
    ) -> AuthResult<bool> {
        let Some(user_id) = ctx.user_id() else {
            return Ok(false);
        };
        let roles = self.roles.get_roles(user_id).await?;
        Ok(has_role(&roles, scope, minimum))
    }

    /// Like [`Self::verify_role`], failing with `NotAuthenticated` or
    /// `Unauthorized`.
    pub async fn require_role(
        &self,
        ctx: &AuthContext,
        scope: AccessScope,
        minimum: AccessLevel,
    ) -> AuthResult<()> {
        if !ctx.is_logged_in() {
            return Err(AuthError::NotAuthenticated);
        }
        if self.verify_role(ctx, scope, minimum).await? {
            Ok(())
        } else {
            Err(AuthError::Unauthorized)
        }
    }

    /// Invalidates the session named by a refresh token. Never fails.
    pub async fn sign_out(&self, refresh: Option<&str>) {
        let Some(claims) = refresh.and_then(|token| self.tokens.parse_token(token).ok()) else {
            return;
        };
        if !claims.is_refresh() {
            return;
        }
        if let Some(session_id) = session_of(claims.sub.as_deref()) {
            self.expire_session(session_id).await;
        }
    }

    /// Best effort invalidation; a storage failure is logged, not returned.
    async fn expire_session(&self, session_id: SessionId) {
        if let Err(e) = self.sessions.invalidate(session_id).await {
            warn!(session_id = %session_id, error = %e, "Could not invalidate session");
        }
    }
}

fn session_of(sub: Option<&str>) -> Option<SessionId> {
    sub?.parse().ok()
}
