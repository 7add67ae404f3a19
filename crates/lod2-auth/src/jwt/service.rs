//! Refresh/access token issuance and verification.

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, Header, Validation, decode, encode};
use tracing::{debug, info};

use lod2_core::config::AuthConfig;
use lod2_core::error::{AppError, ErrorKind};
use lod2_core::types::SessionId;
use lod2_entity::session::Session;
use lod2_entity::user::User;

use super::claims::{AUDIENCE_ACCESS, AUDIENCE_REFRESH, SignedToken, TokenClaims, compact_roles};
use super::keys::KeyPair;
use crate::credential::CredentialStore;
use crate::error::{AuthError, AuthResult};
use crate::rbac::RoleStore;
use crate::session::SessionStore;

/// Signs and verifies RS256 tokens. Holds no state of its own beyond the
/// injected key pair.
#[derive(Debug, Clone)]
pub struct TokenService {
    keys: Arc<KeyPair>,
    credentials: Arc<CredentialStore>,
    sessions: Arc<SessionStore>,
    roles: Arc<RoleStore>,
    issuer: String,
    access_ttl: Duration,
    validation: Validation,
}

impl TokenService {
    pub fn new(
        keys: Arc<KeyPair>,
        credentials: Arc<CredentialStore>,
        sessions: Arc<SessionStore>,
        roles: Arc<RoleStore>,
        config: &AuthConfig,
    ) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss"]);
        // Audience is checked per call site.
        validation.validate_aud = false;
        validation.leeway = config.clock_leeway_seconds;

        Self {
            keys,
            credentials,
            sessions,
            roles,
            issuer: config.issuer.clone(),
            access_ttl: Duration::seconds(config.access_token_ttl_seconds as i64),
            validation,
        }
    }

    /// Verifies credentials, opens a session and returns a refresh token
    /// that expires with the session.
    pub async fn issue_refresh_token(
        &self,
        username: &str,
        password: &str,
    ) -> AuthResult<SignedToken> {
        let user = self.credentials.verify_login(username, password).await?;
        let token = self.issue_refresh_token_for(&user).await?;

        info!(user_id = %user.user_id, "Login succeeded");
        Ok(token)
    }

    /// Opens a session for a user whose credentials were already checked,
    /// e.g. one that just registered.
    pub async fn issue_refresh_token_for(&self, user: &User) -> AuthResult<SignedToken> {
        if !user.can_login() {
            return Err(AuthError::InvalidUsername);
        }
        let session = self.sessions.create(user.user_id).await?;

        let claims = TokenClaims {
            iss: self.issuer.clone(),
            iat: session.issued_at.timestamp(),
            exp: session.expires_at.timestamp(),
            sub: Some(session.session_id.to_string()),
            aud: Some(AUDIENCE_REFRESH.to_string()),
            username: Some(user.username.clone()),
            sid: None,
            roles: None,
        };
        self.sign(&claims)
    }

    /// Mints an access token from a serialized refresh token.
    pub async fn issue_access_token(&self, refresh_token: &str) -> AuthResult<SignedToken> {
        let claims = self.parse_token(refresh_token)?;
        self.issue_access_token_from(&claims).await
    }

    /// Mints an access token from already verified refresh token claims.
    ///
    /// The bound session must still be valid; its `refreshed_at` is bumped
    /// and the user's current grants are embedded.
    pub async fn issue_access_token_from(&self, refresh: &TokenClaims) -> AuthResult<SignedToken> {
        let session = self.refresh_session(refresh).await?;
        self.sessions.touch_refresh(session.session_id).await?;
        let roles = self.roles.get_roles(session.user_id).await?;

        let now = Utc::now();
        let claims = TokenClaims {
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
            sub: Some(session.user_id.to_string()),
            aud: Some(AUDIENCE_ACCESS.to_string()),
            username: refresh.username.clone(),
            sid: Some(session.session_id.to_string()),
            roles: Some(compact_roles(&roles)),
        };
        let token = self.sign(&claims)?;

        debug!(user_id = %session.user_id, session_id = %session.session_id, "Access token issued");
        Ok(token)
    }

    async fn refresh_session(&self, refresh: &TokenClaims) -> AuthResult<Session> {
        if !refresh.is_refresh() {
            return Err(AuthError::MalformedToken("audience is not refresh"));
        }
        let session_id: SessionId = refresh
            .sub
            .as_deref()
            .ok_or(AuthError::MalformedToken("missing subject"))?
            .parse()
            .map_err(|_| AuthError::MalformedToken("subject is not a session"))?;

        self.sessions
            .find_valid(session_id)
            .await?
            .ok_or(AuthError::InvalidSession)
    }

    /// Checks signature, issuer and expiry and returns the claims.
    ///
    /// Every failure collapses into [`AuthError::MalformedToken`].
    pub fn parse_token(&self, token: &str) -> AuthResult<TokenClaims> {
        decode::<TokenClaims>(token, self.keys.decoding_key(), &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "Token rejected");
                AuthError::MalformedToken(match e.kind() {
                    JwtErrorKind::ExpiredSignature => "expired",
                    JwtErrorKind::InvalidIssuer => "wrong issuer",
                    JwtErrorKind::InvalidSignature => "bad signature",
                    _ => "unparseable",
                })
            })
    }

    pub fn verify_token(&self, token: &str) -> bool {
        self.parse_token(token).is_ok()
    }

    /// Signs an arbitrary claim set with the process key.
    pub fn sign(&self, claims: &TokenClaims) -> AuthResult<SignedToken> {
        let token = encode(&Header::new(Algorithm::RS256), claims, self.keys.encoding_key())
            .map_err(|e| AppError::with_source(ErrorKind::Crypto, "Failed to sign token", e))?;
        Ok(SignedToken {
            token,
            claims: claims.clone(),
        })
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }
}
