//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use lod2_auth::{
    AccessControl, CredentialStore, InviteLedger, KeyPair, PasswordHasher, PasswordValidator,
    RoleStore, SessionStore, TokenService,
};
use lod2_core::config::AppConfig;
use lod2_core::error::AppError;
use lod2_database::DatabasePool;

use crate::cookies::CookieSettings;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Names and flags of the token cookies
    pub cookies: Arc<CookieSettings>,

    // ── Infrastructure ───────────────────────────────────────
    /// SQLite connection pool
    pub db: DatabasePool,

    // ── Auth ─────────────────────────────────────────────────
    /// User rows and password checks
    pub credentials: Arc<CredentialStore>,
    /// Session lifecycle
    pub sessions: Arc<SessionStore>,
    /// Role grants
    pub roles: Arc<RoleStore>,
    /// Invite codes and quotas
    pub invites: Arc<InviteLedger>,
    /// Refresh/access token signing
    pub tokens: Arc<TokenService>,
    /// Per-request identity facade
    pub access: Arc<AccessControl>,
}

impl AppState {
    /// Wires the auth core over an open database and a loaded key pair.
    pub fn new(config: AppConfig, db: DatabasePool, keys: Arc<KeyPair>) -> Result<Self, AppError> {
        let auth = &config.auth;

        let roles = Arc::new(RoleStore::new(db.clone()));
        let sessions = Arc::new(SessionStore::new(db.clone(), auth));
        let credentials = Arc::new(CredentialStore::new(
            db.clone(),
            Arc::clone(&roles),
            PasswordHasher::new(auth)?,
            PasswordValidator::new(auth),
        ));
        let invites = Arc::new(InviteLedger::new(
            db.clone(),
            Arc::clone(&credentials),
            Arc::clone(&roles),
            auth,
        ));
        let tokens = Arc::new(TokenService::new(
            keys,
            Arc::clone(&credentials),
            Arc::clone(&sessions),
            Arc::clone(&roles),
            auth,
        ));
        let access = Arc::new(AccessControl::new(
            Arc::clone(&tokens),
            Arc::clone(&sessions),
            Arc::clone(&roles),
        ));

        Ok(Self {
            cookies: Arc::new(CookieSettings::from_config(auth)),
            config: Arc::new(config),
            db,
            credentials,
            sessions,
            roles,
            invites,
            tokens,
            access,
        })
    }
}
