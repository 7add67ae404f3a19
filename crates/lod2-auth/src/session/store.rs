//! Session storage operations wrapping the database repository.
//!
//! Lifecycle per session: `Active` while `expires_at > now`, then `Expired`
//! either naturally or through invalidation. There is no way back.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use tracing::{debug, info};

use lod2_core::config::AuthConfig;
use lod2_core::types::{SessionId, UserId};
use lod2_database::DatabasePool;
use lod2_database::connection::commit;
use lod2_database::repositories::SessionRepository;
use lod2_entity::session::{Session, SessionListing};

use crate::error::{AuthError, AuthResult};

/// Owns the `sessions` table.
#[derive(Debug, Clone)]
pub struct SessionStore {
    db: DatabasePool,
    repo: SessionRepository,
    /// Fixed window from login to expiry. Never extended.
    lifetime: Duration,
}

impl SessionStore {
    /// Creates a session store whose sessions last `refresh_token_ttl_days`.
    pub fn new(db: DatabasePool, config: &AuthConfig) -> Self {
        Self::with_lifetime(db, Duration::days(config.refresh_token_ttl_days as i64))
    }

    /// Creates a session store with an explicit session lifetime.
    pub fn with_lifetime(db: DatabasePool, lifetime: Duration) -> Self {
        let repo = SessionRepository::new(db.pool().clone());
        Self { db, repo, lifetime }
    }

    /// Timestamps are kept at the millisecond precision of the store.
    fn now() -> DateTime<Utc> {
        Utc::now().trunc_subsecs(3)
    }

    /// Starts a new session for a user.
    pub async fn create(&self, user_id: UserId) -> AuthResult<Session> {
        let now = Self::now();
        let session = Session {
            session_id: SessionId::new(),
            user_id,
            issued_at: now,
            refreshed_at: now,
            expires_at: now + self.lifetime,
        };
        self.repo.insert(&session).await?;

        info!(user_id = %user_id, session_id = %session.session_id, "Session created");
        Ok(session)
    }

    /// True iff the session exists and has not expired.
    pub async fn is_valid(&self, session_id: SessionId) -> AuthResult<bool> {
        Ok(self.find_valid(session_id).await?.is_some())
    }

    /// Returns the session only while it is valid.
    pub async fn find_valid(&self, session_id: SessionId) -> AuthResult<Option<Session>> {
        let now = Self::now();
        Ok(self
            .repo
            .find_by_id(session_id)
            .await?
            .filter(|session| session.is_valid_at(now)))
    }

    /// Records that an access token was minted from the session.
    ///
    /// Fails with [`AuthError::InvalidSession`] if the session expired in
    /// the meantime. `expires_at` is left untouched.
    pub async fn touch_refresh(&self, session_id: SessionId) -> AuthResult<()> {
        if self.repo.touch_refresh(session_id, Self::now()).await? {
            Ok(())
        } else {
            Err(AuthError::InvalidSession)
        }
    }

    /// Expires a session now. Calling it on an expired session is a no-op.
    pub async fn invalidate(&self, session_id: SessionId) -> AuthResult<()> {
        let expired = self.repo.expire(session_id, Self::now()).await?;
        if expired {
            info!(session_id = %session_id, "Session invalidated");
        } else {
            debug!(session_id = %session_id, "Session already expired or unknown");
        }
        Ok(())
    }

    /// Expires every live session of a user. Returns how many were live.
    pub async fn invalidate_all_for_user(&self, user_id: UserId) -> AuthResult<u64> {
        let mut tx = self.db.begin().await?;
        let count = self.invalidate_all_in(&mut tx, user_id).await?;
        commit(tx).await?;
        Ok(count)
    }

    /// Same as [`Self::invalidate_all_for_user`] inside a caller's transaction.
    pub async fn invalidate_all_in(
        &self,
        conn: &mut sqlx::SqliteConnection,
        user_id: UserId,
    ) -> AuthResult<u64> {
        let count = self
            .repo
            .expire_all_for_user(conn, user_id, Self::now())
            .await?;
        info!(user_id = %user_id, count, "Sessions invalidated for user");
        Ok(count)
    }

    /// Every session of a user, newest first, with the derived expired flag.
    pub async fn list_for_user(&self, user_id: UserId) -> AuthResult<Vec<SessionListing>> {
        let now = Self::now();
        Ok(self
            .repo
            .find_by_user(user_id)
            .await?
            .iter()
            .map(|session| session.listing(now))
            .collect())
    }

    /// Number of live sessions of a user.
    pub async fn count_active(&self, user_id: UserId) -> AuthResult<i64> {
        Ok(self.repo.count_active_by_user(user_id, Self::now()).await?)
    }
}
