//! Session repository implementation.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};

use lod2_core::error::{AppError, ErrorKind};
use lod2_core::result::AppResult;
use lod2_core::types::{SessionId, UserId};
use lod2_entity::session::Session;

use crate::timestamp::{from_millis, to_millis};

#[derive(FromRow)]
struct SessionRow {
    session_id: SessionId,
    user_id: UserId,
    issued_at: i64,
    refreshed_at: i64,
    expires_at: i64,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Self {
            session_id: row.session_id,
            user_id: row.user_id,
            issued_at: from_millis(row.issued_at),
            refreshed_at: from_millis(row.refreshed_at),
            expires_at: from_millis(row.expires_at),
        }
    }
}

/// Repository for session rows. Rows are never deleted.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    /// Create a new session repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new session.
    pub async fn insert(&self, session: &Session) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO sessions (session_id, user_id, issued_at, refreshed_at, expires_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(session.session_id)
        .bind(session.user_id)
        .bind(to_millis(session.issued_at))
        .bind(to_millis(session.refreshed_at))
        .bind(to_millis(session.expires_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create session", e))?;
        Ok(())
    }

    /// Find a session by ID, expired or not.
    pub async fn find_by_id(&self, id: SessionId) -> AppResult<Option<Session>> {
        sqlx::query_as::<_, SessionRow>(
            "SELECT session_id, user_id, issued_at, refreshed_at, expires_at \
             FROM sessions WHERE session_id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map(|row| row.map(Session::from))
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find session", e))
    }

    /// List every session of a user, newest first.
    pub async fn find_by_user(&self, user_id: UserId) -> AppResult<Vec<Session>> {
        sqlx::query_as::<_, SessionRow>(
            "SELECT session_id, user_id, issued_at, refreshed_at, expires_at \
             FROM sessions WHERE user_id = ? ORDER BY issued_at DESC, session_id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map(|rows| rows.into_iter().map(Session::from).collect())
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list sessions", e))
    }

    /// Count sessions of a user that are still valid at `now`.
    pub async fn count_active_by_user(&self, user_id: UserId, now: DateTime<Utc>) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM sessions WHERE user_id = ? AND expires_at > ?")
            .bind(user_id)
            .bind(to_millis(now))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count active sessions", e)
            })
    }

    /// Set `refreshed_at` on a session that is still valid at `now`.
    ///
    /// Returns `false` when no valid session matched.
    pub async fn touch_refresh(&self, id: SessionId, now: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE sessions SET refreshed_at = ? WHERE session_id = ? AND expires_at > ?",
        )
        .bind(to_millis(now))
        .bind(id)
        .bind(to_millis(now))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to refresh session", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// Expire one session. Already-expired sessions keep their original expiry.
    pub async fn expire(&self, id: SessionId, now: DateTime<Utc>) -> AppResult<bool> {
        let result =
            sqlx::query("UPDATE sessions SET expires_at = ? WHERE session_id = ? AND expires_at > ?")
                .bind(to_millis(now))
                .bind(id)
                .bind(to_millis(now))
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to invalidate session", e)
                })?;
        Ok(result.rows_affected() > 0)
    }

    /// Expire every live session of a user. Returns how many were expired.
    pub async fn expire_all_for_user(
        &self,
        conn: &mut SqliteConnection,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result =
            sqlx::query("UPDATE sessions SET expires_at = ? WHERE user_id = ? AND expires_at > ?")
                .bind(to_millis(now))
                .bind(user_id)
                .bind(to_millis(now))
                .execute(conn)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to invalidate sessions", e)
                })?;
        Ok(result.rows_affected())
    }
}
