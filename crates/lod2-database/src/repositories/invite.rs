//! Invite repository implementation.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};

use lod2_core::error::{AppError, ErrorKind};
use lod2_core::result::AppResult;
use lod2_core::types::{InviteId, UserId};
use lod2_entity::invite::Invite;

use crate::timestamp::{from_millis, to_millis};

#[derive(FromRow)]
struct InviteRow {
    invite_id: InviteId,
    created_by_user_id: UserId,
    consumed_by_user_id: Option<UserId>,
    created_at: i64,
    consumed_at: Option<i64>,
}

impl From<InviteRow> for Invite {
    fn from(row: InviteRow) -> Self {
        Self {
            invite_id: row.invite_id,
            created_by: row.created_by_user_id,
            consumed_by: row.consumed_by_user_id,
            created_at: from_millis(row.created_at),
            consumed_at: row.consumed_at.map(from_millis),
        }
    }
}

const INVITE_COLUMNS: &str =
    "invite_id, created_by_user_id, consumed_by_user_id, created_at, consumed_at";

/// Repository for `invites` rows.
#[derive(Debug, Clone)]
pub struct InviteRepository {
    pool: SqlitePool,
}

impl InviteRepository {
    /// Create a new invite repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a fresh, unconsumed invite.
    pub async fn insert(
        &self,
        conn: &mut SqliteConnection,
        invite_id: InviteId,
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO invites (invite_id, created_by_user_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(invite_id)
        .bind(created_by)
        .bind(to_millis(now))
        .execute(conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create invite", e))?;
        Ok(())
    }

    /// Find an invite by ID regardless of state.
    pub async fn find_by_id(&self, invite_id: InviteId) -> AppResult<Option<Invite>> {
        sqlx::query_as::<_, InviteRow>(&format!(
            "SELECT {INVITE_COLUMNS} FROM invites WHERE invite_id = ?"
        ))
        .bind(invite_id)
        .fetch_optional(&self.pool)
        .await
        .map(|row| row.map(Invite::from))
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find invite", e))
    }

    /// Find an invite that has not been consumed yet.
    pub async fn find_unconsumed(&self, invite_id: InviteId) -> AppResult<Option<Invite>> {
        sqlx::query_as::<_, InviteRow>(&format!(
            "SELECT {INVITE_COLUMNS} FROM invites \
             WHERE invite_id = ? AND consumed_by_user_id IS NULL"
        ))
        .bind(invite_id)
        .fetch_optional(&self.pool)
        .await
        .map(|row| row.map(Invite::from))
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find invite", e))
    }

    /// Newest unconsumed invite created by a user.
    pub async fn latest_unconsumed_by_creator(
        &self,
        created_by: UserId,
    ) -> AppResult<Option<Invite>> {
        sqlx::query_as::<_, InviteRow>(&format!(
            "SELECT {INVITE_COLUMNS} FROM invites \
             WHERE created_by_user_id = ? AND consumed_by_user_id IS NULL \
             ORDER BY created_at DESC, invite_id DESC LIMIT 1"
        ))
        .bind(created_by)
        .fetch_optional(&self.pool)
        .await
        .map(|row| row.map(Invite::from))
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find unused invite", e))
    }

    /// Every invite created by a user, newest first.
    pub async fn find_by_creator(&self, created_by: UserId) -> AppResult<Vec<Invite>> {
        sqlx::query_as::<_, InviteRow>(&format!(
            "SELECT {INVITE_COLUMNS} FROM invites WHERE created_by_user_id = ? \
             ORDER BY created_at DESC, invite_id DESC"
        ))
        .bind(created_by)
        .fetch_all(&self.pool)
        .await
        .map(|rows| rows.into_iter().map(Invite::from).collect())
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list invites", e))
    }

    /// Count the unconsumed invites created by a user.
    pub async fn count_unconsumed_by_creator(&self, created_by: UserId) -> AppResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM invites \
             WHERE created_by_user_id = ? AND consumed_by_user_id IS NULL",
        )
        .bind(created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count invites", e))
    }

    /// Mark an invite consumed if nobody consumed it first.
    ///
    /// Returns `false` when the invite does not exist or is already spent.
    pub async fn consume(
        &self,
        conn: &mut SqliteConnection,
        invite_id: InviteId,
        consumed_by: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE invites SET consumed_by_user_id = ?, consumed_at = ? \
             WHERE invite_id = ? AND consumed_by_user_id IS NULL",
        )
        .bind(consumed_by)
        .bind(to_millis(now))
        .bind(invite_id)
        .execute(conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to consume invite", e))?;
        Ok(result.rows_affected() == 1)
    }

    /// Consume the newest unconsumed invite of a creator in one statement.
    ///
    /// Returns the spent invite, or `None` when the creator has none left.
    pub async fn consume_latest_by_creator(
        &self,
        conn: &mut SqliteConnection,
        created_by: UserId,
        consumed_by: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<Option<InviteId>> {
        sqlx::query_scalar(
            "UPDATE invites SET consumed_by_user_id = ?, consumed_at = ? \
             WHERE invite_id = ( \
                 SELECT invite_id FROM invites \
                 WHERE created_by_user_id = ? AND consumed_by_user_id IS NULL \
                 ORDER BY created_at DESC, invite_id DESC LIMIT 1 \
             ) AND consumed_by_user_id IS NULL \
             RETURNING invite_id",
        )
        .bind(consumed_by)
        .bind(to_millis(now))
        .bind(created_by)
        .fetch_optional(conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to consume invite", e))
    }

    /// Delete every unconsumed invite created by a user.
    pub async fn delete_unconsumed_by_creator(
        &self,
        conn: &mut SqliteConnection,
        created_by: UserId,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM invites WHERE created_by_user_id = ? AND consumed_by_user_id IS NULL",
        )
        .bind(created_by)
        .execute(conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete invites", e))?;
        Ok(result.rows_affected())
    }
}
