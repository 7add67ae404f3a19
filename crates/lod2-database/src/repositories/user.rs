//! User repository implementation.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};

use lod2_core::error::{AppError, ErrorKind};
use lod2_core::result::AppResult;
use lod2_core::types::{InviteId, UserId};
use lod2_entity::user::{CreateUser, User, UserSummary};

use crate::timestamp::{from_millis, to_millis};

#[derive(FromRow)]
struct UserRow {
    user_id: UserId,
    username: String,
    password_hash: String,
    created_at: i64,
    deleted: bool,
    invite_id: Option<InviteId>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            user_id: row.user_id,
            username: row.username,
            password_hash: row.password_hash,
            created_at: from_millis(row.created_at),
            deleted: row.deleted,
            invite_id: row.invite_id,
        }
    }
}

#[derive(FromRow)]
struct SummaryRow {
    user_id: UserId,
    username: String,
    created_at: i64,
    last_login: Option<i64>,
    active_sessions: i64,
}

const USER_COLUMNS: &str = "user_id, username, password_hash, created_at, deleted, invite_id";

/// Repository for user rows.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new user.
    ///
    /// A taken username surfaces as [`ErrorKind::Conflict`].
    pub async fn insert(
        &self,
        conn: &mut SqliteConnection,
        data: &CreateUser,
        now: DateTime<Utc>,
    ) -> AppResult<User> {
        sqlx::query(
            "INSERT INTO users (user_id, username, password_hash, created_at, deleted, invite_id) \
             VALUES (?, ?, ?, ?, 0, ?)",
        )
        .bind(data.user_id)
        .bind(&data.username)
        .bind(&data.password_hash)
        .bind(to_millis(now))
        .bind(data.invite_id)
        .execute(conn)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::conflict(format!("Username '{}' already exists", data.username))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create user", e),
        })?;

        Ok(User {
            user_id: data.user_id,
            username: data.username.clone(),
            password_hash: data.password_hash.clone(),
            created_at: from_millis(to_millis(now)),
            deleted: false,
            invite_id: data.invite_id,
        })
    }

    /// Find a user by primary key, including deleted users.
    pub async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map(|row| row.map(User::from))
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user by id", e))
    }

    /// Find a non-deleted user by exact username.
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ? AND deleted = 0"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map(|row| row.map(User::from))
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find user by username", e)
        })
    }

    /// Find the user who registered with the given invite.
    pub async fn find_by_invite(&self, invite_id: InviteId) -> AppResult<Option<User>> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE invite_id = ?"
        ))
        .bind(invite_id)
        .fetch_optional(&self.pool)
        .await
        .map(|row| row.map(User::from))
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user by invite", e))
    }

    /// List non-deleted users with their last login and live session count.
    pub async fn list_summaries(&self, now: DateTime<Utc>) -> AppResult<Vec<UserSummary>> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            "SELECT u.user_id, u.username, u.created_at, \
                    MAX(s.issued_at) AS last_login, \
                    COALESCE(SUM(CASE WHEN s.expires_at > ? THEN 1 ELSE 0 END), 0) AS active_sessions \
             FROM users u \
             LEFT JOIN sessions s ON s.user_id = u.user_id \
             WHERE u.deleted = 0 \
             GROUP BY u.user_id, u.username, u.created_at \
             ORDER BY u.created_at ASC",
        )
        .bind(to_millis(now))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list users", e))?;

        Ok(rows
            .into_iter()
            .map(|row| UserSummary {
                user_id: row.user_id,
                username: row.username,
                created_at: from_millis(row.created_at),
                last_login: row.last_login.map(from_millis),
                active_sessions: row.active_sessions,
            })
            .collect())
    }

    /// Overwrite a user's password hash.
    pub async fn update_password(&self, id: UserId, password_hash: &str) -> AppResult<()> {
        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE user_id = ? AND deleted = 0")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update password", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("User {id} not found")));
        }
        Ok(())
    }

    /// Record the invite a user registered with.
    pub async fn set_invite(
        &self,
        conn: &mut SqliteConnection,
        id: UserId,
        invite_id: InviteId,
    ) -> AppResult<()> {
        sqlx::query("UPDATE users SET invite_id = ? WHERE user_id = ?")
            .bind(invite_id)
            .bind(id)
            .execute(conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to link invite", e))?;
        Ok(())
    }

    /// Mark a user deleted and replace their username with `tombstone`.
    pub async fn soft_delete(
        &self,
        conn: &mut SqliteConnection,
        id: UserId,
        tombstone: &str,
    ) -> AppResult<()> {
        let result =
            sqlx::query("UPDATE users SET deleted = 1, username = ? WHERE user_id = ? AND deleted = 0")
                .bind(tombstone)
                .bind(id)
                .execute(conn)
                .await
                .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete user", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("User {id} not found")));
        }
        Ok(())
    }
}
