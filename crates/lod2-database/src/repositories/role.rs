//! Role grant repository implementation.

use sqlx::{SqliteConnection, SqlitePool};

use lod2_core::error::{AppError, ErrorKind};
use lod2_core::result::AppResult;
use lod2_core::types::UserId;
use lod2_entity::role::{AccessLevel, AccessScope, Role};

/// Repository for `roles` rows. Only levels above `None` are stored.
#[derive(Debug, Clone)]
pub struct RoleRepository {
    pool: SqlitePool,
}

impl RoleRepository {
    /// Create a new role repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Return the stored grants of a user.
    pub async fn find_by_user(&self, user_id: UserId) -> AppResult<Vec<Role>> {
        let rows: Vec<(AccessScope, AccessLevel)> =
            sqlx::query_as("SELECT scope, level FROM roles WHERE user_id = ? ORDER BY scope")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load roles", e))?;

        Ok(rows
            .into_iter()
            .map(|(scope, level)| Role::new(scope, level))
            .collect())
    }

    /// Insert or replace the level a user holds in one scope.
    pub async fn upsert(
        &self,
        conn: &mut SqliteConnection,
        user_id: UserId,
        role: Role,
    ) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO roles (user_id, scope, level) VALUES (?, ?, ?) \
             ON CONFLICT (user_id, scope) DO UPDATE SET level = excluded.level",
        )
        .bind(user_id)
        .bind(role.scope)
        .bind(role.level)
        .execute(conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to grant role", e))?;
        Ok(())
    }

    /// Remove the grant row for one scope.
    pub async fn delete(
        &self,
        conn: &mut SqliteConnection,
        user_id: UserId,
        scope: AccessScope,
    ) -> AppResult<()> {
        sqlx::query("DELETE FROM roles WHERE user_id = ? AND scope = ?")
            .bind(user_id)
            .bind(scope)
            .execute(conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to revoke role", e))?;
        Ok(())
    }

    /// Remove every grant a user holds.
    pub async fn delete_all_for_user(
        &self,
        conn: &mut SqliteConnection,
        user_id: UserId,
    ) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM roles WHERE user_id = ?")
            .bind(user_id)
            .execute(conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to revoke roles", e))?;
        Ok(result.rows_affected())
    }
}
