//! Persistent role grants.

use sqlx::SqliteConnection;
use tracing::info;

use lod2_core::types::UserId;
use lod2_database::DatabasePool;
use lod2_database::connection::commit;
use lod2_database::repositories::RoleRepository;
use lod2_entity::role::{AccessLevel, Role};

use super::enforcer::complete;
use crate::error::AuthResult;

/// Owns the `roles` table.
#[derive(Debug, Clone)]
pub struct RoleStore {
    db: DatabasePool,
    repo: RoleRepository,
}

impl RoleStore {
    pub fn new(db: DatabasePool) -> Self {
        let repo = RoleRepository::new(db.pool().clone());
        Self { db, repo }
    }

    /// Applies a full role set atomically. `None` removes the grant row.
    pub async fn set_roles(&self, user_id: UserId, roles: &[Role]) -> AuthResult<()> {
        let mut tx = self.db.begin().await?;
        self.apply(&mut tx, user_id, roles).await?;
        commit(tx).await?;

        info!(user_id = %user_id, roles = roles.len(), "Roles updated");
        Ok(())
    }

    /// Writes each grant on an existing connection, for use inside a
    /// caller's transaction.
    pub async fn apply(
        &self,
        conn: &mut SqliteConnection,
        user_id: UserId,
        roles: &[Role],
    ) -> AuthResult<()> {
        for role in roles {
            if role.level == AccessLevel::None {
                self.repo.delete(&mut *conn, user_id, role.scope).await?;
            } else {
                self.repo.upsert(&mut *conn, user_id, *role).await?;
            }
        }
        Ok(())
    }

    /// One entry per known scope, missing scopes reported as `None`.
    pub async fn get_roles(&self, user_id: UserId) -> AuthResult<Vec<Role>> {
        let stored = self.repo.find_by_user(user_id).await?;
        Ok(complete(&stored))
    }

    /// Drops every grant of a user inside a caller's transaction.
    pub async fn revoke_all(&self, conn: &mut SqliteConnection, user_id: UserId) -> AuthResult<()> {
        self.repo.delete_all_for_user(conn, user_id).await?;
        Ok(())
    }
}
