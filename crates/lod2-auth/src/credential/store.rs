//! Credential storage: user rows and password verification.

use std::sync::Arc;

use chrono::{SubsecRound, Utc};
use sqlx::SqliteConnection;
use tracing::{info, warn};

use lod2_core::error::ErrorKind;
use lod2_core::types::{InviteId, UserId};
use lod2_database::DatabasePool;
use lod2_database::connection::commit;
use lod2_database::repositories::UserRepository;
use lod2_entity::role::Role;
use lod2_entity::user::{CreateUser, User, UserSummary};

use crate::error::{AuthError, AuthResult};
use crate::password::validator::TOMBSTONE_PREFIX;
use crate::password::{PasswordHasher, PasswordValidator};
use crate::rbac::RoleStore;
use crate::session::SessionStore;

/// Owns the `users` table.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    db: DatabasePool,
    repo: UserRepository,
    roles: Arc<RoleStore>,
    hasher: PasswordHasher,
    validator: PasswordValidator,
}

impl CredentialStore {
    pub fn new(
        db: DatabasePool,
        roles: Arc<RoleStore>,
        hasher: PasswordHasher,
        validator: PasswordValidator,
    ) -> Self {
        let repo = UserRepository::new(db.pool().clone());
        Self {
            db,
            repo,
            roles,
            hasher,
            validator,
        }
    }

    /// Creates a user and grants `initial_roles` in the same transaction.
    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        initial_roles: &[Role],
    ) -> AuthResult<User> {
        let password_hash = self.prepare(username, password)?;

        let mut tx = self.db.begin().await?;
        let user = self
            .insert_user(&mut tx, username, password_hash, None)
            .await?;
        self.roles.apply(&mut tx, user.user_id, initial_roles).await?;
        commit(tx).await?;

        info!(user_id = %user.user_id, username = %user.username, "User created");
        Ok(user)
    }

    /// Validates new credentials and returns the password hash to store.
    pub(crate) fn prepare(&self, username: &str, password: &str) -> AuthResult<String> {
        self.validator.validate_username(username)?;
        self.validator.validate_password(password)?;
        Ok(self.hasher.hash_password(password)?)
    }

    /// Inserts a user row inside a caller's transaction.
    pub(crate) async fn insert_user(
        &self,
        conn: &mut SqliteConnection,
        username: &str,
        password_hash: String,
        invite_id: Option<InviteId>,
    ) -> AuthResult<User> {
        let data = CreateUser {
            user_id: UserId::new(),
            username: username.to_string(),
            password_hash,
            invite_id,
        };
        self.repo
            .insert(conn, &data, Utc::now().trunc_subsecs(3))
            .await
            .map_err(|e| match e.kind {
                ErrorKind::Conflict => AuthError::DuplicateUsername(username.to_string()),
                _ => AuthError::Internal(e),
            })
    }

    /// Links a freshly inserted user to the invite it spent.
    pub(crate) async fn attach_invite(
        &self,
        conn: &mut SqliteConnection,
        user: &mut User,
        invite_id: InviteId,
    ) -> AuthResult<()> {
        self.repo.set_invite(conn, user.user_id, invite_id).await?;
        user.invite_id = Some(invite_id);
        Ok(())
    }

    /// Checks a username/password pair and returns the user.
    ///
    /// Unknown and deleted users yield `InvalidUsername`; a wrong password
    /// yields `InvalidPassword`.
    pub async fn verify_login(&self, username: &str, password: &str) -> AuthResult<User> {
        let Some(user) = self.repo.find_by_username(username).await? else {
            warn!(username = %username, "Login attempt for unknown user");
            return Err(AuthError::InvalidUsername);
        };

        if !user.can_login() {
            warn!(user_id = %user.user_id, "Login attempt for deleted user");
            return Err(AuthError::InvalidUsername);
        }

        if !self.hasher.verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.user_id, "Login attempt with wrong password");
            return Err(AuthError::InvalidPassword);
        }

        Ok(user)
    }

    /// Replaces a user's password after verifying the current one.
    ///
    /// Existing sessions stay valid.
    pub async fn change_password(
        &self,
        user_id: UserId,
        current_password: &str,
        new_password: &str,
        new_password_confirm: &str,
    ) -> AuthResult<()> {
        let user = self.get_active_user(user_id).await?;

        if !self
            .hasher
            .verify_password(current_password, &user.password_hash)?
        {
            warn!(user_id = %user_id, "Password change with wrong current password");
            return Err(AuthError::InvalidCurrentPassword);
        }
        if new_password != new_password_confirm {
            return Err(AuthError::PasswordMismatch);
        }
        self.validator.validate_password(new_password)?;

        let hash = self.hasher.hash_password(new_password)?;
        self.repo.update_password(user_id, &hash).await?;

        info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    /// Looks up a user by ID, deleted or not.
    pub async fn get_user(&self, user_id: UserId) -> AuthResult<User> {
        self.repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Looks up a user that has not been deleted.
    pub async fn get_active_user(&self, user_id: UserId) -> AuthResult<User> {
        let user = self.get_user(user_id).await?;
        if user.deleted {
            return Err(AuthError::UserNotFound);
        }
        Ok(user)
    }

    /// Looks up a non-deleted user by username.
    pub async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        Ok(self.repo.find_by_username(username).await?)
    }

    /// The user who registered with `invite_id`, if any.
    pub async fn find_by_invite(&self, invite_id: InviteId) -> AuthResult<Option<User>> {
        Ok(self.repo.find_by_invite(invite_id).await?)
    }

    /// Administrative listing of live accounts.
    pub async fn list_users(&self) -> AuthResult<Vec<UserSummary>> {
        Ok(self.repo.list_summaries(Utc::now()).await?)
    }

    /// Soft-deletes a user: tombstones the username, sets the deleted flag,
    /// expires every session and drops every role grant.
    pub async fn delete_user(&self, user_id: UserId, sessions: &SessionStore) -> AuthResult<()> {
        let tombstone = format!("{TOMBSTONE_PREFIX}{user_id}");

        let mut tx = self.db.begin().await?;
        self.repo
            .soft_delete(&mut tx, user_id, &tombstone)
            .await
            .map_err(|e| match e.kind {
                ErrorKind::NotFound => AuthError::UserNotFound,
                _ => AuthError::Internal(e),
            })?;
        sessions.invalidate_all_in(&mut tx, user_id).await?;
        self.roles.revoke_all(&mut tx, user_id).await?;
        commit(tx).await?;

        info!(user_id = %user_id, "User deleted");
        Ok(())
    }
}
