//! Invite ledger: creation, consumption and quotas.

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use sqlx::SqliteConnection;
use tracing::{info, warn};

use lod2_core::config::AuthConfig;
use lod2_core::error::{AppError, ErrorKind};
use lod2_core::types::{InviteId, UserId};
use lod2_database::DatabasePool;
use lod2_database::connection::commit;
use lod2_database::repositories::InviteRepository;
use lod2_entity::invite::{Invite, RemainingInvites};
use lod2_entity::role::{AccessLevel, AccessScope};
use lod2_entity::user::User;

use crate::credential::CredentialStore;
use crate::error::{AuthError, AuthResult};
use crate::rbac::{RoleStore, has_role};

/// Owns the `invites` table.
#[derive(Debug, Clone)]
pub struct InviteLedger {
    db: DatabasePool,
    repo: InviteRepository,
    credentials: Arc<CredentialStore>,
    roles: Arc<RoleStore>,
    /// Invites granted to every newly registered user.
    starting_invites: u32,
}

impl InviteLedger {
    pub fn new(
        db: DatabasePool,
        credentials: Arc<CredentialStore>,
        roles: Arc<RoleStore>,
        config: &AuthConfig,
    ) -> Self {
        let repo = InviteRepository::new(db.pool().clone());
        Self {
            db,
            repo,
            credentials,
            roles,
            starting_invites: config.starting_invites,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc::now().trunc_subsecs(3)
    }

    /// Creates one unconsumed invite owned by `created_by`.
    pub async fn create_invite(&self, created_by: UserId) -> AuthResult<InviteId> {
        let invite_id = InviteId::new();
        let mut conn = self.acquire().await?;
        self.repo
            .insert(&mut conn, invite_id, created_by, Self::now())
            .await?;
        Ok(invite_id)
    }

    /// Marks an invite consumed. Only the first caller wins.
    pub async fn consume_invite(&self, invite_id: InviteId, consumed_by: UserId) -> AuthResult<()> {
        let mut conn = self.acquire().await?;
        if self
            .repo
            .consume(&mut conn, invite_id, consumed_by, Self::now())
            .await?
        {
            Ok(())
        } else {
            Err(AuthError::InvalidOrExpiredInvite)
        }
    }

    /// Resolves an invite code to the user who created it.
    pub async fn validate_invite_code(&self, code: &str) -> AuthResult<UserId> {
        let invite_id: InviteId = code.parse().map_err(|_| AuthError::InvalidOrExpiredInvite)?;
        self.repo
            .find_unconsumed(invite_id)
            .await?
            .map(|invite| invite.created_by)
            .ok_or(AuthError::InvalidOrExpiredInvite)
    }

    /// Invites a user may still hand out.
    pub async fn remaining_invites(&self, user_id: UserId) -> AuthResult<RemainingInvites> {
        let roles = self.roles.get_roles(user_id).await?;
        if has_role(&roles, AccessScope::UserManagement, AccessLevel::Edit) {
            return Ok(RemainingInvites::Unlimited);
        }
        let count = self.repo.count_unconsumed_by_creator(user_id).await?;
        Ok(RemainingInvites::Count(u32::try_from(count).unwrap_or(u32::MAX)))
    }

    /// Replaces every unconsumed invite of a user with exactly `target` new ones.
    pub async fn set_remaining_invites(&self, user_id: UserId, target: u32) -> AuthResult<()> {
        let mut tx = self.db.begin().await?;
        let removed = self.repo.delete_unconsumed_by_creator(&mut tx, user_id).await?;
        self.grant_in(&mut tx, user_id, target).await?;
        commit(tx).await?;

        info!(user_id = %user_id, removed, target, "Remaining invites reset");
        Ok(())
    }

    /// Newest unconsumed invite of a user, for the "share your link" view.
    pub async fn first_unused_invite(&self, user_id: UserId) -> AuthResult<Option<InviteId>> {
        Ok(self
            .repo
            .latest_unconsumed_by_creator(user_id)
            .await?
            .map(|invite| invite.invite_id))
    }

    /// Every invite a user created, newest first.
    pub async fn list_invites(&self, user_id: UserId) -> AuthResult<Vec<Invite>> {
        Ok(self.repo.find_by_creator(user_id).await?)
    }

    /// Who invited `user`, if they registered with an invite.
    pub async fn inviter_of(&self, user: &User) -> AuthResult<Option<UserId>> {
        let Some(invite_id) = user.invite_id else {
            return Ok(None);
        };
        Ok(self
            .repo
            .find_by_id(invite_id)
            .await?
            .map(|invite| invite.created_by))
    }

    /// Self-service registration with an invite code.
    ///
    /// Creating the user, consuming the invite and granting the starting
    /// allotment commit together or not at all.
    pub async fn register_with_invite(
        &self,
        code: &str,
        username: &str,
        password: &str,
    ) -> AuthResult<User> {
        self.validate_invite_code(code).await?;
        let invite_id: InviteId = code.parse().map_err(|_| AuthError::InvalidOrExpiredInvite)?;
        let password_hash = self.credentials.prepare(username, password)?;

        let mut tx = self.db.begin().await?;
        let user = self.spend_in(&mut tx, invite_id, username, password_hash).await?;
        commit(tx).await?;

        info!(user_id = %user.user_id, invite_id = %invite_id, "User registered with invite");
        Ok(user)
    }

    /// Administrative creation of a user that spends one of the inviter's
    /// invites. Unlimited inviters mint the invite on the spot.
    ///
    /// The invite is picked and consumed inside the transaction, so
    /// concurrent calls by one inviter each spend a different invite.
    pub async fn invite_user(
        &self,
        inviter: UserId,
        username: &str,
        password: &str,
    ) -> AuthResult<User> {
        let remaining = self.remaining_invites(inviter).await?;
        if !remaining.has_any() {
            warn!(inviter = %inviter, "Invite attempt with no invites remaining");
            return Err(AuthError::NoInvitesRemaining);
        }
        let password_hash = self.credentials.prepare(username, password)?;

        let mut tx = self.db.begin().await?;
        let user = match remaining {
            RemainingInvites::Unlimited => {
                let invite_id = InviteId::new();
                self.repo
                    .insert(&mut tx, invite_id, inviter, Self::now())
                    .await?;
                self.spend_in(&mut tx, invite_id, username, password_hash)
                    .await?
            }
            RemainingInvites::Count(_) => {
                self.spend_latest_in(&mut tx, inviter, username, password_hash)
                    .await?
            }
        };
        commit(tx).await?;

        info!(inviter = %inviter, user_id = %user.user_id, "User invited");
        Ok(user)
    }

    /// Creates the user, consumes the invite and grants starting invites.
    ///
    /// The user row goes first so the transaction takes the write lock
    /// before anything else.
    async fn spend_in(
        &self,
        conn: &mut SqliteConnection,
        invite_id: InviteId,
        username: &str,
        password_hash: String,
    ) -> AuthResult<User> {
        let user = self
            .credentials
            .insert_user(&mut *conn, username, password_hash, Some(invite_id))
            .await?;

        if !self
            .repo
            .consume(&mut *conn, invite_id, user.user_id, Self::now())
            .await?
        {
            return Err(AuthError::InvalidOrExpiredInvite);
        }

        self.grant_in(&mut *conn, user.user_id, self.starting_invites)
            .await?;
        Ok(user)
    }

    /// Creates the user, then consumes the inviter's newest unconsumed
    /// invite for it. `NoInvitesRemaining` when another caller spent the
    /// last one first.
    async fn spend_latest_in(
        &self,
        conn: &mut SqliteConnection,
        inviter: UserId,
        username: &str,
        password_hash: String,
    ) -> AuthResult<User> {
        let mut user = self
            .credentials
            .insert_user(&mut *conn, username, password_hash, None)
            .await?;

        let invite_id = self
            .repo
            .consume_latest_by_creator(&mut *conn, inviter, user.user_id, Self::now())
            .await?
            .ok_or(AuthError::NoInvitesRemaining)?;
        self.credentials
            .attach_invite(&mut *conn, &mut user, invite_id)
            .await?;

        self.grant_in(&mut *conn, user.user_id, self.starting_invites)
            .await?;
        Ok(user)
    }

    async fn grant_in(
        &self,
        conn: &mut SqliteConnection,
        user_id: UserId,
        count: u32,
    ) -> AuthResult<()> {
        let now = Self::now();
        for _ in 0..count {
            self.repo
                .insert(&mut *conn, InviteId::new(), user_id, now)
                .await?;
        }
        Ok(())
    }

    async fn acquire(&self) -> AuthResult<sqlx::pool::PoolConnection<sqlx::Sqlite>> {
        self.db.pool().acquire().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to acquire connection", e).into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lod2_entity::role::Role;

    use crate::password::{PasswordHasher, PasswordValidator};

    async fn setup() -> (InviteLedger, Arc<CredentialStore>, Arc<RoleStore>) {
        let db = DatabasePool::connect_in_memory().await.unwrap();
        let config = AuthConfig {
            argon2_memory_kib: 8,
            argon2_iterations: 1,
            starting_invites: 2,
            ..AuthConfig::default()
        };
        let roles = Arc::new(RoleStore::new(db.clone()));
        let credentials = Arc::new(CredentialStore::new(
            db.clone(),
            roles.clone(),
            PasswordHasher::new(&config).unwrap(),
            PasswordValidator::new(&config),
        ));
        let ledger = InviteLedger::new(db, credentials.clone(), roles.clone(), &config);
        (ledger, credentials, roles)
    }

    #[tokio::test]
    async fn test_register_consumes_invite_and_grants_allotment() {
        let (ledger, credentials, _) = setup().await;
        let inviter = credentials.create_user("inviter", "pw", &[]).await.unwrap();
        let code = ledger.create_invite(inviter.user_id).await.unwrap();

        let user = ledger
            .register_with_invite(&code.to_string(), "newbie", "pw")
            .await
            .unwrap();

        assert_eq!(user.invite_id, Some(code));
        assert_eq!(
            ledger.remaining_invites(user.user_id).await.unwrap(),
            RemainingInvites::Count(2)
        );
        assert_eq!(
            ledger.remaining_invites(inviter.user_id).await.unwrap(),
            RemainingInvites::Count(0)
        );
        assert_eq!(ledger.inviter_of(&user).await.unwrap(), Some(inviter.user_id));
    }

    #[tokio::test]
    async fn test_invite_code_is_single_use() {
        let (ledger, credentials, _) = setup().await;
        let inviter = credentials.create_user("inviter", "pw", &[]).await.unwrap();
        let code = ledger.create_invite(inviter.user_id).await.unwrap().to_string();

        ledger.register_with_invite(&code, "first", "pw").await.unwrap();
        let err = ledger
            .register_with_invite(&code, "second", "pw")
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::InvalidOrExpiredInvite));
        assert!(credentials.find_by_username("second").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_garbage_code_is_rejected() {
        let (ledger, _, _) = setup().await;
        for code in [
            "",
            "nonsense",
            "user_0190f5c8a0a07cc3b1a4f0f0f0f0f0f0",
            "inv_0190f5c8a0a07cc3b1a4f0f0f0f0f0f0",
        ] {
            let err = ledger.validate_invite_code(code).await.unwrap_err();
            assert!(matches!(err, AuthError::InvalidOrExpiredInvite), "{code}");
        }
    }

    #[tokio::test]
    async fn test_failed_registration_keeps_invite() {
        let (ledger, credentials, _) = setup().await;
        let inviter = credentials.create_user("inviter", "pw", &[]).await.unwrap();
        let code = ledger.create_invite(inviter.user_id).await.unwrap().to_string();

        let err = ledger
            .register_with_invite(&code, "inviter", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::DuplicateUsername(_)));
        assert_eq!(ledger.validate_invite_code(&code).await.unwrap(), inviter.user_id);
    }

    #[tokio::test]
    async fn test_invite_user_requires_balance() {
        let (ledger, credentials, _) = setup().await;
        let inviter = credentials.create_user("inviter", "pw", &[]).await.unwrap();

        let err = ledger
            .invite_user(inviter.user_id, "friend", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NoInvitesRemaining));

        ledger.set_remaining_invites(inviter.user_id, 1).await.unwrap();
        let friend = ledger
            .invite_user(inviter.user_id, "friend", "pw")
            .await
            .unwrap();
        assert!(friend.invite_id.is_some());
        assert_eq!(
            ledger.remaining_invites(inviter.user_id).await.unwrap(),
            RemainingInvites::Count(0)
        );
    }

    #[tokio::test]
    async fn test_racing_for_the_last_invite() {
        let (ledger, credentials, _) = setup().await;
        let inviter = credentials.create_user("inviter", "pw", &[]).await.unwrap();
        ledger.set_remaining_invites(inviter.user_id, 1).await.unwrap();

        let (a, b) = futures::join!(
            ledger.invite_user(inviter.user_id, "a", "pw"),
            ledger.invite_user(inviter.user_id, "b", "pw"),
        );
        let (winner, err) = match (a, b) {
            (Ok(user), Err(e)) | (Err(e), Ok(user)) => (user, e),
            (a, b) => panic!("expected one invite to succeed, got {a:?} and {b:?}"),
        };

        assert!(matches!(err, AuthError::NoInvitesRemaining));
        assert_eq!(ledger.inviter_of(&winner).await.unwrap(), Some(inviter.user_id));
        let loser = if winner.username == "a" { "b" } else { "a" };
        assert!(credentials.find_by_username(loser).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_user_managers_have_unlimited_invites() {
        let (ledger, credentials, _) = setup().await;
        let admin = credentials
            .create_user(
                "admin",
                "pw",
                &[Role::new(AccessScope::UserManagement, AccessLevel::Edit)],
            )
            .await
            .unwrap();

        assert_eq!(
            ledger.remaining_invites(admin.user_id).await.unwrap(),
            RemainingInvites::Unlimited
        );
        for name in ["a", "b", "c"] {
            ledger.invite_user(admin.user_id, name, "pw").await.unwrap();
        }
        assert_eq!(ledger.list_invites(admin.user_id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_set_remaining_invites_replaces_unconsumed() {
        let (ledger, credentials, _) = setup().await;
        let user = credentials.create_user("someone", "pw", &[]).await.unwrap();

        ledger.set_remaining_invites(user.user_id, 4).await.unwrap();
        ledger.set_remaining_invites(user.user_id, 1).await.unwrap();

        assert_eq!(
            ledger.remaining_invites(user.user_id).await.unwrap(),
            RemainingInvites::Count(1)
        );
        let newest = ledger.first_unused_invite(user.user_id).await.unwrap();
        assert!(newest.is_some());
    }
}
