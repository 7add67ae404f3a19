//! Self-healing administrator account, applied on every startup.

use tracing::{info, warn};

use lod2_core::config::BootstrapConfig;
use lod2_entity::role::Role;
use lod2_entity::user::User;

use crate::credential::CredentialStore;
use crate::error::AuthResult;
use crate::invite::InviteLedger;
use crate::rbac::RoleStore;

/// Password shipped in the default configuration.
const DEFAULT_ADMIN_PASSWORD: &str = "admin";

/// Makes sure the bootstrap account exists, holds Edit on every scope and
/// has invites to hand out.
///
/// An existing account keeps its password.
pub async fn ensure_admin(
    credentials: &CredentialStore,
    roles: &RoleStore,
    invites: &InviteLedger,
    config: &BootstrapConfig,
    starting_invites: u32,
) -> AuthResult<User> {
    let admin = match credentials.find_by_username(&config.admin_username).await? {
        Some(user) => user,
        None => {
            let user = credentials
                .create_user(&config.admin_username, &config.admin_password, &[])
                .await?;
            info!(user_id = %user.user_id, username = %user.username, "Bootstrap admin created");
            user
        }
    };

    if config.admin_password == DEFAULT_ADMIN_PASSWORD {
        warn!(
            username = %config.admin_username,
            "Bootstrap admin uses the default password; set LOD2__BOOTSTRAP__ADMIN_PASSWORD"
        );
    }

    roles.set_roles(admin.user_id, &Role::all_edit()).await?;

    let unconsumed = invites
        .list_invites(admin.user_id)
        .await?
        .iter()
        .filter(|invite| !invite.is_consumed())
        .count();
    if unconsumed == 0 {
        invites
            .set_remaining_invites(admin.user_id, starting_invites)
            .await?;
    }

    Ok(admin)
}

/// Whether `user` is the account managed by [`ensure_admin`].
pub fn is_bootstrap_admin(user: &User, config: &BootstrapConfig) -> bool {
    !user.deleted && user.username == config.admin_username
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use lod2_core::config::AuthConfig;
    use lod2_database::DatabasePool;
    use lod2_entity::invite::RemainingInvites;
    use lod2_entity::role::{AccessLevel, AccessScope};

    use crate::password::{PasswordHasher, PasswordValidator};
    use crate::rbac::has_role;

    struct Fixture {
        credentials: Arc<CredentialStore>,
        roles: Arc<RoleStore>,
        invites: InviteLedger,
    }

    async fn fixture() -> Fixture {
        let db = DatabasePool::connect_in_memory().await.unwrap();
        let config = AuthConfig {
            argon2_memory_kib: 8,
            argon2_iterations: 1,
            ..AuthConfig::default()
        };
        let roles = Arc::new(RoleStore::new(db.clone()));
        let credentials = Arc::new(CredentialStore::new(
            db.clone(),
            roles.clone(),
            PasswordHasher::new(&config).unwrap(),
            PasswordValidator::new(&config),
        ));
        let invites = InviteLedger::new(db, credentials.clone(), roles.clone(), &config);
        Fixture {
            credentials,
            roles,
            invites,
        }
    }

    #[tokio::test]
    async fn test_bootstrap_is_idempotent_and_heals_roles() {
        let f = fixture().await;
        let config = BootstrapConfig {
            admin_username: "root".into(),
            admin_password: "hunter22".into(),
        };

        let admin = ensure_admin(&f.credentials, &f.roles, &f.invites, &config, 5)
            .await
            .unwrap();
        f.roles
            .set_roles(
                admin.user_id,
                &[Role::new(AccessScope::UserManagement, AccessLevel::None)],
            )
            .await
            .unwrap();

        let again = ensure_admin(&f.credentials, &f.roles, &f.invites, &config, 5)
            .await
            .unwrap();
        assert_eq!(admin.user_id, again.user_id);

        let roles = f.roles.get_roles(admin.user_id).await.unwrap();
        for scope in AccessScope::ALL {
            assert!(has_role(&roles, scope, AccessLevel::Edit));
        }
        assert_eq!(
            f.invites.remaining_invites(admin.user_id).await.unwrap(),
            RemainingInvites::Unlimited
        );
        assert_eq!(f.invites.list_invites(admin.user_id).await.unwrap().len(), 5);
        assert!(f.credentials.verify_login("root", "hunter22").await.is_ok());
        assert!(is_bootstrap_admin(&again, &config));
    }
}
