//! Invite quotas and invite-gated registration.

mod helpers;

use helpers::TestApp;
use lod2_auth::AuthError;
use lod2_entity::invite::RemainingInvites;
use lod2_entity::role::{AccessLevel, AccessScope, Role};

#[tokio::test]
async fn test_bootstrap_admin_is_unlimited_and_holds_invites() {
    let app = TestApp::new().await;

    let remaining = app.state.invites.remaining_invites(app.admin.user_id).await.unwrap();
    assert_eq!(remaining, RemainingInvites::Unlimited);

    let invites = app.state.invites.list_invites(app.admin.user_id).await.unwrap();
    assert_eq!(invites.len(), 2);
    assert!(invites.iter().all(|i| !i.is_consumed()));
}

#[tokio::test]
async fn test_concurrent_registration_consumes_once() {
    let app = TestApp::new().await;
    let code = app
        .state
        .invites
        .first_unused_invite(app.admin.user_id)
        .await
        .unwrap()
        .unwrap()
        .to_string();

    let (bob, carol) = futures::join!(
        app.state.invites.register_with_invite(&code, "bob", "bob password"),
        app.state.invites.register_with_invite(&code, "carol", "carol password"),
    );

    let (winner, loser) = match (bob, carol) {
        (Ok(user), Err(e)) => (user, ("carol", e)),
        (Err(e), Ok(user)) => (user, ("bob", e)),
        (a, b) => panic!("expected exactly one registration, got {a:?} and {b:?}"),
    };

    assert!(matches!(loser.1, AuthError::InvalidOrExpiredInvite));
    assert!(
        app.state
            .credentials
            .find_by_username(loser.0)
            .await
            .unwrap()
            .is_none()
    );
    assert_eq!(
        app.state.invites.inviter_of(&winner).await.unwrap(),
        Some(app.admin.user_id)
    );
    assert!(app.state.invites.validate_invite_code(&code).await.is_err());
}

#[tokio::test]
async fn test_invited_user_receives_starting_invites() {
    let app = TestApp::new().await;
    let code = app
        .state
        .invites
        .first_unused_invite(app.admin.user_id)
        .await
        .unwrap()
        .unwrap();

    let bob = app
        .state
        .invites
        .register_with_invite(&code.to_string(), "bob", "bob password")
        .await
        .unwrap();

    assert_eq!(bob.invite_id, Some(code));
    assert_eq!(
        app.state.invites.remaining_invites(bob.user_id).await.unwrap(),
        RemainingInvites::Count(2)
    );
    assert!(app.state.access.login("bob", "bob password").await.is_ok());
}

#[tokio::test]
async fn test_quota_exhaustion() {
    let app = TestApp::new().await;
    let bob = app.create_user("bob", "bob password", &[]).await;
    app.state.invites.set_remaining_invites(bob.user_id, 1).await.unwrap();

    let carol = app
        .state
        .invites
        .invite_user(bob.user_id, "carol", "carol password")
        .await
        .unwrap();
    assert_eq!(
        app.state.invites.inviter_of(&carol).await.unwrap(),
        Some(bob.user_id)
    );
    assert_eq!(
        app.state.invites.remaining_invites(bob.user_id).await.unwrap(),
        RemainingInvites::Count(0)
    );

    let err = app
        .state
        .invites
        .invite_user(bob.user_id, "dave", "dave password")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::NoInvitesRemaining));
    assert!(
        app.state
            .credentials
            .find_by_username("dave")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_manager_invites_without_spending_quota() {
    let app = TestApp::new().await;
    let manager = app
        .create_user(
            "manager",
            "manager password",
            &[Role::new(AccessScope::UserManagement, AccessLevel::Edit)],
        )
        .await;

    for name in ["u1", "u2", "u3"] {
        app.state
            .invites
            .invite_user(manager.user_id, name, "some password")
            .await
            .unwrap();
    }

    assert_eq!(
        app.state.invites.remaining_invites(manager.user_id).await.unwrap(),
        RemainingInvites::Unlimited
    );
    assert_eq!(
        app.state.invites.list_invites(manager.user_id).await.unwrap().len(),
        3
    );
}

#[tokio::test]
async fn test_duplicate_username_keeps_invite() {
    let app = TestApp::new().await;
    app.create_user("bob", "bob password", &[]).await;
    let code = app
        .state
        .invites
        .first_unused_invite(app.admin.user_id)
        .await
        .unwrap()
        .unwrap()
        .to_string();

    let err = app
        .state
        .invites
        .register_with_invite(&code, "bob", "other password")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::DuplicateUsername(_)));

    assert_eq!(
        app.state.invites.validate_invite_code(&code).await.unwrap(),
        app.admin.user_id
    );
}

#[tokio::test]
async fn test_consumed_invite_names_its_user() {
    let app = TestApp::new().await;
    let bob = app.create_user("bob", "bob password", &[]).await;
    let code = app.state.invites.create_invite(app.admin.user_id).await.unwrap();

    app.state.invites.consume_invite(code, bob.user_id).await.unwrap();
    let err = app
        .state
        .invites
        .consume_invite(code, app.admin.user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidOrExpiredInvite));

    let carol = app
        .state
        .invites
        .register_with_invite(
            &app.state
                .invites
                .first_unused_invite(app.admin.user_id)
                .await
                .unwrap()
                .unwrap()
                .to_string(),
            "carol",
            "carol password",
        )
        .await
        .unwrap();
    let registered = app
        .state
        .credentials
        .find_by_invite(carol.invite_id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(registered.user_id, carol.user_id);
    assert!(app.state.credentials.find_by_invite(code).await.unwrap().is_none());
}

#[tokio::test]
async fn test_concurrent_invites_by_one_inviter_spend_distinct_invites() {
    let app = TestApp::new().await;
    let bob = app.create_user("bob", "bob password", &[]).await;
    app.state.invites.set_remaining_invites(bob.user_id, 2).await.unwrap();

    let (first, second) = futures::join!(
        app.state.invites.invite_user(bob.user_id, "f1", "f1 password"),
        app.state.invites.invite_user(bob.user_id, "f2", "f2 password"),
    );
    let first = first.unwrap();
    let second = second.unwrap();

    assert!(first.invite_id.is_some());
    assert_ne!(first.invite_id, second.invite_id);
    for user in [&first, &second] {
        assert_eq!(
            app.state.invites.inviter_of(user).await.unwrap(),
            Some(bob.user_id)
        );
    }
    assert_eq!(
        app.state.invites.remaining_invites(bob.user_id).await.unwrap(),
        RemainingInvites::Count(0)
    );

    let err = app
        .state
        .invites
        .invite_user(bob.user_id, "f3", "f3 password")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::NoInvitesRemaining));
}
