use armory::constants::ACCESS_TOKEN_TTL_SECS;

use crate::helpers::*;

#[tokio::test]
async fn access_tokens_resolve_to_their_user() {
    let armory = test_armory().await;
    let user = test_user(&armory, "diver").await;
    let users = armory.users();

    let tokens = users.issue_tokens(&user).unwrap();
    assert_ne!(tokens.access, tokens.refresh);
    assert!(tokens.refresh_expires_at > tokens.access_expires_at);

    let resolved = users.user_from_access_token(&tokens.access).await.unwrap();
    assert_eq!(resolved.id, user.id);

    // A refresh token is not an access token.
    let err = users.user_from_access_token(&tokens.refresh).await.unwrap_err();
    assert!(err.is_authentication_error());
    let err = users.user_from_access_token("not.a.jwt").await.unwrap_err();
    assert!(err.is_authentication_error());
}

#[tokio::test]
async fn access_tokens_expire() {
    let (armory, clock, _mailer) = test_armory_with_clock().await;
    let user = test_user(&armory, "diver").await;
    let users = armory.users();
    let tokens = users.issue_tokens(&user).unwrap();

    clock.advance_secs(ACCESS_TOKEN_TTL_SECS - 1);
    users.user_from_access_token(&tokens.access).await.unwrap();

    clock.advance_secs(1);
    let err = users.user_from_access_token(&tokens.access).await.unwrap_err();
    assert!(err.is_authentication_error());

    // The refresh token outlives it.
    let (refreshed_user, fresh) = users.refresh(&tokens.refresh).await.unwrap();
    assert_eq!(refreshed_user.id, user.id);
    users.user_from_access_token(&fresh.access).await.unwrap();
}

#[tokio::test]
async fn refresh_rejects_access_tokens() {
    let armory = test_armory().await;
    let user = test_user(&armory, "diver").await;
    let tokens = armory.users().issue_tokens(&user).unwrap();

    let err = armory.users().refresh(&tokens.access).await.unwrap_err();
    assert!(err.is_authentication_error());
}

#[tokio::test]
async fn tokens_from_another_secret_are_rejected() {
    let armory = test_armory().await;
    let user = test_user(&armory, "diver").await;

    let mut config = test_config();
    config.auth.jwt_secret = "a-completely-different-secret".to_string();
    let other = armory::Armory::builder(config).in_memory().await.unwrap();
    let foreign = other.users().issue_tokens(&user).unwrap();

    let err = armory
        .users()
        .user_from_access_token(&foreign.access)
        .await
        .unwrap_err();
    assert!(err.is_authentication_error());
}
