//! Caller resolution through the service factory

mod helpers;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use uuid::Uuid;

use eventhub::database::UserStore;
use eventhub::middleware::Claims;
use eventhub::models::{Role, UpdateUserRequest};
use eventhub::utils::errors::EventHubError;
use eventhub::Settings;
use helpers::*;

const SECRET: &str = "factory-test-secret-0123456789abcdef";

async fn context() -> TestContext {
    let mut settings = Settings::default();
    settings.auth.jwt_secret = SECRET.to_string();
    TestContext::with_settings(settings).await
}

fn bearer(sub: Uuid, role: Role) -> String {
    let claims = Claims {
        sub,
        role,
        exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {}", token)
}

#[tokio::test]
async fn test_role_comes_from_stored_account() {
    let ctx = context().await;
    let admin_row = user_row(Role::Admin);
    ctx.store.insert_user(&admin_row).await.unwrap();
    let header = bearer(admin_row.id, Role::Admin);

    let actor = ctx.services.require_actor(Some(&header)).await.unwrap();
    assert!(actor.is_admin());

    let demote = UpdateUserRequest {
        role: Some(Role::User),
        ..Default::default()
    };
    ctx.services
        .user_service
        .update(&ctx.admin, admin_row.id, demote)
        .await
        .unwrap();

    let actor = ctx.services.require_actor(Some(&header)).await.unwrap();
    assert_eq!(actor.id, admin_row.id);
    assert_eq!(actor.role, Role::User);
    assert_matches!(
        ctx.services
            .event_service
            .approve(&actor, ctx.approved_event(3).await.event.id)
            .await,
        Err(EventHubError::PermissionDenied(_))
    );
}

#[tokio::test]
async fn test_token_for_deleted_account_refused() {
    let ctx = context().await;
    let user = ctx.register_user().await;
    let header = bearer(user.id, Role::User);
    assert_eq!(
        ctx.services.authenticate(Some(&header)).await.unwrap(),
        Some(user)
    );

    ctx.services
        .user_service
        .delete(&ctx.admin, user.id)
        .await
        .unwrap();
    assert_matches!(
        ctx.services.authenticate(Some(&header)).await,
        Err(EventHubError::Authentication(_))
    );
}

#[tokio::test]
async fn test_anonymous_and_unknown_tokens() {
    let ctx = context().await;
    assert_eq!(ctx.services.authenticate(None).await.unwrap(), None);
    assert_matches!(
        ctx.services.require_actor(None).await,
        Err(EventHubError::Authentication(_))
    );

    let stranger = bearer(Uuid::new_v4(), Role::Admin);
    assert_matches!(
        ctx.services.require_actor(Some(&stranger)).await,
        Err(EventHubError::Authentication(_))
    );
}
