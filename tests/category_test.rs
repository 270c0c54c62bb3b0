//! Category management tests

mod helpers;

use assert_matches::assert_matches;

use eventhub::models::{CategoryDeletion, EventStatus, NewCategory, UpdateCategoryRequest};
use eventhub::utils::errors::{ConflictReason, EventHubError};
use helpers::*;

#[tokio::test]
async fn test_only_admins_manage_categories() {
    let ctx = TestContext::new().await;
    let user = ctx.register_user().await;
    let categories = &ctx.services.category_service;

    assert_matches!(
        categories.create(&user, new_category()).await,
        Err(EventHubError::PermissionDenied(_))
    );
    assert_matches!(
        categories
            .update(&user, ctx.category.id, UpdateCategoryRequest::default())
            .await,
        Err(EventHubError::PermissionDenied(_))
    );
    assert_matches!(
        categories.delete(&user, ctx.category.id).await,
        Err(EventHubError::PermissionDenied(_))
    );
}

#[tokio::test]
async fn test_create_validates_and_rejects_duplicates() {
    let ctx = TestContext::new().await;
    let categories = &ctx.services.category_service;

    let blank = NewCategory {
        name: "   ".to_string(),
        description: Some("x".repeat(501)),
        active: None,
    };
    let errors = assert_matches!(
        categories.create(&ctx.admin, blank).await,
        Err(EventHubError::Validation(errors)) => errors
    );
    assert!(errors.has_field("name"));
    assert!(errors.has_field("description"));

    let duplicate = NewCategory {
        name: format!("  {}  ", ctx.category.name),
        description: None,
        active: None,
    };
    assert_matches!(
        categories.create(&ctx.admin, duplicate).await,
        Err(EventHubError::Conflict(ConflictReason::DuplicateCategoryName))
    );
}

#[tokio::test]
async fn test_inactive_categories_hidden_from_non_admins() {
    let ctx = TestContext::new().await;
    let user = ctx.register_user().await;
    let categories = &ctx.services.category_service;

    let hidden = categories
        .create(
            &ctx.admin,
            NewCategory {
                active: Some(false),
                ..new_category()
            },
        )
        .await
        .unwrap();

    let public = categories.list(None).await.unwrap();
    assert_eq!(public.len(), 1);
    assert_eq!(public[0].id, ctx.category.id);

    let all = categories.list(Some(&ctx.admin)).await.unwrap();
    assert_eq!(all.len(), 2);
    let names: Vec<&str> = all.iter().map(|c| c.name.as_str()).collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);

    assert_matches!(
        categories.get(Some(&user), hidden.id).await,
        Err(EventHubError::CategoryNotFound { .. })
    );
    assert!(categories.get(Some(&ctx.admin), hidden.id).await.is_ok());
}

#[tokio::test]
async fn test_rename_conflicts_with_existing_name() {
    let ctx = TestContext::new().await;
    let categories = &ctx.services.category_service;
    let other = categories.create(&ctx.admin, new_category()).await.unwrap();

    let rename = UpdateCategoryRequest {
        name: Some(ctx.category.name.clone()),
        ..Default::default()
    };
    assert_matches!(
        categories.update(&ctx.admin, other.id, rename).await,
        Err(EventHubError::Conflict(ConflictReason::DuplicateCategoryName))
    );

    let keep_own_name = UpdateCategoryRequest {
        name: Some(other.name.clone()),
        description: Some(String::new()),
        ..Default::default()
    };
    let updated = categories
        .update(&ctx.admin, other.id, keep_own_name)
        .await
        .unwrap();
    assert_eq!(updated.description, None);
}

#[tokio::test]
async fn test_delete_deactivates_category_in_use() {
    let ctx = TestContext::new().await;
    let categories = &ctx.services.category_service;
    ctx.approved_event(5).await;

    let outcome = categories.delete(&ctx.admin, ctx.category.id).await.unwrap();
    assert_eq!(outcome, CategoryDeletion::Deactivated { dependent_events: 1 });
    let category = categories.get(Some(&ctx.admin), ctx.category.id).await.unwrap();
    assert!(!category.active);

    let unused = categories.create(&ctx.admin, new_category()).await.unwrap();
    let outcome = categories.delete(&ctx.admin, unused.id).await.unwrap();
    assert_eq!(outcome, CategoryDeletion::Deleted);
    assert_matches!(
        categories.get(Some(&ctx.admin), unused.id).await,
        Err(EventHubError::CategoryNotFound { .. })
    );
}

#[tokio::test]
async fn test_category_stats() {
    let ctx = TestContext::new().await;
    let events = &ctx.services.event_service;
    let categories = &ctx.services.category_service;
    let organizer = ctx.register_user().await;

    let busy = ctx.approved_event(10).await.event.id;
    let quiet = ctx.approved_event(10).await.event.id;
    let canceled = ctx.approved_event(10).await.event.id;
    ctx.pending_event(&organizer).await;

    for _ in 0..3 {
        let user = ctx.register_user().await;
        events.participate(&user, busy).await.unwrap();
    }
    let user = ctx.register_user().await;
    events.participate(&user, quiet).await.unwrap();
    events.cancel(&ctx.admin, canceled).await.unwrap();

    let public = categories.stats(None, ctx.category.id).await.unwrap();
    assert_eq!(public.events_count, 2);
    assert_eq!(public.total_participants, 4);
    assert_eq!(public.avg_participants_per_event, 2.0);
    assert_eq!(public.events_by_status[&EventStatus::Active], 2);
    assert_eq!(public.events_by_status[&EventStatus::Canceled], 0);

    let admin = categories.stats(Some(&ctx.admin), ctx.category.id).await.unwrap();
    assert_eq!(admin.events_count, 4);
    assert_eq!(admin.avg_participants_per_event, 1.0);
    assert_eq!(admin.events_by_status[&EventStatus::Canceled], 1);
    assert_eq!(admin.events_by_status[&EventStatus::Inactive], 1);
    assert_eq!(admin.events_by_status[&EventStatus::Finished], 0);
}
