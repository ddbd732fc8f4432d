//! Reaction store scenario tests
//!
//! Run against the in-memory engine; no external services required.
//!
//! Run with: cargo test -p integration-tests --test store_tests

use std::collections::{BTreeMap, HashSet};

use integration_tests::{
    collect_timeline, test_settings, users, Scope, TestStore, OTHER_POST, POST, USER_A, USER_B,
    USER_C,
};
use reaction_core::{ReactionType, Snowflake, TimelineQuery};
use reaction_service::dto::{PaginatedResponse, ReactionCountsResponse, ReactionResponse};
use reaction_service::{EditPolicy, ReactionTypeCatalog};

fn counts(pairs: &[(&str, u64)]) -> BTreeMap<ReactionType, u64> {
    pairs
        .iter()
        .map(|(t, n)| (ReactionType::parse(t).unwrap(), *n))
        .collect()
}

// ============================================================================
// Upsert / Get / Remove
// ============================================================================

#[tokio::test]
async fn test_second_upsert_overwrites_first() {
    let harness = TestStore::new();
    let store = harness.store();
    let views = harness.views();

    store.upsert(POST, USER_A, "like").await.unwrap();
    store.upsert(POST, USER_B, "love").await.unwrap();
    store.upsert(POST, USER_A, "love").await.unwrap();

    let a = store.get(POST, USER_A).await.unwrap();
    assert_eq!(a.reaction_type, ReactionType::love());

    assert_eq!(views.reaction_counts(POST).await.unwrap(), counts(&[("love", 2)]));

    let page = views.post_timeline(POST, None, None).await.unwrap();
    assert_eq!(page.len(), 2);
    assert!(page.is_last());
}

#[tokio::test]
async fn test_remove_then_counts_drop() {
    let harness = TestStore::new();
    let store = harness.store();
    let views = harness.views();

    store.upsert(POST, USER_A, "like").await.unwrap();
    store.upsert(POST, USER_B, "love").await.unwrap();
    store.upsert(POST, USER_A, "love").await.unwrap();

    assert!(store.remove(POST, USER_A).await.unwrap());
    assert_eq!(views.reaction_counts(POST).await.unwrap(), counts(&[("love", 1)]));
}

#[tokio::test]
async fn test_upsert_twice_yields_one_record() {
    let harness = TestStore::new();
    let store = harness.store();

    let first = store.upsert(POST, USER_A, "wow").await.unwrap();
    let second = store.upsert(POST, USER_A, "wow").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(harness.engine.indexes().len(), 1);

    let changed = store.upsert(POST, USER_A, "sad").await.unwrap();
    assert_eq!(changed.id, first.id);
    assert_eq!(harness.engine.indexes().len(), 1);
}

#[tokio::test]
async fn test_remove_twice() {
    let harness = TestStore::new();
    let store = harness.store();

    store.upsert(POST, USER_A, "like").await.unwrap();
    assert!(store.remove(POST, USER_A).await.unwrap());
    assert!(!store.remove(POST, USER_A).await.unwrap());

    let err = store.get(POST, USER_A).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.status_code(), 404);
    assert!(harness.engine.indexes().is_empty());
}

#[tokio::test]
async fn test_identity_is_immutable() {
    let harness = TestStore::new();
    let store = harness.store();

    let created = store.upsert(POST, USER_A, "like").await.unwrap();
    let changed = store.upsert(POST, USER_A, "angry").await.unwrap();

    assert_eq!(changed.post_id, created.post_id);
    assert_eq!(changed.user_id, created.user_id);
    assert_eq!(changed.id, created.id);
    assert_eq!(changed.created_at, created.created_at);
    assert!(changed.updated_at >= created.updated_at);
}

// ============================================================================
// Edit policy and type catalog
// ============================================================================

#[tokio::test]
async fn test_reset_policy_moves_edit_to_top_of_timelines() {
    let harness =
        TestStore::with_settings(test_settings().with_edit_policy(EditPolicy::ResetCreatedAt));
    let store = harness.store();
    let views = harness.views();

    store.upsert(POST, USER_A, "like").await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    store.upsert(POST, USER_B, "like").await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    store.upsert(POST, USER_A, "love").await.unwrap();

    let page = views.post_timeline(POST, None, None).await.unwrap();
    let order: Vec<Snowflake> = page.items.iter().map(|r| r.user_id).collect();
    assert_eq!(order, vec![USER_A, USER_B]);
}

#[tokio::test]
async fn test_preserve_policy_keeps_timeline_position() {
    let harness = TestStore::new();
    let store = harness.store();
    let views = harness.views();

    store.upsert(POST, USER_A, "like").await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    store.upsert(POST, USER_B, "like").await.unwrap();
    store.upsert(POST, USER_A, "love").await.unwrap();

    let page = views.post_timeline(POST, None, None).await.unwrap();
    let order: Vec<Snowflake> = page.items.iter().map(|r| r.user_id).collect();
    assert_eq!(order, vec![USER_B, USER_A]);
}

#[tokio::test]
async fn test_closed_catalog_rejects_before_any_write() {
    let harness = TestStore::new();
    let store = harness.store();

    let err = store.upsert(POST, USER_A, "party").await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(err.status_code(), 400);
    assert!(harness.engine.indexes().is_empty());
}

#[tokio::test]
async fn test_open_catalog_discovers_types() {
    let harness =
        TestStore::with_settings(test_settings().with_type_catalog(ReactionTypeCatalog::Open));
    let store = harness.store();
    let views = harness.views();

    store.upsert(POST, USER_A, "party").await.unwrap();
    store.upsert(POST, USER_B, "🔥").await.unwrap();
    store.upsert(POST, USER_C, "party").await.unwrap();

    assert_eq!(
        views.reaction_counts(POST).await.unwrap(),
        counts(&[("party", 2), ("🔥", 1)])
    );
    let fire = views.reactions_by_type(POST, "🔥", None).await.unwrap();
    assert_eq!(fire.len(), 1);
    assert_eq!(fire[0].user_id, USER_B);
}

// ============================================================================
// Views
// ============================================================================

#[tokio::test]
async fn test_full_pagination_has_no_gaps_or_duplicates() {
    let harness = TestStore::new();
    let store = harness.store();

    let users: Vec<Snowflake> = (1..=23).map(|i| Snowflake::new(500 + i)).collect();
    for (i, user) in users.iter().enumerate() {
        let kind = ReactionType::PREDEFINED[i % ReactionType::PREDEFINED.len()];
        store.upsert(POST, *user, kind).await.unwrap();
    }

    for page_size in [1, 4, 7, 23, 100] {
        let items = collect_timeline(&harness.views(), Scope::Post(POST), page_size)
            .await
            .unwrap();
        assert_eq!(items.len(), users.len(), "page size {page_size}");

        let unique: HashSet<Snowflake> = items.iter().map(|r| r.user_id).collect();
        assert_eq!(unique.len(), users.len());
        assert!(items.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }
}

#[tokio::test]
async fn test_pages_at_the_fetch_bound_still_reach_every_record() {
    let mut settings = test_settings();
    settings.max_page_size = 5_000;
    let harness = TestStore::with_settings(settings);
    let store = harness.store();

    let people = users(TimelineQuery::MAX_LIMIT + 5);
    for user in &people {
        store.upsert(POST, *user, "like").await.unwrap();
    }

    let first = harness
        .views()
        .post_timeline(POST, None, Some(TimelineQuery::MAX_LIMIT))
        .await
        .unwrap();
    assert_eq!(first.len() as i64, TimelineQuery::MAX_PAGE_SIZE);
    assert!(!first.is_last());

    for page_size in [TimelineQuery::MAX_PAGE_SIZE, TimelineQuery::MAX_LIMIT, 5_000] {
        let items = collect_timeline(&harness.views(), Scope::Post(POST), page_size)
            .await
            .unwrap();
        assert_eq!(items.len(), people.len(), "page size {page_size}");
    }
}

#[tokio::test]
async fn test_user_timeline_spans_posts() {
    let harness = TestStore::new();
    let store = harness.store();

    for post in 1..=5 {
        store.upsert(Snowflake::new(post), USER_A, "like").await.unwrap();
    }
    store.upsert(OTHER_POST, USER_B, "love").await.unwrap();

    let items = collect_timeline(&harness.views(), Scope::User(USER_A), 2)
        .await
        .unwrap();
    assert_eq!(items.len(), 5);
    assert!(items.iter().all(|r| r.user_id == USER_A));
    assert!(items.windows(2).all(|w| w[0].created_at >= w[1].created_at));
}

#[tokio::test]
async fn test_cursor_survives_concurrent_inserts_at_head() {
    let harness = TestStore::new();
    let store = harness.store();
    let views = harness.views();

    for user in integration_tests::users(6) {
        store.upsert(POST, user, "like").await.unwrap();
    }

    let first = views.post_timeline(POST, None, Some(3)).await.unwrap();
    let cursor = first.next_cursor.unwrap().encode();

    // Newer records land before the cursor and do not shift the next page
    store.upsert(POST, USER_A, "love").await.unwrap();
    store.upsert(POST, USER_B, "love").await.unwrap();

    let second = views.post_timeline(POST, Some(&cursor), Some(3)).await.unwrap();
    assert_eq!(second.len(), 3);
    assert!(second.is_last());

    let seen: HashSet<Snowflake> = first
        .items
        .iter()
        .chain(second.items.iter())
        .map(|r| r.user_id)
        .collect();
    assert_eq!(seen.len(), 6);
}

#[tokio::test]
async fn test_summary_matches_timeline() {
    let harness = TestStore::new();
    let store = harness.store();
    let views = harness.views();

    for (i, user) in integration_tests::users(10).into_iter().enumerate() {
        let kind = if i % 3 == 0 { "haha" } else { "like" };
        store.upsert(POST, user, kind).await.unwrap();
    }

    let summary = views.reaction_summary(POST).await.unwrap();
    assert_eq!(summary.total, 10);
    assert_eq!(summary.count(&ReactionType::parse("haha").unwrap()), 4);
    assert_eq!(summary.count(&ReactionType::like()), 6);

    let listed = collect_timeline(&views, Scope::Post(POST), 50).await.unwrap();
    assert_eq!(summary.total, listed.len() as u64);
}

#[tokio::test]
async fn test_remove_all_for_posts() {
    let harness = TestStore::new();
    let store = harness.store();
    let views = harness.views();

    store.upsert(POST, USER_A, "like").await.unwrap();
    store.upsert(POST, USER_B, "love").await.unwrap();
    store.upsert(OTHER_POST, USER_A, "wow").await.unwrap();

    assert_eq!(store.remove_all_for_posts(&[POST]).await.unwrap(), 2);
    assert!(views.reaction_counts(POST).await.unwrap().is_empty());

    let history = collect_timeline(&views, Scope::User(USER_A), 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].post_id, OTHER_POST);
    assert!(harness.engine.indexes().is_consistent());
}

// ============================================================================
// Index maintenance
// ============================================================================

#[tokio::test]
async fn test_rebuilt_indexes_serve_identical_views() {
    let harness = TestStore::new();
    let store = harness.store();
    let views = harness.views();

    for (i, user) in integration_tests::users(8).into_iter().enumerate() {
        let kind = ReactionType::PREDEFINED[i % 3];
        store.upsert(POST, user, kind).await.unwrap();
    }

    let before_items = collect_timeline(&views, Scope::Post(POST), 3).await.unwrap();
    let before_counts = views.reaction_counts(POST).await.unwrap();

    assert_eq!(harness.engine.rebuild_indexes(), 8);
    store.ensure_indexes().await.unwrap();

    assert_eq!(
        collect_timeline(&views, Scope::Post(POST), 3).await.unwrap(),
        before_items
    );
    assert_eq!(views.reaction_counts(POST).await.unwrap(), before_counts);
}

// ============================================================================
// Response DTOs
// ============================================================================

#[tokio::test]
async fn test_views_serialize_for_the_api_layer() {
    let harness = TestStore::new();
    let store = harness.store();
    let views = harness.views();

    store.upsert(POST, USER_A, "like").await.unwrap();
    store.upsert(POST, USER_B, "like").await.unwrap();

    let page = views.post_timeline(POST, None, Some(1)).await.unwrap();
    let body = serde_json::to_value(PaginatedResponse::<ReactionResponse>::from(page)).unwrap();
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["pagination"]["has_more"], true);
    assert_eq!(body["data"][0]["post_id"], POST.to_string());

    let summary = views.reaction_summary(POST).await.unwrap();
    let body = serde_json::to_value(ReactionCountsResponse::new(POST, &summary)).unwrap();
    assert_eq!(body["total"], 2);
    assert_eq!(body["counts"]["like"], 2);
}
