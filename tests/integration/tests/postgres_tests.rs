//! Reaction store scenarios against PostgreSQL
//!
//! These tests require a running PostgreSQL instance.
//! Set DATABASE_URL environment variable before running:
//!
//! Run with: cargo test -p integration-tests --test postgres_tests

use integration_tests::{check_test_env, collect_timeline, test_config, unique_id, Scope};
use reaction_core::ReactionType;
use reaction_service::{ReactionStore, StoreContext, TimelineService};

async fn connect() -> Option<StoreContext> {
    if !check_test_env() {
        return None;
    }
    let config = test_config()?;
    Some(StoreContext::connect(&config).await.expect("Failed to connect store"))
}

#[tokio::test]
async fn test_pg_upsert_get_remove() {
    let Some(ctx) = connect().await else {
        return;
    };
    let store = ReactionStore::new(&ctx);
    let views = TimelineService::new(&ctx);
    let (post, a, b) = (unique_id(), unique_id(), unique_id());

    store.upsert(post, a, "like").await.unwrap();
    store.upsert(post, b, "love").await.unwrap();
    store.upsert(post, a, "love").await.unwrap();

    assert_eq!(store.get(post, a).await.unwrap().reaction_type, ReactionType::love());
    let counts = views.reaction_counts(post).await.unwrap();
    assert_eq!(counts.get(&ReactionType::love()), Some(&2));
    assert_eq!(counts.len(), 1);

    assert!(store.remove(post, a).await.unwrap());
    assert!(!store.remove(post, a).await.unwrap());
    assert!(store.get(post, a).await.unwrap_err().is_not_found());

    // Clean up
    store.remove_all_for_posts(&[post]).await.unwrap();
}

#[tokio::test]
async fn test_pg_pagination_and_user_history() {
    let Some(ctx) = connect().await else {
        return;
    };
    let store = ReactionStore::new(&ctx);
    let views = TimelineService::new(&ctx);
    let post = unique_id();
    let user = unique_id();

    for _ in 0..9 {
        store.upsert(post, unique_id(), "haha").await.unwrap();
    }
    store.upsert(post, user, "like").await.unwrap();
    store.upsert(unique_id(), user, "like").await.unwrap();

    let timeline = collect_timeline(&views, Scope::Post(post), 4).await.unwrap();
    assert_eq!(timeline.len(), 10);
    assert!(timeline.windows(2).all(|w| w[0].created_at >= w[1].created_at));

    let history = collect_timeline(&views, Scope::User(user), 1).await.unwrap();
    assert_eq!(history.len(), 2);

    let summary = views.reaction_summary(post).await.unwrap();
    assert_eq!(summary.total, 10);

    // Clean up
    let posts: Vec<_> = history.iter().map(|r| r.post_id).collect();
    store.remove_all_for_posts(&posts).await.unwrap();
    store.remove_all_for_posts(&[post]).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_pg_racing_upserts() {
    let Some(ctx) = connect().await else {
        return;
    };
    let post = unique_id();
    let user = unique_id();

    let handles: Vec<_> = (0..12)
        .map(|i| {
            let ctx = ctx.clone();
            tokio::spawn(async move {
                let kind = if i % 2 == 0 { "like" } else { "love" };
                ReactionStore::new(&ctx).upsert(post, user, kind).await
            })
        })
        .collect();

    for handle in handles {
        let result = handle.await.unwrap();
        // A conflict is only possible after every bounded attempt lost
        if let Err(err) = result {
            assert!(err.is_conflict(), "{err}");
        }
    }

    let page = TimelineService::new(&ctx)
        .post_timeline(post, None, None)
        .await
        .unwrap();
    assert_eq!(page.len(), 1);

    ReactionStore::new(&ctx)
        .remove_all_for_posts(&[post])
        .await
        .unwrap();
}
