//! Concurrent access tests
//!
//! Many writers race on the same identity key or the same post while readers
//! observe the views.
//!
//! Run with: cargo test -p integration-tests --test concurrency_tests

use std::sync::Arc;

use futures::future::join_all;
use integration_tests::{collect_timeline, test_settings, users, Scope, POST, USER_A};
use reaction_core::ReactionType;
use reaction_db::MemoryReactionRepository;
use reaction_service::{ReactionStore, StoreContext, StoreContextBuilder, TimelineService};

fn shared_context() -> (StoreContext, MemoryReactionRepository) {
    integration_tests::init_test_tracing();
    let engine = MemoryReactionRepository::new();
    let ctx = StoreContextBuilder::new()
        .reaction_repo(Arc::new(engine.clone()))
        .settings(test_settings().with_max_upsert_attempts(8))
        .build()
        .unwrap();
    (ctx, engine)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_upserts_on_one_pair_leave_one_record() {
    let (ctx, engine) = shared_context();

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let ctx = ctx.clone();
            tokio::spawn(async move {
                let kind = if i % 2 == 0 { "like" } else { "love" };
                ReactionStore::new(&ctx).upsert(POST, USER_A, kind).await
            })
        })
        .collect();

    let mut last_types = Vec::new();
    for handle in handles {
        let reaction = handle.await.unwrap().unwrap();
        last_types.push(reaction.reaction_type);
    }

    assert_eq!(engine.indexes().len(), 1);
    assert!(engine.indexes().is_consistent());

    let stored = ReactionStore::new(&ctx).get(POST, USER_A).await.unwrap();
    assert!(stored.is_type(&ReactionType::like()) || stored.is_type(&ReactionType::love()));
    assert!(last_types.contains(&stored.reaction_type));

    let counts = TimelineService::new(&ctx).reaction_counts(POST).await.unwrap();
    assert_eq!(counts.values().sum::<u64>(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_like_love_race_settles_on_one_of_them() {
    let (ctx, _engine) = shared_context();

    let like_ctx = ctx.clone();
    let love_ctx = ctx.clone();
    let (like, love) = tokio::join!(
        tokio::spawn(async move { ReactionStore::new(&like_ctx).upsert(POST, USER_A, "like").await }),
        tokio::spawn(async move { ReactionStore::new(&love_ctx).upsert(POST, USER_A, "love").await }),
    );
    let like = like.unwrap().unwrap();
    let love = love.unwrap().unwrap();

    // Both writes landed on the same record
    assert_eq!(like.id, love.id);

    // The stored record is exactly what the write that completed last returned
    let stored = ReactionStore::new(&ctx).get(POST, USER_A).await.unwrap();
    assert_eq!(stored.id, like.id);
    assert!(stored == like || stored == love);
    assert_eq!(stored.updated_at, like.updated_at.max(love.updated_at));
    if like.updated_at != love.updated_at {
        let last = if like.updated_at > love.updated_at { &like } else { &love };
        assert_eq!(stored.reaction_type, last.reaction_type);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_toggle_and_remove_never_duplicate() {
    let (ctx, engine) = shared_context();

    let handles: Vec<_> = (0..48)
        .map(|i| {
            let ctx = ctx.clone();
            tokio::spawn(async move {
                let store = ReactionStore::new(&ctx);
                match i % 3 {
                    0 => store.upsert(POST, USER_A, "like").await.map(|_| ()),
                    1 => store.upsert(POST, USER_A, "haha").await.map(|_| ()),
                    _ => store.remove(POST, USER_A).await.map(|_| ()),
                }
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert!(engine.indexes().len() <= 1);
    assert!(engine.indexes().is_consistent());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_counts_match_grouping_after_concurrent_writers() {
    let (ctx, engine) = shared_context();
    let people = users(40);

    let writers = people.iter().copied().enumerate().map(|(i, user)| {
        let ctx = ctx.clone();
        async move {
            let store = ReactionStore::new(&ctx);
            let kind = ReactionType::PREDEFINED[i % ReactionType::PREDEFINED.len()];
            store.upsert(POST, user, kind).await?;
            if i % 4 == 0 {
                store.upsert(POST, user, "wow").await?;
            }
            if i % 5 == 0 {
                store.remove(POST, user).await?;
            }
            Ok::<_, reaction_service::ServiceError>(())
        }
    });

    let readers = (0..10).map(|_| {
        let ctx = ctx.clone();
        async move {
            let views = TimelineService::new(&ctx);
            for _ in 0..5 {
                let summary = views.reaction_summary(POST).await?;
                // A single snapshot: the total is the sum of the groups
                assert_eq!(summary.total, summary.counts.values().sum::<u64>());
                tokio::task::yield_now().await;
            }
            Ok::<_, reaction_service::ServiceError>(())
        }
    });

    let (written, read) = tokio::join!(join_all(writers), join_all(readers));
    assert!(written.into_iter().all(|r| r.is_ok()));
    assert!(read.into_iter().all(|r| r.is_ok()));

    // Quiescent: counts agree with the records held for the post
    let views = TimelineService::new(&ctx);
    let summary = views.reaction_summary(POST).await.unwrap();
    let listed = collect_timeline(&views, Scope::Post(POST), 7).await.unwrap();
    assert_eq!(summary.total, listed.len() as u64);
    assert_eq!(listed.len(), 32);

    for (reaction_type, count) in &summary.counts {
        let group = views
            .reactions_by_type(POST, reaction_type.as_str(), Some(100))
            .await
            .unwrap();
        assert_eq!(group.len() as u64, *count, "type {reaction_type}");
    }
    assert!(engine.indexes().is_consistent());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_users_on_many_posts() {
    let (ctx, engine) = shared_context();
    let people = users(12);

    let handles: Vec<_> = people
        .iter()
        .copied()
        .flat_map(|user| {
            (1..=6).map(move |post| (user, reaction_core::Snowflake::new(post)))
        })
        .map(|(user, post)| {
            let ctx = ctx.clone();
            tokio::spawn(async move { ReactionStore::new(&ctx).upsert(post, user, "like").await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(engine.indexes().len(), 72);
    let views = TimelineService::new(&ctx);
    for user in &people {
        let history = collect_timeline(&views, Scope::User(*user), 4).await.unwrap();
        assert_eq!(history.len(), 6);
    }
    assert!(engine.indexes().is_consistent());
}
