//! Race resolution and failure propagation tests
//!
//! Uses a fault-injecting engine to force the duplicate-key and outage paths
//! deterministically.
//!
//! Run with: cargo test -p integration-tests --test failure_tests

use integration_tests::{flaky_context, test_settings, POST, USER_A};
use reaction_common::AppError;
use reaction_core::{DomainError, ReactionType};
use reaction_service::{ReactionStore, TimelineService};

#[tokio::test]
async fn test_lost_insert_race_is_retried_as_replace() {
    let (ctx, repo) = flaky_context(test_settings());
    repo.race_on_insert(ReactionType::love());

    let reaction = ReactionStore::new(&ctx)
        .upsert(POST, USER_A, "like")
        .await
        .unwrap();

    // The competitor's record was kept and retyped, never duplicated
    assert_eq!(reaction.reaction_type, ReactionType::like());
    assert_eq!(repo.insert_calls(), 1);
    assert_eq!(repo.inner().indexes().len(), 1);

    let stored = repo.inner().indexes().get(&reaction.key()).unwrap();
    assert_eq!(stored.id, reaction.id);
    assert_eq!(stored.reaction_type, ReactionType::like());
}

#[tokio::test]
async fn test_single_phantom_duplicate_recovers() {
    let (ctx, repo) = flaky_context(test_settings());
    repo.phantom_duplicates(1);

    let reaction = ReactionStore::new(&ctx)
        .upsert(POST, USER_A, "wow")
        .await
        .unwrap();

    assert_eq!(reaction.reaction_type.as_str(), "wow");
    assert_eq!(repo.insert_calls(), 2);
}

#[tokio::test]
async fn test_exhausted_retries_surface_conflict() {
    let (ctx, repo) = flaky_context(test_settings());
    repo.phantom_duplicates(u32::MAX);

    let err = ReactionStore::new(&ctx)
        .upsert(POST, USER_A, "like")
        .await
        .unwrap_err();

    assert!(err.is_conflict());
    assert_eq!(err.status_code(), 409);
    assert!(matches!(
        err.as_domain(),
        Some(DomainError::Conflict { attempts: 3 })
    ));
    assert_eq!(repo.insert_calls(), 3);
    assert!(repo.inner().indexes().is_empty());

    // The caller may retry the whole operation
    let app: AppError = err.into();
    assert!(app.is_retryable());
}

#[tokio::test]
async fn test_attempt_bound_is_configurable() {
    let (ctx, repo) = flaky_context(test_settings().with_max_upsert_attempts(1));
    repo.phantom_duplicates(1);

    let err = ReactionStore::new(&ctx)
        .upsert(POST, USER_A, "like")
        .await
        .unwrap_err();

    assert!(matches!(
        err.as_domain(),
        Some(DomainError::Conflict { attempts: 1 })
    ));
    assert_eq!(repo.insert_calls(), 1);
}

#[tokio::test]
async fn test_retry_backoff_still_resolves() {
    let settings = test_settings().with_retry_backoff(std::time::Duration::from_millis(1));
    let (ctx, repo) = flaky_context(settings);
    repo.phantom_duplicates(2);

    let reaction = ReactionStore::new(&ctx)
        .upsert(POST, USER_A, "sad")
        .await
        .unwrap();
    assert_eq!(reaction.reaction_type.as_str(), "sad");
    assert_eq!(repo.insert_calls(), 3);
}

#[tokio::test]
async fn test_store_unavailable_propagates_unchanged() {
    let (ctx, repo) = flaky_context(test_settings());
    let store = ReactionStore::new(&ctx);
    let views = TimelineService::new(&ctx);

    store.upsert(POST, USER_A, "like").await.unwrap();
    repo.set_unavailable(true);

    let errors = vec![
        store.upsert(POST, USER_A, "love").await.unwrap_err(),
        store.remove(POST, USER_A).await.unwrap_err(),
        store.get(POST, USER_A).await.unwrap_err(),
        views.post_timeline(POST, None, None).await.unwrap_err(),
        views.reaction_counts(POST).await.unwrap_err(),
    ];
    for err in &errors {
        assert!(err.is_unavailable(), "{err}");
        assert_eq!(err.status_code(), 503);
    }
    // No retry on outage: the single find failed before any insert
    assert_eq!(repo.insert_calls(), 1);

    repo.set_unavailable(false);
    let stored = store.get(POST, USER_A).await.unwrap();
    assert_eq!(stored.reaction_type, ReactionType::like());
}

#[tokio::test]
async fn test_validation_never_reaches_engine() {
    let (ctx, repo) = flaky_context(test_settings());
    repo.set_unavailable(true);

    let err = ReactionStore::new(&ctx)
        .upsert(POST, USER_A, "not a type")
        .await
        .unwrap_err();

    // Rejected up front, so the outage is never observed
    assert!(err.is_validation());
    assert_eq!(repo.insert_calls(), 0);
}

#[tokio::test]
async fn test_edit_never_carries_a_removed_record_into_its_successor() {
    let (ctx, repo) = flaky_context(test_settings());
    let store = ReactionStore::new(&ctx);

    let first = store.upsert(POST, USER_A, "like").await.unwrap();
    repo.reinsert_before_replace();

    let stored = store.upsert(POST, USER_A, "love").await.unwrap();
    let fresh = repo.reinserted().unwrap();

    // The edit was retried against the re-created record and kept its timestamp
    assert_ne!(fresh.id, first.id);
    assert!(fresh.created_at > first.created_at);
    assert_eq!(stored.id, fresh.id);
    assert_eq!(stored.created_at, fresh.created_at);
    assert_eq!(stored.reaction_type, ReactionType::love());

    let current = store.get(POST, USER_A).await.unwrap();
    assert_eq!(current, stored);
    assert!(repo.inner().indexes().is_consistent());
}
