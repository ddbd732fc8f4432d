//! Repository trait (port) - the backing engine seen by the reaction store
//!
//! Every method is a single-key atomic primitive or a read over one index.
//! Nothing here requires a multi-key transaction; the store builds its
//! guarantees (upsert retry, consistent counts) on top of these calls.

use async_trait::async_trait;

use crate::entities::Reaction;
use crate::error::DomainError;
use crate::value_objects::{ReactionType, Snowflake, TimelineCursor};

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

/// Keyset page request over a newest-first timeline
#[derive(Debug, Clone, Copy, Default)]
pub struct TimelineQuery {
    /// Only return records strictly older than this position
    pub after: Option<TimelineCursor>,
    pub limit: i64,
}

impl TimelineQuery {
    /// Upper bound any engine applies to a single fetch
    pub const MAX_LIMIT: i64 = 1000;

    /// Largest page a view may serve; one fetch still has room for the
    /// look-ahead row that decides whether a next page exists
    pub const MAX_PAGE_SIZE: i64 = Self::MAX_LIMIT - 1;

    pub fn first(limit: i64) -> Self {
        Self { after: None, limit }
    }

    pub fn after(cursor: TimelineCursor, limit: i64) -> Self {
        Self {
            after: Some(cursor),
            limit,
        }
    }

    /// Limit clamped into `1..=MAX_LIMIT`
    #[inline]
    pub fn clamped_limit(&self) -> i64 {
        clamp_limit(self.limit)
    }
}

/// Clamp a fetch size into `1..=TimelineQuery::MAX_LIMIT`
#[inline]
pub fn clamp_limit(limit: i64) -> i64 {
    limit.clamp(1, TimelineQuery::MAX_LIMIT)
}

#[async_trait]
pub trait ReactionRepository: Send + Sync {
    /// Point lookup through the identity index
    async fn find(&self, post_id: Snowflake, user_id: Snowflake) -> RepoResult<Option<Reaction>>;

    /// Conditional insert. Fails with `DomainError::DuplicateReaction` when a
    /// record already holds the `(post_id, user_id)` key.
    async fn insert(&self, reaction: &Reaction) -> RepoResult<()>;

    /// Atomically overwrite the mutable fields (`reaction_type`, `created_at`,
    /// `updated_at`) of the record holding the same identity key and the same
    /// `id`. Returns the stored record, or `None` if the key is free or now
    /// held by a different record.
    async fn replace(&self, reaction: &Reaction) -> RepoResult<Option<Reaction>>;

    /// Physically delete the record for the pair; returns whether one existed
    async fn delete(&self, post_id: Snowflake, user_id: Snowflake) -> RepoResult<bool>;

    /// Page of a post's reactions, newest first
    async fn find_by_post(&self, post_id: Snowflake, query: TimelineQuery)
        -> RepoResult<Vec<Reaction>>;

    /// Page of a user's reactions, newest first
    async fn find_by_user(&self, user_id: Snowflake, query: TimelineQuery)
        -> RepoResult<Vec<Reaction>>;

    /// Newest reactions of one type on a post
    async fn find_by_type(
        &self,
        post_id: Snowflake,
        reaction_type: &ReactionType,
        limit: i64,
    ) -> RepoResult<Vec<Reaction>>;

    /// Per-type counts of a post, taken from a single consistent snapshot
    async fn count_by_type(&self, post_id: Snowflake) -> RepoResult<Vec<(ReactionType, i64)>>;

    /// Remove every reaction on the given posts; returns the number removed
    async fn delete_by_posts(&self, post_ids: &[Snowflake]) -> RepoResult<u64>;

    /// Idempotently provision the collection and its indexes without blocking
    /// concurrent reads and writes
    async fn ensure_indexes(&self) -> RepoResult<()>;
}
