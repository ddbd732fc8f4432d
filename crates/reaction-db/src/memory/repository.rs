//! In-memory implementation of ReactionRepository

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use reaction_core::traits::{clamp_limit, ReactionRepository, RepoResult, TimelineQuery};
use reaction_core::{DomainError, Reaction, ReactionKey, ReactionType, Snowflake};

use super::IndexSet;

fn fetch_size(limit: i64) -> usize {
    usize::try_from(clamp_limit(limit)).unwrap_or(1)
}

/// ReactionRepository backed by an [`IndexSet`]
///
/// Clones share the same index set.
#[derive(Debug, Clone, Default)]
pub struct MemoryReactionRepository {
    indexes: Arc<IndexSet>,
}

impl MemoryReactionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn indexes(&self) -> &IndexSet {
        &self.indexes
    }

    /// Re-derive the timeline and type indexes from the unique index
    #[instrument(skip(self))]
    pub fn rebuild_indexes(&self) -> usize {
        let records = self.indexes.rebuild();
        info!(records, "Reaction indexes rebuilt");
        records
    }
}

#[async_trait]
impl ReactionRepository for MemoryReactionRepository {
    #[instrument(skip(self))]
    async fn find(&self, post_id: Snowflake, user_id: Snowflake) -> RepoResult<Option<Reaction>> {
        Ok(self.indexes.get(&ReactionKey::new(post_id, user_id)))
    }

    #[instrument(skip(self, reaction), fields(post_id = %reaction.post_id, user_id = %reaction.user_id))]
    async fn insert(&self, reaction: &Reaction) -> RepoResult<()> {
        if self.indexes.insert(reaction) {
            Ok(())
        } else {
            Err(DomainError::DuplicateReaction(reaction.key()))
        }
    }

    #[instrument(skip(self, reaction), fields(post_id = %reaction.post_id, user_id = %reaction.user_id))]
    async fn replace(&self, reaction: &Reaction) -> RepoResult<Option<Reaction>> {
        Ok(self.indexes.replace(reaction))
    }

    #[instrument(skip(self))]
    async fn delete(&self, post_id: Snowflake, user_id: Snowflake) -> RepoResult<bool> {
        Ok(self
            .indexes
            .remove(&ReactionKey::new(post_id, user_id))
            .is_some())
    }

    #[instrument(skip(self))]
    async fn find_by_post(
        &self,
        post_id: Snowflake,
        query: TimelineQuery,
    ) -> RepoResult<Vec<Reaction>> {
        Ok(self
            .indexes
            .post_timeline(post_id, query.after, fetch_size(query.limit)))
    }

    #[instrument(skip(self))]
    async fn find_by_user(
        &self,
        user_id: Snowflake,
        query: TimelineQuery,
    ) -> RepoResult<Vec<Reaction>> {
        Ok(self
            .indexes
            .user_timeline(user_id, query.after, fetch_size(query.limit)))
    }

    #[instrument(skip(self))]
    async fn find_by_type(
        &self,
        post_id: Snowflake,
        reaction_type: &ReactionType,
        limit: i64,
    ) -> RepoResult<Vec<Reaction>> {
        Ok(self
            .indexes
            .type_group(post_id, reaction_type, fetch_size(limit)))
    }

    #[instrument(skip(self))]
    async fn count_by_type(&self, post_id: Snowflake) -> RepoResult<Vec<(ReactionType, i64)>> {
        self.indexes
            .type_counts(post_id)
            .into_iter()
            .map(|(reaction_type, count)| {
                i64::try_from(count)
                    .map(|count| (reaction_type, count))
                    .map_err(|e| DomainError::InternalError(e.to_string()))
            })
            .collect()
    }

    #[instrument(skip(self, post_ids), fields(posts = post_ids.len()))]
    async fn delete_by_posts(&self, post_ids: &[Snowflake]) -> RepoResult<u64> {
        Ok(self.indexes.remove_posts(post_ids))
    }

    async fn ensure_indexes(&self) -> RepoResult<()> {
        if !self.indexes.is_consistent() {
            warn!("Reaction indexes out of sync with the unique index, rebuilding");
            self.rebuild_indexes();
        }
        Ok(())
    }
}
