//! Reaction store
//!
//! Owns every mutation of reaction records. The backing engine offers only
//! single-key atomic primitives (conditional insert, replace by key, delete);
//! upsert is composed from them and resolves identity-key races by retrying
//! as a replace.

use std::time::Duration;

use rand::Rng;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

use reaction_core::{DomainError, Reaction, ReactionKey, ReactionType, Snowflake};

use crate::dto::{RemoveAllForPostsRequest, UpsertReactionRequest};

use super::context::StoreContext;
use super::error::ServiceResult;

/// Reject zero identifiers before touching any index
pub(crate) fn validate_id(id: Snowflake, field: &str) -> Result<(), DomainError> {
    if id.is_zero() {
        return Err(DomainError::ValidationError(format!(
            "{field} must be a non-zero snowflake"
        )));
    }
    Ok(())
}

fn validate_key(post_id: Snowflake, user_id: Snowflake) -> Result<(), DomainError> {
    validate_id(post_id, "post_id")?;
    validate_id(user_id, "user_id")
}

/// Reaction store service
pub struct ReactionStore<'a> {
    ctx: &'a StoreContext,
}

impl<'a> ReactionStore<'a> {
    /// Create a new ReactionStore
    pub fn new(ctx: &'a StoreContext) -> Self {
        Self { ctx }
    }

    /// Create the user's reaction on a post, or change its type
    ///
    /// Re-upserting the current type is a no-op returning the stored record.
    /// A type change keeps or resets `created_at` per the edit policy.
    ///
    /// # Errors
    /// `Conflict` when every attempt lost a race on the identity key.
    #[instrument(skip(self))]
    pub async fn upsert(
        &self,
        post_id: Snowflake,
        user_id: Snowflake,
        reaction_type: &str,
    ) -> ServiceResult<Reaction> {
        validate_key(post_id, user_id)?;
        let settings = self.ctx.settings();
        let reaction_type = settings.type_catalog.admit(reaction_type)?;
        let repo = self.ctx.reaction_repo();
        let attempts = settings.max_upsert_attempts.max(1);

        for attempt in 1..=attempts {
            if attempt > 1 {
                self.backoff(attempt - 1).await;
            }

            match repo.find(post_id, user_id).await? {
                Some(existing) if existing.is_type(&reaction_type) => return Ok(existing),
                Some(existing) => {
                    let changed = existing.retyped(
                        reaction_type.clone(),
                        settings.edit_policy.resets_created_at(),
                    );
                    if let Some(stored) = repo.replace(&changed).await? {
                        info!(
                            post_id = %post_id,
                            user_id = %user_id,
                            from = %existing.reaction_type,
                            to = %stored.reaction_type,
                            "Reaction changed"
                        );
                        return Ok(stored);
                    }
                    debug!(attempt, "Reaction removed during replace, retrying");
                }
                None => {
                    let reaction = Reaction::new(
                        self.ctx.generate_id(),
                        post_id,
                        user_id,
                        reaction_type.clone(),
                    );
                    match repo.insert(&reaction).await {
                        Ok(()) => {
                            info!(
                                post_id = %post_id,
                                user_id = %user_id,
                                reaction_type = %reaction.reaction_type,
                                "Reaction added"
                            );
                            return Ok(reaction);
                        }
                        Err(DomainError::DuplicateReaction(_)) => {
                            debug!(attempt, "Concurrent insert won, retrying as replace");
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
            }
        }

        warn!(
            post_id = %post_id,
            user_id = %user_id,
            attempts,
            "Reaction upsert retries exhausted"
        );
        Err(DomainError::Conflict { attempts }.into())
    }

    /// Upsert from an API request body
    pub async fn upsert_request(
        &self,
        post_id: Snowflake,
        user_id: Snowflake,
        request: &UpsertReactionRequest,
    ) -> ServiceResult<Reaction> {
        request.validate()?;
        self.upsert(post_id, user_id, &request.reaction_type).await
    }

    /// Remove the user's reaction on a post; returns whether one existed
    #[instrument(skip(self))]
    pub async fn remove(&self, post_id: Snowflake, user_id: Snowflake) -> ServiceResult<bool> {
        validate_key(post_id, user_id)?;

        let removed = self.ctx.reaction_repo().delete(post_id, user_id).await?;
        if removed {
            info!(post_id = %post_id, user_id = %user_id, "Reaction removed");
        }
        Ok(removed)
    }

    /// Point lookup
    ///
    /// # Errors
    /// `ReactionNotFound` when the user has no reaction on the post.
    #[instrument(skip(self))]
    pub async fn get(&self, post_id: Snowflake, user_id: Snowflake) -> ServiceResult<Reaction> {
        validate_key(post_id, user_id)?;

        self.ctx
            .reaction_repo()
            .find(post_id, user_id)
            .await?
            .ok_or_else(|| DomainError::ReactionNotFound(ReactionKey::new(post_id, user_id)).into())
    }

    /// Like [`ReactionStore::get`] but absence is `None`
    #[instrument(skip(self))]
    pub async fn find(
        &self,
        post_id: Snowflake,
        user_id: Snowflake,
    ) -> ServiceResult<Option<Reaction>> {
        validate_key(post_id, user_id)?;
        Ok(self.ctx.reaction_repo().find(post_id, user_id).await?)
    }

    /// Remove every reaction on the given posts (posts being deleted)
    #[instrument(skip(self, post_ids), fields(posts = post_ids.len()))]
    pub async fn remove_all_for_posts(&self, post_ids: &[Snowflake]) -> ServiceResult<u64> {
        if post_ids.is_empty() {
            return Ok(0);
        }
        for post_id in post_ids {
            validate_id(*post_id, "post_id")?;
        }

        let removed = self.ctx.reaction_repo().delete_by_posts(post_ids).await?;
        info!(posts = post_ids.len(), removed, "Reactions removed for posts");
        Ok(removed)
    }

    /// Bulk removal from an API request body
    pub async fn remove_all_request(&self, request: &RemoveAllForPostsRequest) -> ServiceResult<u64> {
        request.validate()?;
        self.remove_all_for_posts(&request.post_ids).await
    }

    /// Provision the collection and its indexes; safe to call repeatedly
    #[instrument(skip(self))]
    pub async fn ensure_indexes(&self) -> ServiceResult<()> {
        self.ctx.reaction_repo().ensure_indexes().await?;
        info!("Reaction indexes ensured");
        Ok(())
    }

    /// Whether `reaction_type` is accepted by the configured catalog
    pub fn accepts(&self, reaction_type: &ReactionType) -> bool {
        self.ctx.settings().type_catalog.contains(reaction_type)
    }

    /// Linear backoff with jitter between upsert attempts
    async fn backoff(&self, retry: u32) {
        let base = self.ctx.settings().retry_backoff;
        if base.is_zero() {
            tokio::task::yield_now().await;
            return;
        }

        let jitter = {
            let max = u64::try_from(base.as_micros()).unwrap_or(u64::MAX);
            Duration::from_micros(rand::thread_rng().gen_range(0..=max))
        };
        tokio::time::sleep(base * retry + jitter).await;
    }
}
