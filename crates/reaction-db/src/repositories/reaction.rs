//! PostgreSQL implementation of ReactionRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use reaction_core::traits::{clamp_limit, ReactionRepository, RepoResult, TimelineQuery};
use reaction_core::{Reaction, ReactionType, Snowflake};

use crate::mappers::{count_rows, ReactionInsert};
use crate::models::{ReactionCountModel, ReactionModel};
use crate::schema::ensure_schema;

use super::error::{duplicate_reaction, map_db_error};

fn into_entities(rows: Vec<ReactionModel>) -> RepoResult<Vec<Reaction>> {
    rows.into_iter().map(Reaction::try_from).collect()
}

/// PostgreSQL implementation of ReactionRepository
#[derive(Clone)]
pub struct PgReactionRepository {
    pool: PgPool,
}

impl PgReactionRepository {
    /// Create a new PgReactionRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ReactionRepository for PgReactionRepository {
    #[instrument(skip(self))]
    async fn find(&self, post_id: Snowflake, user_id: Snowflake) -> RepoResult<Option<Reaction>> {
        let result = sqlx::query_as::<_, ReactionModel>(
            r#"
            SELECT id, post_id, user_id, reaction_type, created_at, updated_at
            FROM reactions
            WHERE post_id = $1 AND user_id = $2
            "#,
        )
        .bind(post_id.into_inner())
        .bind(user_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(Reaction::try_from).transpose()
    }

    #[instrument(skip(self, reaction), fields(post_id = %reaction.post_id, user_id = %reaction.user_id))]
    async fn insert(&self, reaction: &Reaction) -> RepoResult<()> {
        let row = ReactionInsert::new(reaction);

        // No ON CONFLICT: a duplicate identity key must surface to the store.
        sqlx::query(
            r#"
            INSERT INTO reactions (id, post_id, user_id, reaction_type, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(row.id)
        .bind(row.post_id)
        .bind(row.user_id)
        .bind(row.reaction_type)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_reaction(e, reaction.key()))?;

        Ok(())
    }

    #[instrument(skip(self, reaction), fields(post_id = %reaction.post_id, user_id = %reaction.user_id))]
    async fn replace(&self, reaction: &Reaction) -> RepoResult<Option<Reaction>> {
        let result = sqlx::query_as::<_, ReactionModel>(
            r#"
            UPDATE reactions
            SET reaction_type = $4, created_at = $5, updated_at = $6
            WHERE post_id = $1 AND user_id = $2 AND id = $3
            RETURNING id, post_id, user_id, reaction_type, created_at, updated_at
            "#,
        )
        .bind(reaction.post_id.into_inner())
        .bind(reaction.user_id.into_inner())
        .bind(reaction.id.into_inner())
        .bind(reaction.reaction_type.as_str())
        .bind(reaction.created_at)
        .bind(reaction.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(Reaction::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn delete(&self, post_id: Snowflake, user_id: Snowflake) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM reactions WHERE post_id = $1 AND user_id = $2
            "#,
        )
        .bind(post_id.into_inner())
        .bind(user_id.into_inner())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn find_by_post(
        &self,
        post_id: Snowflake,
        query: TimelineQuery,
    ) -> RepoResult<Vec<Reaction>> {
        let limit = query.clamped_limit();

        // Served by idx_post_reactions_timeline (post_id, created_at DESC, id DESC)
        let rows = match query.after {
            Some(cursor) => {
                sqlx::query_as::<_, ReactionModel>(
                    r#"
                    SELECT id, post_id, user_id, reaction_type, created_at, updated_at
                    FROM reactions
                    WHERE post_id = $1 AND (created_at, id) < ($2, $3)
                    ORDER BY created_at DESC, id DESC
                    LIMIT $4
                    "#,
                )
                .bind(post_id.into_inner())
                .bind(cursor.created_at)
                .bind(cursor.id.into_inner())
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, ReactionModel>(
                    r#"
                    SELECT id, post_id, user_id, reaction_type, created_at, updated_at
                    FROM reactions
                    WHERE post_id = $1
                    ORDER BY created_at DESC, id DESC
                    LIMIT $2
                    "#,
                )
                .bind(post_id.into_inner())
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(map_db_error)?;

        into_entities(rows)
    }

    #[instrument(skip(self))]
    async fn find_by_user(
        &self,
        user_id: Snowflake,
        query: TimelineQuery,
    ) -> RepoResult<Vec<Reaction>> {
        let limit = query.clamped_limit();

        // Served by idx_user_reactions_timeline (user_id, created_at DESC, id DESC)
        let rows = match query.after {
            Some(cursor) => {
                sqlx::query_as::<_, ReactionModel>(
                    r#"
                    SELECT id, post_id, user_id, reaction_type, created_at, updated_at
                    FROM reactions
                    WHERE user_id = $1 AND (created_at, id) < ($2, $3)
                    ORDER BY created_at DESC, id DESC
                    LIMIT $4
                    "#,
                )
                .bind(user_id.into_inner())
                .bind(cursor.created_at)
                .bind(cursor.id.into_inner())
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, ReactionModel>(
                    r#"
                    SELECT id, post_id, user_id, reaction_type, created_at, updated_at
                    FROM reactions
                    WHERE user_id = $1
                    ORDER BY created_at DESC, id DESC
                    LIMIT $2
                    "#,
                )
                .bind(user_id.into_inner())
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(map_db_error)?;

        into_entities(rows)
    }

    #[instrument(skip(self))]
    async fn find_by_type(
        &self,
        post_id: Snowflake,
        reaction_type: &ReactionType,
        limit: i64,
    ) -> RepoResult<Vec<Reaction>> {
        // Served by idx_post_reaction_type (post_id, reaction_type)
        let rows = sqlx::query_as::<_, ReactionModel>(
            r#"
            SELECT id, post_id, user_id, reaction_type, created_at, updated_at
            FROM reactions
            WHERE post_id = $1 AND reaction_type = $2
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            "#,
        )
        .bind(post_id.into_inner())
        .bind(reaction_type.as_str())
        .bind(clamp_limit(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        into_entities(rows)
    }

    #[instrument(skip(self))]
    async fn count_by_type(&self, post_id: Snowflake) -> RepoResult<Vec<(ReactionType, i64)>> {
        // One statement, one MVCC snapshot: counts never mix pre- and post-write state.
        let rows = sqlx::query_as::<_, ReactionCountModel>(
            r#"
            SELECT reaction_type, COUNT(*) AS count
            FROM reactions
            WHERE post_id = $1
            GROUP BY reaction_type
            ORDER BY reaction_type
            "#,
        )
        .bind(post_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        count_rows(rows)
    }

    #[instrument(skip(self, post_ids), fields(posts = post_ids.len()))]
    async fn delete_by_posts(&self, post_ids: &[Snowflake]) -> RepoResult<u64> {
        if post_ids.is_empty() {
            return Ok(0);
        }

        let ids: Vec<i64> = post_ids.iter().map(|id| id.into_inner()).collect();
        let result = sqlx::query(
            r#"
            DELETE FROM reactions WHERE post_id = ANY($1)
            "#,
        )
        .bind(&ids)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }

    async fn ensure_indexes(&self) -> RepoResult<()> {
        ensure_schema(&self.pool).await
    }
}
