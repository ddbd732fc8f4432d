//! Timeline and aggregate views
//!
//! Pure reads over the store's indexes. Pages are keyset-paginated with an
//! opaque cursor, so a forward pass stays stable while records are added or
//! removed elsewhere in the timeline.

use std::collections::BTreeMap;

use tracing::instrument;
use validator::Validate;

use reaction_core::traits::{RepoResult, TimelineQuery};
use reaction_core::{Reaction, ReactionSummary, ReactionType, Snowflake, TimelineCursor};

use crate::dto::TimelineParams;

use super::context::StoreContext;
use super::error::ServiceResult;
use super::store::validate_id;

/// One page of a newest-first timeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelinePage {
    pub items: Vec<Reaction>,
    /// Position to resume from; `None` once the timeline is exhausted
    pub next_cursor: Option<TimelineCursor>,
}

impl TimelinePage {
    /// Build a page from up to `page_size + 1` fetched rows
    fn from_rows(mut rows: Vec<Reaction>, page_size: usize) -> Self {
        let next_cursor = if rows.len() > page_size {
            rows.truncate(page_size);
            rows.last().map(Reaction::position)
        } else {
            None
        };
        Self {
            items: rows,
            next_cursor,
        }
    }

    pub fn is_last(&self) -> bool {
        self.next_cursor.is_none()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Timeline and aggregate view service
pub struct TimelineService<'a> {
    ctx: &'a StoreContext,
}

impl<'a> TimelineService<'a> {
    /// Create a new TimelineService
    pub fn new(ctx: &'a StoreContext) -> Self {
        Self { ctx }
    }

    /// A post's reactions, newest first
    #[instrument(skip(self))]
    pub async fn post_timeline(
        &self,
        post_id: Snowflake,
        cursor: Option<&str>,
        limit: Option<i64>,
    ) -> ServiceResult<TimelinePage> {
        validate_id(post_id, "post_id")?;
        self.page(cursor, limit, |query| {
            self.ctx.reaction_repo().find_by_post(post_id, query)
        })
        .await
    }

    /// A user's reaction history, newest first
    #[instrument(skip(self))]
    pub async fn user_timeline(
        &self,
        user_id: Snowflake,
        cursor: Option<&str>,
        limit: Option<i64>,
    ) -> ServiceResult<TimelinePage> {
        validate_id(user_id, "user_id")?;
        self.page(cursor, limit, |query| {
            self.ctx.reaction_repo().find_by_user(user_id, query)
        })
        .await
    }

    /// [`TimelineService::post_timeline`] from API query parameters
    pub async fn post_timeline_params(
        &self,
        post_id: Snowflake,
        params: &TimelineParams,
    ) -> ServiceResult<TimelinePage> {
        params.validate()?;
        self.post_timeline(post_id, params.cursor.as_deref(), params.limit)
            .await
    }

    /// [`TimelineService::user_timeline`] from API query parameters
    pub async fn user_timeline_params(
        &self,
        user_id: Snowflake,
        params: &TimelineParams,
    ) -> ServiceResult<TimelinePage> {
        params.validate()?;
        self.user_timeline(user_id, params.cursor.as_deref(), params.limit)
            .await
    }

    /// Per-type counts of a post, taken from one consistent snapshot.
    /// Types with no records are absent.
    #[instrument(skip(self))]
    pub async fn reaction_counts(
        &self,
        post_id: Snowflake,
    ) -> ServiceResult<BTreeMap<ReactionType, u64>> {
        Ok(self.reaction_summary(post_id).await?.counts)
    }

    /// Per-type counts together with their total
    #[instrument(skip(self))]
    pub async fn reaction_summary(&self, post_id: Snowflake) -> ServiceResult<ReactionSummary> {
        validate_id(post_id, "post_id")?;
        let rows = self.ctx.reaction_repo().count_by_type(post_id).await?;
        Ok(ReactionSummary::from_counts(rows))
    }

    /// Newest reactions of one type on a post
    #[instrument(skip(self))]
    pub async fn reactions_by_type(
        &self,
        post_id: Snowflake,
        reaction_type: &str,
        limit: Option<i64>,
    ) -> ServiceResult<Vec<Reaction>> {
        validate_id(post_id, "post_id")?;
        let settings = self.ctx.settings();
        let reaction_type = settings.type_catalog.admit(reaction_type)?;
        let limit = settings.page_size(limit);

        Ok(self
            .ctx
            .reaction_repo()
            .find_by_type(post_id, &reaction_type, limit)
            .await?)
    }

    /// Decode the cursor, fetch one row past the page and split off the
    /// continuation
    async fn page<F, Fut>(
        &self,
        cursor: Option<&str>,
        limit: Option<i64>,
        fetch: F,
    ) -> ServiceResult<TimelinePage>
    where
        F: FnOnce(TimelineQuery) -> Fut,
        Fut: std::future::Future<Output = RepoResult<Vec<Reaction>>>,
    {
        let after = cursor.map(TimelineCursor::decode).transpose()?;
        let page_size = self.ctx.settings().page_size(limit);

        let rows = fetch(TimelineQuery {
            after,
            limit: page_size + 1,
        })
        .await?;

        Ok(TimelinePage::from_rows(
            rows,
            usize::try_from(page_size).unwrap_or(usize::MAX),
        ))
    }
}
