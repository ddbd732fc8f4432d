//! Reaction entity - one user's reaction to one post

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::value_objects::{ReactionType, Snowflake, TimelineCursor};

/// Identity key of a reaction record: at most one record exists per pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReactionKey {
    pub post_id: Snowflake,
    pub user_id: Snowflake,
}

impl ReactionKey {
    pub fn new(post_id: Snowflake, user_id: Snowflake) -> Self {
        Self { post_id, user_id }
    }
}

/// Reaction record
///
/// `post_id` and `user_id` form the identity and never change; only
/// `reaction_type`, `created_at` and `updated_at` are rewritten on update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    /// Record identifier, also the timeline tie-breaker
    pub id: Snowflake,
    pub post_id: Snowflake,
    pub user_id: Snowflake,
    pub reaction_type: ReactionType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reaction {
    /// Create a new reaction stamped with the current time
    pub fn new(
        id: Snowflake,
        post_id: Snowflake,
        user_id: Snowflake,
        reaction_type: ReactionType,
    ) -> Self {
        let now = Self::now();
        Self {
            id,
            post_id,
            user_id,
            reaction_type,
            created_at: now,
            updated_at: now,
        }
    }

    /// Current time truncated to microseconds, the precision every backing
    /// engine (and the cursor encoding) can represent exactly
    pub fn now() -> DateTime<Utc> {
        Utc::now().trunc_subsecs(6)
    }

    /// Identity key of this record
    #[inline]
    pub fn key(&self) -> ReactionKey {
        ReactionKey::new(self.post_id, self.user_id)
    }

    /// Position of this record in a newest-first timeline
    #[inline]
    pub fn position(&self) -> TimelineCursor {
        TimelineCursor::new(self.created_at, self.id)
    }

    /// Check if the reaction has a specific type
    #[inline]
    pub fn is_type(&self, reaction_type: &ReactionType) -> bool {
        &self.reaction_type == reaction_type
    }

    /// Copy of this record carrying a new type; identity is preserved.
    /// With `reset_created_at` the record moves to the top of its timelines.
    pub fn retyped(&self, reaction_type: ReactionType, reset_created_at: bool) -> Self {
        let now = Self::now();
        Self {
            id: self.id,
            post_id: self.post_id,
            user_id: self.user_id,
            reaction_type,
            created_at: if reset_created_at { now } else { self.created_at },
            updated_at: now,
        }
    }
}

/// Per-type counts of a post together with their total
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionSummary {
    pub total: u64,
    pub counts: BTreeMap<ReactionType, u64>,
}

impl ReactionSummary {
    /// Build a summary from `(type, count)` rows taken from one snapshot
    pub fn from_counts<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (ReactionType, i64)>,
    {
        let counts: BTreeMap<ReactionType, u64> = rows
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(reaction_type, count)| (reaction_type, count as u64))
            .collect();
        let total = counts.values().sum();
        Self { total, counts }
    }

    /// Count for one type (zero when absent)
    pub fn count(&self, reaction_type: &ReactionType) -> u64 {
        self.counts.get(reaction_type).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}
