//! Domain to DTO mappers
//!
//! Implements `From` conversions from domain values to response DTOs.

use reaction_core::{Reaction, ReactionSummary, Snowflake};

use super::responses::{PaginatedResponse, ReactionCountsResponse, ReactionResponse};
use crate::services::TimelinePage;

impl From<&Reaction> for ReactionResponse {
    fn from(reaction: &Reaction) -> Self {
        Self {
            id: reaction.id.to_string(),
            post_id: reaction.post_id.to_string(),
            user_id: reaction.user_id.to_string(),
            reaction_type: reaction.reaction_type.to_string(),
            created_at: reaction.created_at,
            updated_at: reaction.updated_at,
        }
    }
}

impl From<Reaction> for ReactionResponse {
    fn from(reaction: Reaction) -> Self {
        Self::from(&reaction)
    }
}

impl From<TimelinePage> for PaginatedResponse<ReactionResponse> {
    fn from(page: TimelinePage) -> Self {
        Self::new(
            page.items.iter().map(ReactionResponse::from).collect(),
            page.next_cursor.map(|cursor| cursor.encode()),
        )
    }
}

impl ReactionCountsResponse {
    pub fn new(post_id: Snowflake, summary: &ReactionSummary) -> Self {
        Self {
            post_id: post_id.to_string(),
            total: summary.total,
            counts: summary
                .counts
                .iter()
                .map(|(reaction_type, count)| (reaction_type.to_string(), *count))
                .collect(),
        }
    }
}
