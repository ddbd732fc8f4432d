//! Request DTOs for API endpoints
//!
//! All request DTOs implement `Deserialize` and `Validate` for input validation.

use serde::Deserialize;
use validator::Validate;

use reaction_core::Snowflake;

/// Add or change a reaction
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpsertReactionRequest {
    #[validate(length(min = 1, max = 64, message = "Reaction type must be 1-64 characters"))]
    pub reaction_type: String,
}

/// Timeline query parameters
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct TimelineParams {
    /// Opaque cursor from the previous page
    pub cursor: Option<String>,

    /// Page size; clamped to the store's maximum
    #[validate(range(min = 1, message = "Limit must be positive"))]
    pub limit: Option<i64>,
}

/// Bulk removal of every reaction on a set of posts
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RemoveAllForPostsRequest {
    #[validate(length(max = 1000, message = "At most 1000 posts per request"))]
    pub post_ids: Vec<Snowflake>,
}
