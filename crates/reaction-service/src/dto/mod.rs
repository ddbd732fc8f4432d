//! Data transfer objects for the external API layer
//!
//! This module provides:
//! - Request DTOs with validation for API inputs
//! - Response DTOs for serializing API outputs
//! - Mappers for converting domain values to DTOs

pub mod mappers;
pub mod requests;
pub mod responses;

pub use requests::{RemoveAllForPostsRequest, TimelineParams, UpsertReactionRequest};
pub use responses::{PaginatedResponse, PaginationMeta, ReactionCountsResponse, ReactionResponse};
