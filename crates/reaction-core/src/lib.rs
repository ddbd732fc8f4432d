//! # reaction-core
//!
//! Domain layer for the reaction store: the reaction record, its value objects,
//! the declared index set, and the repository port that backing engines implement.
//! This crate has zero dependencies on infrastructure (database, runtime, etc.).

pub mod entities;
pub mod error;
pub mod schema;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{Reaction, ReactionKey, ReactionSummary};
pub use error::DomainError;
pub use schema::{IndexDefinition, IndexKey, IndexRole, SortOrder, REACTION_INDEXES};
pub use traits::{clamp_limit, ReactionRepository, RepoResult, TimelineQuery};
pub use value_objects::{
    ReactionType, Snowflake, SnowflakeGenerator, SnowflakeParseError, TimelineCursor,
};
