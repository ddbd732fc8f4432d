//! # reaction-db
//!
//! Backing engines implementing the `ReactionRepository` port from `reaction-core`.
//!
//! ## Overview
//!
//! - [`PgReactionRepository`]: PostgreSQL via SQLx. The four indexes are real
//!   B-tree indexes built online with `CREATE INDEX CONCURRENTLY`.
//! - [`MemoryReactionRepository`]: an in-process engine whose [`IndexSet`]
//!   realizes the same four indexes as concurrent maps.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use reaction_db::{create_pool, DatabaseConfig, PgReactionRepository};
//! use reaction_core::ReactionRepository;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(&DatabaseConfig::from_env()).await?;
//!     let repo = PgReactionRepository::new(pool);
//!     repo.ensure_indexes().await?;
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod memory;
pub mod models;
pub mod pool;
pub mod repositories;
pub mod schema;

// Re-export commonly used types
pub use memory::{IndexSet, MemoryReactionRepository};
pub use pool::{create_pool, create_pool_from_env, DatabaseConfig, PgPool};
pub use repositories::PgReactionRepository;
