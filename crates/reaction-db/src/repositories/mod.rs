//! Repository implementations
//!
//! PostgreSQL implementation of the repository port defined in reaction-core.

mod error;
mod reaction;

pub use error::{duplicate_reaction, map_db_error, map_unique_violation};
pub use reaction::PgReactionRepository;
