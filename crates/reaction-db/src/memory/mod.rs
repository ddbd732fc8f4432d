//! In-process backing engine
//!
//! Realizes the declared indexes as explicit concurrent structures. Useful
//! wherever a PostgreSQL instance is not available, and as the reference for
//! what each index is responsible for.

mod index_set;
mod repository;

pub use index_set::IndexSet;
pub use repository::MemoryReactionRepository;
