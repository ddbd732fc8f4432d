//! Repository traits (ports)
//!
//! The domain layer defines what it needs from a backing engine, and the
//! infrastructure layer provides the implementation.

mod repositories;

pub use repositories::{clamp_limit, ReactionRepository, RepoResult, TimelineQuery};
