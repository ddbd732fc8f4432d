//! Domain entities

mod reaction;

pub use reaction::{Reaction, ReactionKey, ReactionSummary};
