//! Entity to model mappers
//!
//! - `TryFrom<Model> for Entity`: convert database rows to domain objects
//! - `*Insert` structs: prepare entity data for binding

mod reaction;

pub use reaction::{count_rows, ReactionInsert};
