//! Value objects - immutable types that represent domain concepts

mod cursor;
mod reaction_type;
mod snowflake;

pub use cursor::TimelineCursor;
pub use reaction_type::ReactionType;
pub use snowflake::{Snowflake, SnowflakeGenerator, SnowflakeParseError};
