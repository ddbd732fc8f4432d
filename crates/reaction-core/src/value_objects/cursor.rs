//! Opaque timeline cursor
//!
//! Timelines are ordered by `(created_at DESC, id DESC)`. A cursor is the
//! position of the last record on a page; the next page holds every record
//! strictly older than it. Encoded as URL-safe base64 of `"<micros>:<id>"`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::fmt;

use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Keyset position inside a reverse-chronological timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimelineCursor {
    pub created_at: DateTime<Utc>,
    pub id: Snowflake,
}

impl TimelineCursor {
    pub fn new(created_at: DateTime<Utc>, id: Snowflake) -> Self {
        Self { created_at, id }
    }

    /// True if a record at `(created_at, id)` belongs after this cursor,
    /// i.e. it sorts strictly later in a newest-first timeline.
    #[inline]
    pub fn is_before(&self, created_at: DateTime<Utc>, id: Snowflake) -> bool {
        (created_at, id) < (self.created_at, self.id)
    }

    /// Encode into the opaque string handed to callers
    pub fn encode(&self) -> String {
        let raw = format!("{}:{}", self.created_at.timestamp_micros(), self.id);
        URL_SAFE_NO_PAD.encode(raw)
    }

    /// Decode a string produced by [`TimelineCursor::encode`]
    pub fn decode(token: &str) -> Result<Self, DomainError> {
        let invalid = || DomainError::InvalidCursor(token.to_string());

        let bytes = URL_SAFE_NO_PAD.decode(token.trim()).map_err(|_| invalid())?;
        let raw = std::str::from_utf8(&bytes).map_err(|_| invalid())?;
        let (micros, id) = raw.split_once(':').ok_or_else(invalid)?;

        let micros: i64 = micros.parse().map_err(|_| invalid())?;
        let id = Snowflake::parse(id).map_err(|_| invalid())?;
        let created_at = DateTime::from_timestamp_micros(micros).ok_or_else(invalid)?;

        Ok(Self { created_at, id })
    }
}

impl Ord for TimelineCursor {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.created_at, self.id).cmp(&(other.created_at, other.id))
    }
}

impl PartialOrd for TimelineCursor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TimelineCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl std::str::FromStr for TimelineCursor {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}
