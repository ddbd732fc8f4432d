//! Reaction type - the sentiment tag a user attaches to a post

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// A normalized reaction tag such as `like` or `love`
///
/// The store treats the tag as an opaque, totally ordered value for grouping.
/// Whether a tag is *allowed* is a store setting; this type only guarantees the
/// tag is well formed: trimmed, lowercased, 1-32 characters, and made of ASCII
/// alphanumerics, `_`, `-`, or non-ASCII symbols such as emoji.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReactionType(String);

impl ReactionType {
    pub const LIKE: &'static str = "like";
    pub const LOVE: &'static str = "love";
    pub const HAHA: &'static str = "haha";
    pub const WOW: &'static str = "wow";
    pub const SAD: &'static str = "sad";
    pub const ANGRY: &'static str = "angry";

    /// Built-in tags, used as the default closed catalog
    pub const PREDEFINED: [&'static str; 6] = [
        Self::LIKE,
        Self::LOVE,
        Self::HAHA,
        Self::WOW,
        Self::SAD,
        Self::ANGRY,
    ];

    /// Maximum length in characters
    pub const MAX_LEN: usize = 32;

    /// Normalize and validate a raw tag
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let normalized = raw.trim().to_lowercase();

        if normalized.is_empty() {
            return Err(DomainError::InvalidReactionType(
                "reaction type cannot be empty".to_string(),
            ));
        }
        if normalized.chars().count() > Self::MAX_LEN {
            return Err(DomainError::InvalidReactionType(format!(
                "reaction type must be at most {} characters",
                Self::MAX_LEN
            )));
        }
        if let Some(bad) = normalized.chars().find(|c| !Self::is_allowed_char(*c)) {
            return Err(DomainError::InvalidReactionType(format!(
                "reaction type contains invalid character {bad:?}"
            )));
        }

        Ok(Self(normalized))
    }

    #[inline]
    fn is_allowed_char(c: char) -> bool {
        if c.is_ascii() {
            c.is_ascii_alphanumeric() || c == '_' || c == '-'
        } else {
            !c.is_control() && !c.is_whitespace()
        }
    }

    pub fn like() -> Self {
        Self(Self::LIKE.to_string())
    }

    pub fn love() -> Self {
        Self(Self::LOVE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether this is one of the predefined tags
    pub fn is_predefined(&self) -> bool {
        Self::PREDEFINED.contains(&self.0.as_str())
    }
}

impl fmt::Display for ReactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ReactionType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ReactionType {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ReactionType> for String {
    fn from(value: ReactionType) -> Self {
        value.0
    }
}

impl std::str::FromStr for ReactionType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
