//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::entities::ReactionKey;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Reaction not found for post {} and user {}", .0.post_id, .0.user_id)]
    ReactionNotFound(ReactionKey),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid reaction type: {0}")]
    InvalidReactionType(String),

    #[error("Invalid timeline cursor: {0}")]
    InvalidCursor(String),

    // =========================================================================
    // Conflict Errors
    // =========================================================================
    /// The unique identity index rejected an insert. Raised by backing engines;
    /// the store absorbs it by retrying the upsert as a replace.
    #[error("Reaction already exists for post {} and user {}", .0.post_id, .0.user_id)]
    DuplicateReaction(ReactionKey),

    /// Upsert could not settle a race on the identity key within its retry budget
    #[error("Concurrent update conflict on reaction (gave up after {attempts} attempts)")]
    Conflict { attempts: u32 },

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::ReactionNotFound(_) => "UNKNOWN_REACTION",

            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidReactionType(_) => "INVALID_REACTION_TYPE",
            Self::InvalidCursor(_) => "INVALID_CURSOR",

            Self::DuplicateReaction(_) => "REACTION_ALREADY_EXISTS",
            Self::Conflict { .. } => "REACTION_CONFLICT",

            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ReactionNotFound(_))
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_) | Self::InvalidReactionType(_) | Self::InvalidCursor(_)
        )
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::DuplicateReaction(_) | Self::Conflict { .. })
    }

    /// Check if the backing engine could not be reached
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}
