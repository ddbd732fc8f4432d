//! Error handling utilities for repositories

use reaction_core::schema::IDX_UNIQUE_POST_USER;
use reaction_core::{DomainError, ReactionKey};
use sqlx::Error as SqlxError;

/// Convert SQLx error to DomainError
///
/// Failures to reach the engine at all (pool exhausted or closed, socket or
/// TLS errors) are reported as `StoreUnavailable`; everything else is a
/// `DatabaseError`.
pub fn map_db_error(e: SqlxError) -> DomainError {
    match e {
        SqlxError::PoolTimedOut
        | SqlxError::PoolClosed
        | SqlxError::WorkerCrashed
        | SqlxError::Io(_)
        | SqlxError::Tls(_) => DomainError::StoreUnavailable(e.to_string()),
        other => DomainError::DatabaseError(other.to_string()),
    }
}

/// Check for unique violation on the given constraint and return the
/// appropriate error, or fall back to `map_db_error`
pub fn map_unique_violation<F>(e: SqlxError, constraint: &str, on_unique: F) -> DomainError
where
    F: FnOnce() -> DomainError,
{
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() && db_err.constraint() == Some(constraint) {
            return on_unique();
        }
    }
    map_db_error(e)
}

/// A duplicate identity key on insert
pub fn duplicate_reaction(e: SqlxError, key: ReactionKey) -> DomainError {
    map_unique_violation(e, IDX_UNIQUE_POST_USER.name, || {
        DomainError::DuplicateReaction(key)
    })
}
