//! Reaction entity <-> model mapper

use chrono::{DateTime, Utc};

use reaction_core::{DomainError, Reaction, ReactionType, Snowflake};

use crate::models::{ReactionCountModel, ReactionModel};

/// Rows are trusted to hold well-formed types; one that does not is reported
/// as a database error rather than silently skipped.
impl TryFrom<ReactionModel> for Reaction {
    type Error = DomainError;

    fn try_from(model: ReactionModel) -> Result<Self, Self::Error> {
        let reaction_type = ReactionType::parse(&model.reaction_type).map_err(|_| {
            DomainError::DatabaseError(format!(
                "reaction {} has malformed type {:?}",
                model.id, model.reaction_type
            ))
        })?;

        Ok(Reaction {
            id: Snowflake::new(model.id),
            post_id: Snowflake::new(model.post_id),
            user_id: Snowflake::new(model.user_id),
            reaction_type,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

/// Convert grouped count rows into domain pairs
pub fn count_rows(rows: Vec<ReactionCountModel>) -> Result<Vec<(ReactionType, i64)>, DomainError> {
    rows.into_iter()
        .map(|row| {
            ReactionType::parse(&row.reaction_type)
                .map(|reaction_type| (reaction_type, row.count))
                .map_err(|_| {
                    DomainError::DatabaseError(format!(
                        "malformed reaction type {:?} in counts",
                        row.reaction_type
                    ))
                })
        })
        .collect()
}

/// Bind values of a reaction for insertion
pub struct ReactionInsert<'a> {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub reaction_type: &'a str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> ReactionInsert<'a> {
    pub fn new(reaction: &'a Reaction) -> Self {
        Self {
            id: reaction.id.into_inner(),
            post_id: reaction.post_id.into_inner(),
            user_id: reaction.user_id.into_inner(),
            reaction_type: reaction.reaction_type.as_str(),
            created_at: reaction.created_at,
            updated_at: reaction.updated_at,
        }
    }
}
