//! Index declarations for the reactions collection
//!
//! Four access structures sit over the reaction records. Only the identity
//! index carries a correctness obligation (one record per post and user); the
//! other three exist so that a query shape stays sub-linear in collection size
//! and can always be rebuilt from the records.

/// Name of the backing collection / table
pub const REACTIONS_COLLECTION: &str = "reactions";

/// Key direction of one indexed field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// One field of an index key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexKey {
    pub field: &'static str,
    pub order: SortOrder,
}

const fn asc(field: &'static str) -> IndexKey {
    IndexKey {
        field,
        order: SortOrder::Asc,
    }
}

const fn desc(field: &'static str) -> IndexKey {
    IndexKey {
        field,
        order: SortOrder::Desc,
    }
}

/// Why an index exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexRole {
    /// Enforces the one-reaction-per-user-per-post invariant
    Identity,
    /// Newest-first reactions of a post
    PostTimeline,
    /// Reactions of a post grouped by type
    PostTypeGroups,
    /// Newest-first reactions of a user
    UserTimeline,
}

impl IndexRole {
    /// Only the identity index is a source of truth
    pub fn is_correctness(self) -> bool {
        matches!(self, Self::Identity)
    }
}

/// Declarative description of one index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexDefinition {
    pub name: &'static str,
    pub role: IndexRole,
    pub keys: &'static [IndexKey],
    pub unique: bool,
    /// Trailing key making the order total. Timelines break `created_at` ties
    /// on the record id so pagination is deterministic.
    pub tie_breaker: Option<IndexKey>,
}

impl IndexDefinition {
    /// Key columns including the tie-breaker, e.g. `post_id ASC, created_at DESC, id DESC`
    pub fn column_list(&self) -> String {
        self.keys
            .iter()
            .chain(self.tie_breaker.iter())
            .map(|key| format!("{} {}", key.field, key.order.as_sql()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub const IDX_UNIQUE_POST_USER: IndexDefinition = IndexDefinition {
    name: "idx_unique_post_user_reaction",
    role: IndexRole::Identity,
    keys: &[asc("post_id"), asc("user_id")],
    unique: true,
    tie_breaker: None,
};

pub const IDX_POST_TIMELINE: IndexDefinition = IndexDefinition {
    name: "idx_post_reactions_timeline",
    role: IndexRole::PostTimeline,
    keys: &[asc("post_id"), desc("created_at")],
    unique: false,
    tie_breaker: Some(desc("id")),
};

pub const IDX_POST_TYPE: IndexDefinition = IndexDefinition {
    name: "idx_post_reaction_type",
    role: IndexRole::PostTypeGroups,
    keys: &[asc("post_id"), asc("reaction_type")],
    unique: false,
    tie_breaker: None,
};

pub const IDX_USER_TIMELINE: IndexDefinition = IndexDefinition {
    name: "idx_user_reactions_timeline",
    role: IndexRole::UserTimeline,
    keys: &[asc("user_id"), desc("created_at")],
    unique: false,
    tie_breaker: Some(desc("id")),
};

/// Every index of the reactions collection, identity index first
pub const REACTION_INDEXES: [IndexDefinition; 4] = [
    IDX_UNIQUE_POST_USER,
    IDX_POST_TIMELINE,
    IDX_POST_TYPE,
    IDX_USER_TIMELINE,
];
