//! Store settings
//!
//! Pins down the two behaviors a deployment must choose: what an edit does to
//! a record's timeline position, and whether reaction types form a closed set.

use std::collections::BTreeSet;
use std::time::Duration;

use reaction_common::{EditPolicySetting, ReactionSettings};
use reaction_core::{DomainError, ReactionType, TimelineQuery};

/// Effect of changing an existing reaction's type on its `created_at`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditPolicy {
    /// The record keeps its original position in both timelines
    #[default]
    PreserveCreatedAt,
    /// The record is re-stamped and moves to the top of both timelines
    ResetCreatedAt,
}

impl EditPolicy {
    #[inline]
    pub fn resets_created_at(self) -> bool {
        matches!(self, Self::ResetCreatedAt)
    }
}

impl From<EditPolicySetting> for EditPolicy {
    fn from(setting: EditPolicySetting) -> Self {
        match setting {
            EditPolicySetting::Preserve => Self::PreserveCreatedAt,
            EditPolicySetting::Reset => Self::ResetCreatedAt,
        }
    }
}

/// Set of reaction types the store accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactionTypeCatalog {
    /// Only the listed types
    Closed(BTreeSet<ReactionType>),
    /// Any well-formed tag; type groups are discovered as records arrive
    Open,
}

impl Default for ReactionTypeCatalog {
    fn default() -> Self {
        Self::predefined()
    }
}

impl ReactionTypeCatalog {
    /// Closed catalog of the six predefined types
    pub fn predefined() -> Self {
        Self::Closed(
            ReactionType::PREDEFINED
                .iter()
                .filter_map(|raw| ReactionType::parse(raw).ok())
                .collect(),
        )
    }

    /// Closed catalog from raw tags; every tag must be well-formed
    pub fn closed<I, S>(types: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let types = types
            .into_iter()
            .map(|raw| ReactionType::parse(raw.as_ref()))
            .collect::<Result<BTreeSet<_>, _>>()?;
        if types.is_empty() {
            return Err(DomainError::ValidationError(
                "a closed reaction type catalog cannot be empty".to_string(),
            ));
        }
        Ok(Self::Closed(types))
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    pub fn contains(&self, reaction_type: &ReactionType) -> bool {
        match self {
            Self::Closed(types) => types.contains(reaction_type),
            Self::Open => true,
        }
    }

    /// Parse a raw tag and check it against the catalog
    pub fn admit(&self, raw: &str) -> Result<ReactionType, DomainError> {
        let reaction_type = ReactionType::parse(raw)?;
        if self.contains(&reaction_type) {
            Ok(reaction_type)
        } else {
            Err(DomainError::ValidationError(format!(
                "reaction type {reaction_type} is not allowed"
            )))
        }
    }
}

/// Runtime settings of the reaction store
#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub edit_policy: EditPolicy,
    pub type_catalog: ReactionTypeCatalog,
    /// Upsert attempts before a race surfaces as a conflict (at least 1)
    pub max_upsert_attempts: u32,
    /// Base delay between upsert attempts, scaled by attempt number
    pub retry_backoff: Duration,
    pub default_page_size: i64,
    pub max_page_size: i64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            edit_policy: EditPolicy::default(),
            type_catalog: ReactionTypeCatalog::default(),
            max_upsert_attempts: 3,
            retry_backoff: Duration::from_millis(5),
            default_page_size: 50,
            max_page_size: 100,
        }
    }
}

impl StoreSettings {
    pub fn with_edit_policy(mut self, edit_policy: EditPolicy) -> Self {
        self.edit_policy = edit_policy;
        self
    }

    pub fn with_type_catalog(mut self, type_catalog: ReactionTypeCatalog) -> Self {
        self.type_catalog = type_catalog;
        self
    }

    pub fn with_max_upsert_attempts(mut self, attempts: u32) -> Self {
        self.max_upsert_attempts = attempts.max(1);
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Largest page a view serves: `max_page_size`, bounded so a page plus
    /// its look-ahead row fits in one engine fetch
    pub fn page_size_cap(&self) -> i64 {
        self.max_page_size.clamp(1, TimelineQuery::MAX_PAGE_SIZE)
    }

    /// Page size for a view request, clamped into `1..=page_size_cap()`
    pub fn page_size(&self, requested: Option<i64>) -> i64 {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.page_size_cap())
    }
}

impl TryFrom<&ReactionSettings> for StoreSettings {
    type Error = DomainError;

    fn try_from(settings: &ReactionSettings) -> Result<Self, Self::Error> {
        let type_catalog = match &settings.allowed_types {
            Some(types) => ReactionTypeCatalog::closed(types)?,
            None => ReactionTypeCatalog::Open,
        };
        if settings.max_page_size > TimelineQuery::MAX_PAGE_SIZE {
            return Err(DomainError::ValidationError(format!(
                "max page size {} exceeds {}",
                settings.max_page_size,
                TimelineQuery::MAX_PAGE_SIZE
            )));
        }
        let max_page_size = settings.max_page_size.max(1);

        Ok(Self {
            edit_policy: settings.edit_policy.into(),
            type_catalog,
            max_upsert_attempts: settings.max_upsert_attempts.max(1),
            retry_backoff: Duration::from_millis(settings.retry_backoff_ms),
            default_page_size: settings.default_page_size.clamp(1, max_page_size),
            max_page_size,
        })
    }
}
