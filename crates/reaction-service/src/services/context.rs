//! Store context - dependency container for services
//!
//! Holds the backing engine, the store settings and the ID generator.

use std::sync::Arc;

use tracing::info;

use reaction_common::AppConfig;
use reaction_core::traits::ReactionRepository;
use reaction_core::{Snowflake, SnowflakeGenerator};
use reaction_db::repositories::map_db_error;
use reaction_db::{create_pool, DatabaseConfig, MemoryReactionRepository, PgReactionRepository};

use super::error::{ServiceError, ServiceResult};
use crate::settings::StoreSettings;

/// Store context containing all dependencies
///
/// Cheap to clone; clones share the backing engine and the ID generator.
#[derive(Clone)]
pub struct StoreContext {
    reaction_repo: Arc<dyn ReactionRepository>,
    settings: Arc<StoreSettings>,
    snowflake_generator: Arc<SnowflakeGenerator>,
}

impl StoreContext {
    /// Create a new store context with all dependencies
    pub fn new(
        reaction_repo: Arc<dyn ReactionRepository>,
        settings: StoreSettings,
        snowflake_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            reaction_repo,
            settings: Arc::new(settings),
            snowflake_generator,
        }
    }

    /// Context over a fresh in-process engine
    pub fn in_memory(settings: StoreSettings) -> Self {
        Self::new(
            Arc::new(MemoryReactionRepository::new()),
            settings,
            Arc::new(SnowflakeGenerator::new(0)),
        )
    }

    /// Context over PostgreSQL, built from application configuration.
    /// The collection and its indexes are provisioned before returning.
    pub async fn connect(config: &AppConfig) -> ServiceResult<Self> {
        let settings = StoreSettings::try_from(&config.reactions)?;
        let generator = SnowflakeGenerator::try_new(config.snowflake.worker_id)?;
        let pool = create_pool(&DatabaseConfig::from(&config.database))
            .await
            .map_err(map_db_error)?;

        let repo = PgReactionRepository::new(pool);
        repo.ensure_indexes().await?;

        info!(
            app = %config.app.name,
            worker_id = config.snowflake.worker_id,
            "Reaction store connected"
        );

        StoreContextBuilder::new()
            .reaction_repo(Arc::new(repo))
            .settings(settings)
            .snowflake_generator(Arc::new(generator))
            .build()
    }

    /// Get the reaction repository
    pub fn reaction_repo(&self) -> &dyn ReactionRepository {
        self.reaction_repo.as_ref()
    }

    /// Get the store settings
    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    /// Get the snowflake ID generator
    pub fn snowflake_generator(&self) -> &SnowflakeGenerator {
        self.snowflake_generator.as_ref()
    }

    /// Generate a new Snowflake ID
    pub fn generate_id(&self) -> Snowflake {
        self.snowflake_generator.generate()
    }
}

impl std::fmt::Debug for StoreContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreContext")
            .field("reaction_repo", &"dyn ReactionRepository")
            .field("settings", &self.settings)
            .field("worker_id", &self.snowflake_generator.worker_id())
            .finish()
    }
}

/// Builder for creating StoreContext with custom configuration
#[derive(Default)]
pub struct StoreContextBuilder {
    reaction_repo: Option<Arc<dyn ReactionRepository>>,
    settings: Option<StoreSettings>,
    snowflake_generator: Option<Arc<SnowflakeGenerator>>,
}

impl StoreContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reaction_repo(mut self, repo: Arc<dyn ReactionRepository>) -> Self {
        self.reaction_repo = Some(repo);
        self
    }

    pub fn settings(mut self, settings: StoreSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn snowflake_generator(mut self, generator: Arc<SnowflakeGenerator>) -> Self {
        self.snowflake_generator = Some(generator);
        self
    }

    /// Build the StoreContext
    ///
    /// Settings default to [`StoreSettings::default`] and the generator to
    /// worker 0.
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if the repository is missing
    pub fn build(self) -> ServiceResult<StoreContext> {
        let reaction_repo = self
            .reaction_repo
            .ok_or_else(|| ServiceError::validation("reaction_repo is required"))?;

        Ok(StoreContext::new(
            reaction_repo,
            self.settings.unwrap_or_default(),
            self.snowflake_generator
                .unwrap_or_else(|| Arc::new(SnowflakeGenerator::new(0))),
        ))
    }
}
