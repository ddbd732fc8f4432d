//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use reaction_core::TimelineQuery;
use serde::Deserialize;
use std::env;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub database: DatabaseConfig,
    pub reactions: ReactionSettings,
    pub snowflake: SnowflakeConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// What an edit of an existing reaction does to its timeline position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EditPolicySetting {
    /// Keep the original `created_at`
    #[default]
    Preserve,
    /// Stamp `created_at` with the edit time
    Reset,
}

/// Reaction store settings
#[derive(Debug, Clone, Deserialize)]
pub struct ReactionSettings {
    #[serde(default)]
    pub edit_policy: EditPolicySetting,
    /// Allowed reaction types; `None` accepts any well-formed tag
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Option<Vec<String>>,
    #[serde(default = "default_max_upsert_attempts")]
    pub max_upsert_attempts: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default = "default_page_size")]
    pub default_page_size: i64,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: i64,
}

impl Default for ReactionSettings {
    fn default() -> Self {
        Self {
            edit_policy: EditPolicySetting::default(),
            allowed_types: default_allowed_types(),
            max_upsert_attempts: default_max_upsert_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

/// Snowflake ID generator configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SnowflakeConfig {
    #[serde(default)]
    pub worker_id: u16,
}

// Default value functions
fn default_app_name() -> String {
    "reaction-store".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_allowed_types() -> Option<Vec<String>> {
    Some(
        reaction_core::ReactionType::PREDEFINED
            .iter()
            .map(ToString::to_string)
            .collect(),
    )
}

fn default_max_upsert_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    5
}

fn default_page_size() -> i64 {
    50
}

fn default_max_page_size() -> i64 {
    100
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database = DatabaseConfig {
            url: lookup("DATABASE_URL").ok_or(ConfigError::MissingVar("DATABASE_URL"))?,
            max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", default_max_connections)?,
            min_connections: parse_or(&lookup, "DATABASE_MIN_CONNECTIONS", default_min_connections)?,
        };

        let app = AppSettings {
            name: lookup("APP_NAME").unwrap_or_else(default_app_name),
            env: match lookup("APP_ENV").map(|s| s.to_lowercase()).as_deref() {
                None => Environment::default(),
                Some("production") => Environment::Production,
                Some("staging") => Environment::Staging,
                Some("development") => Environment::Development,
                Some(other) => {
                    return Err(ConfigError::InvalidValue("APP_ENV", other.to_string()))
                }
            },
        };

        let reactions = ReactionSettings::from_lookup(&lookup)?;

        let worker_id = parse_or(&lookup, "WORKER_ID", || 0u16)?;
        if worker_id >= 1024 {
            return Err(ConfigError::InvalidValue("WORKER_ID", worker_id.to_string()));
        }

        Ok(Self {
            app,
            database,
            reactions,
            snowflake: SnowflakeConfig { worker_id },
        })
    }
}

impl ReactionSettings {
    fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let edit_policy = match lookup("REACTIONS_EDIT_POLICY").map(|s| s.to_lowercase()).as_deref() {
            None | Some("preserve") => EditPolicySetting::Preserve,
            Some("reset") => EditPolicySetting::Reset,
            Some(other) => {
                return Err(ConfigError::InvalidValue(
                    "REACTIONS_EDIT_POLICY",
                    other.to_string(),
                ))
            }
        };

        let allowed_types = match lookup("REACTIONS_TYPES") {
            None => default_allowed_types(),
            Some(raw) if raw.trim() == "*" => None,
            Some(raw) => {
                let types: Vec<String> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect();
                if types.is_empty() {
                    return Err(ConfigError::InvalidValue("REACTIONS_TYPES", raw));
                }
                Some(types)
            }
        };

        let settings = Self {
            edit_policy,
            allowed_types,
            max_upsert_attempts: parse_or(
                lookup,
                "REACTIONS_MAX_UPSERT_ATTEMPTS",
                default_max_upsert_attempts,
            )?,
            retry_backoff_ms: parse_or(lookup, "REACTIONS_RETRY_BACKOFF_MS", default_retry_backoff_ms)?,
            default_page_size: parse_or(lookup, "REACTIONS_DEFAULT_PAGE_SIZE", default_page_size)?,
            max_page_size: parse_or(lookup, "REACTIONS_MAX_PAGE_SIZE", default_max_page_size)?,
        };

        if settings.max_upsert_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "REACTIONS_MAX_UPSERT_ATTEMPTS",
                "0".to_string(),
            ));
        }
        if settings.max_page_size < 1 || settings.max_page_size > TimelineQuery::MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidValue(
                "REACTIONS_MAX_PAGE_SIZE",
                settings.max_page_size.to_string(),
            ));
        }
        if settings.default_page_size < 1 || settings.default_page_size > settings.max_page_size {
            return Err(ConfigError::InvalidValue(
                "REACTIONS_DEFAULT_PAGE_SIZE",
                settings.default_page_size.to_string(),
            ));
        }

        Ok(settings)
    }
}

/// Parse an optional variable, falling back to a default when unset
fn parse_or<F, T, D>(lookup: &F, key: &'static str, default: D) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    D: FnOnce() -> T,
{
    match lookup(key) {
        None => Ok(default()),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
