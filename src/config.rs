//! Runtime configuration for board creation and persistence.
//!
//! Values come from `KANBAN_*` environment variables layered over defaults
//! for every field, so an empty environment yields a usable in-memory setup.
//! `KANBAN_DEFAULT_COLUMNS` is a comma-separated list.

use ::config::{Config, Environment};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Environment variable holding comma-separated default column titles.
pub const DEFAULT_COLUMNS_VAR: &str = "KANBAN_DEFAULT_COLUMNS";
/// Environment variable holding the `PostgreSQL` connection URL.
pub const DATABASE_URL_VAR: &str = "KANBAN_DATABASE_URL";
/// Environment variable holding the connection pool size.
pub const POOL_SIZE_VAR: &str = "KANBAN_POOL_SIZE";

const ENV_PREFIX: &str = "KANBAN";
const LIST_SEPARATOR: &str = ",";
const DEFAULT_COLUMNS_KEY: &str = "default_columns";
const DEFAULT_POOL_SIZE: u32 = 8;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The environment could not be read into a configuration.
    #[error("failed to load configuration: {message}")]
    Load {
        /// Description reported by the configuration loader.
        message: String,
    },

    /// No default columns were configured.
    #[error("at least one default column is required")]
    NoDefaultColumns,

    /// A default column title is blank.
    #[error("default column {index} has a blank title")]
    BlankColumnTitle {
        /// Zero-based index of the offending title.
        index: usize,
    },

    /// The pool size is not a positive integer.
    #[error("invalid pool size '{value}'")]
    InvalidPoolSize {
        /// Raw value that failed to parse.
        value: String,
    },
}

impl From<::config::ConfigError> for ConfigError {
    fn from(error: ::config::ConfigError) -> Self {
        Self::Load {
            message: error.to_string(),
        }
    }
}

/// Board engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KanbanConfig {
    default_columns: Vec<String>,
    database_url: Option<String>,
    pool_size: u32,
}

impl Default for KanbanConfig {
    fn default() -> Self {
        Self {
            default_columns: ["To Do", "In Progress", "Done"]
                .into_iter()
                .map(String::from)
                .collect(),
            database_url: None,
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

impl KanbanConfig {
    /// Creates a configuration holding the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is malformed or the resulting
    /// configuration fails [`KanbanConfig::validate`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(environment())
    }

    /// Loads configuration from an explicit set of `KANBAN_*` variables
    /// instead of the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is malformed or the resulting
    /// configuration fails [`KanbanConfig::validate`].
    pub fn from_vars<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Result<Self, ConfigError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let source: HashMap<String, String> = vars
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self::load(environment().source(Some(source)))
    }

    fn load(source: Environment) -> Result<Self, ConfigError> {
        let loaded: Self = Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?;
        let config = loaded.normalised();
        config.validate()?;
        Ok(config)
    }

    fn normalised(mut self) -> Self {
        self.default_columns = self
            .default_columns
            .iter()
            .map(|title| title.trim().to_owned())
            .collect();
        self.database_url = self.database_url.filter(|url| !url.trim().is_empty());
        self
    }

    /// Replaces the default column titles.
    #[must_use]
    pub fn with_default_columns<S>(mut self, titles: impl IntoIterator<Item = S>) -> Self
    where
        S: Into<String>,
    {
        self.default_columns = titles.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the database URL.
    #[must_use]
    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    /// Sets the connection pool size.
    #[must_use]
    pub const fn with_pool_size(mut self, pool_size: u32) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Column titles seeded into every new board, in display order.
    #[must_use]
    pub fn default_columns(&self) -> &[String] {
        &self.default_columns
    }

    /// Database URL, when persistence is backed by `PostgreSQL`.
    #[must_use]
    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref()
    }

    /// Maximum number of pooled database connections.
    #[must_use]
    pub const fn pool_size(&self) -> u32 {
        self.pool_size
    }

    /// Checks that the configuration can seed a board.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoDefaultColumns`] for an empty column list,
    /// [`ConfigError::BlankColumnTitle`] for a blank title, and
    /// [`ConfigError::InvalidPoolSize`] for a zero pool size.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_columns.is_empty() {
            return Err(ConfigError::NoDefaultColumns);
        }
        if let Some(index) = self
            .default_columns
            .iter()
            .position(|title| title.trim().is_empty())
        {
            return Err(ConfigError::BlankColumnTitle { index });
        }
        if self.pool_size == 0 {
            return Err(ConfigError::InvalidPoolSize {
                value: self.pool_size.to_string(),
            });
        }
        Ok(())
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .try_parsing(true)
        .list_separator(LIST_SEPARATOR)
        .with_list_parse_key(DEFAULT_COLUMNS_KEY)
}
