//! Database configuration types.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// File name used when no database path is configured.
pub const DEFAULT_DATABASE_FILE: &str = "maildb.sqlite";

/// Routing database configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailDbConfig {
    /// Path to the `SQLite` database file.
    pub database_path: PathBuf,
    /// Maximum pooled connections.
    pub max_connections: u32,
    /// Create the database file if it does not exist.
    pub create_if_missing: bool,
}

impl Default for MailDbConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            max_connections: 5,
            create_if_missing: true,
        }
    }
}

impl MailDbConfig {
    /// Creates a configuration for the given database file.
    #[must_use]
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            ..Self::default()
        }
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder() -> MailDbConfigBuilder {
        MailDbConfigBuilder::new()
    }

    /// Parses a configuration from JSON.
    ///
    /// Missing fields take their default values.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the result is invalid.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Checks the configuration for values the pool cannot use.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("database_path is empty".into()));
        }
        if self.max_connections == 0 {
            return Err(Error::Config("max_connections must be at least 1".into()));
        }
        Ok(())
    }

    /// Returns the `sqlx` connection URL for this configuration.
    #[must_use]
    pub fn url(&self) -> String {
        let mode = if self.create_if_missing { "rwc" } else { "rw" };
        format!("sqlite:{}?mode={mode}", self.database_path.display())
    }
}

/// Builder for database configuration.
#[derive(Debug, Clone)]
pub struct MailDbConfigBuilder {
    database_path: Option<PathBuf>,
    max_connections: u32,
    create_if_missing: bool,
}

impl Default for MailDbConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MailDbConfigBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            database_path: None,
            max_connections: 5,
            create_if_missing: true,
        }
    }

    /// Sets the database file path.
    #[must_use]
    pub fn database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Sets the maximum number of pooled connections.
    #[must_use]
    pub const fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets whether a missing database file is created.
    #[must_use]
    pub const fn create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> MailDbConfig {
        MailDbConfig {
            database_path: self.database_path.unwrap_or_else(default_database_path),
            max_connections: self.max_connections,
            create_if_missing: self.create_if_missing,
        }
    }
}

/// Default database location under the platform data directory.
fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailroute")
        .join(DEFAULT_DATABASE_FILE)
}
