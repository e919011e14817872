//! Configuration loaded from environment variables.

use std::env;

use anyhow::{Context, Result};
use uuid::Uuid;

/// Default number of attempts to claim a version number.
pub const DEFAULT_VERSION_NUMBER_ATTEMPTS: u32 = 3;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL (required by database commands).
    pub database_url: Option<String>,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Site used when a caller does not name one (default: nil UUID).
    pub primary_site_id: Uuid,

    /// Attempts to claim a version number before giving up (default: 3).
    pub version_number_attempts: u32,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL").ok();

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let primary_site_id = match env::var("PRIMARY_SITE_ID") {
            Ok(v) => Uuid::parse_str(v.trim()).context("PRIMARY_SITE_ID must be a UUID")?,
            Err(_) => Uuid::nil(),
        };

        let version_number_attempts: u32 = env::var("VERSION_NUMBER_ATTEMPTS")
            .unwrap_or_else(|_| DEFAULT_VERSION_NUMBER_ATTEMPTS.to_string())
            .parse()
            .context("VERSION_NUMBER_ATTEMPTS must be a valid u32")?;

        Ok(Self {
            database_url,
            database_max_connections,
            primary_site_id,
            version_number_attempts: version_number_attempts.max(1),
        })
    }

    /// The database URL, or an error naming the missing variable.
    pub fn require_database_url(&self) -> Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL environment variable is required")
    }

    /// Settings for the revision service.
    pub fn revision_settings(&self) -> RevisionSettings {
        RevisionSettings {
            primary_site_id: self.primary_site_id,
            version_number_attempts: self.version_number_attempts,
        }
    }
}

/// Settings consumed by the revision service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevisionSettings {
    /// Site used when a caller does not name one.
    pub primary_site_id: Uuid,

    /// Attempts to claim a version number before giving up.
    pub version_number_attempts: u32,
}

impl RevisionSettings {
    pub fn new(primary_site_id: Uuid) -> Self {
        Self {
            primary_site_id,
            version_number_attempts: DEFAULT_VERSION_NUMBER_ATTEMPTS,
        }
    }
}

impl Default for RevisionSettings {
    fn default() -> Self {
        Self::new(Uuid::nil())
    }
}
