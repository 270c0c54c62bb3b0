//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub events: EventsConfig,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Credential verification configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Clock skew tolerated when checking `exp`, in seconds
    #[serde(default = "default_leeway")]
    pub leeway_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: String,
    pub file_prefix: String,
    #[serde(default)]
    pub json: bool,
}

/// Search defaults and limits
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

/// Event lifecycle settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EventsConfig {
    /// How often the worker marks past events as finished
    pub finish_sweep_interval_seconds: u64,
    pub finish_sweep_enabled: bool,
}

fn default_leeway() -> u64 {
    30
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            finish_sweep_interval_seconds: 300,
            finish_sweep_enabled: true,
        }
    }
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        Self::load(config::File::with_name("config").required(false))
    }

    /// Load settings from an explicit file, still honouring the environment
    pub fn from_file(path: &Path) -> Result<Self, config::ConfigError> {
        Self::load(config::File::from(path))
    }

    fn load<S>(file: S) -> Result<Self, config::ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let defaults = Settings::default();
        let settings = config::Config::builder()
            .set_default("database.url", defaults.database.url)?
            .set_default("database.max_connections", i64::from(defaults.database.max_connections))?
            .set_default("database.min_connections", i64::from(defaults.database.min_connections))?
            .set_default("auth.jwt_secret", defaults.auth.jwt_secret)?
            .set_default("logging.level", defaults.logging.level)?
            .set_default("logging.directory", defaults.logging.directory)?
            .set_default("logging.file_prefix", defaults.logging.file_prefix)?
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("EVENTHUB")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::EventHubError> {
        super::validation::validate_settings(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "postgresql://localhost/eventhub".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            auth: AuthConfig {
                jwt_secret: String::new(),
                leeway_seconds: default_leeway(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                directory: "logs".to_string(),
                file_prefix: "eventhub.log".to_string(),
                json: false,
            },
            search: SearchConfig::default(),
            events: EventsConfig::default(),
        }
    }
}
