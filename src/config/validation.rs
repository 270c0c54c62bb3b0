//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use super::Settings;
use crate::utils::errors::{EventHubError, Result};

const MIN_SECRET_LENGTH: usize = 32;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_database_config(&settings.database)?;
    validate_auth_config(&settings.auth)?;
    validate_logging_config(&settings.logging)?;
    validate_search_config(&settings.search)?;
    validate_events_config(&settings.events)?;

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(EventHubError::Config("Database URL is required".to_string()));
    }

    if config.max_connections == 0 {
        return Err(EventHubError::Config(
            "Max connections must be greater than 0".to_string(),
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(EventHubError::Config(
            "Min connections cannot be greater than max connections".to_string(),
        ));
    }

    Ok(())
}

/// Validate credential verification configuration
fn validate_auth_config(config: &super::AuthConfig) -> Result<()> {
    if config.jwt_secret.len() < MIN_SECRET_LENGTH {
        return Err(EventHubError::Config(format!(
            "JWT secret must be at least {} bytes",
            MIN_SECRET_LENGTH
        )));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(EventHubError::Config("Log level is required".to_string()));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(EventHubError::Config(format!(
            "Invalid log level: {}. Valid levels: {:?}",
            config.level, valid_levels
        )));
    }

    if config.directory.is_empty() || config.file_prefix.is_empty() {
        return Err(EventHubError::Config(
            "Log directory and file prefix are required".to_string(),
        ));
    }

    Ok(())
}

/// Validate search configuration
fn validate_search_config(config: &super::SearchConfig) -> Result<()> {
    if config.default_page_size == 0 {
        return Err(EventHubError::Config(
            "Default page size must be greater than 0".to_string(),
        ));
    }

    if config.default_page_size > config.max_page_size {
        return Err(EventHubError::Config(
            "Default page size cannot exceed max page size".to_string(),
        ));
    }

    Ok(())
}

/// Validate event lifecycle configuration
fn validate_events_config(config: &super::EventsConfig) -> Result<()> {
    if config.finish_sweep_enabled && config.finish_sweep_interval_seconds == 0 {
        return Err(EventHubError::Config(
            "Finish sweep interval must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_settings() -> Settings {
        let mut settings = Settings::default();
        settings.auth.jwt_secret = "0123456789abcdef0123456789abcdef".to_string();
        settings
    }

    #[test]
    fn test_valid_settings_pass() {
        assert!(validate_settings(&valid_settings()).is_ok());
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut settings = valid_settings();
        settings.auth.jwt_secret = "short".to_string();
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut settings = valid_settings();
        settings.logging.level = "loud".to_string();
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_page_size_bounds() {
        let mut settings = valid_settings();
        settings.search.default_page_size = 500;
        assert!(validate_settings(&settings).is_err());

        settings.search.default_page_size = 0;
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_connection_bounds() {
        let mut settings = valid_settings();
        settings.database.min_connections = 20;
        assert!(validate_settings(&settings).is_err());
    }
}
