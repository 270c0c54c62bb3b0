//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the EventHub application.

use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use uuid::Uuid;

use crate::config::LoggingConfig;
use crate::utils::errors::{EventHubError, Result};

/// Initialize logging based on configuration.
///
/// Logs go to stdout and to a daily rolling file. The returned guard flushes
/// the file writer and must be held for the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.directory, &config.file_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_new(&config.level)
        .map_err(|e| EventHubError::Config(format!("Invalid log filter: {}", e)))?;

    let (stdout_layer, file_layer) = if config.json {
        (
            tracing_subscriber::fmt::layer().json().with_writer(std::io::stdout).boxed(),
            tracing_subscriber::fmt::layer().json().with_writer(non_blocking).boxed(),
        )
    } else {
        (
            tracing_subscriber::fmt::layer().with_writer(std::io::stdout).boxed(),
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking)
                .boxed(),
        )
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| EventHubError::Config(format!("Logging already initialized: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log event lifecycle actions
pub fn log_event_action(event_id: Uuid, action: &str, user_id: Uuid, details: Option<&str>) {
    info!(
        event_id = %event_id,
        action = action,
        user_id = %user_id,
        details = details,
        "Event action performed"
    );
}

/// Log admin actions
pub fn log_admin_action(admin_id: Uuid, action: &str, target: Option<Uuid>, details: Option<&str>) {
    warn!(
        admin_id = %admin_id,
        action = action,
        target = ?target,
        details = details,
        "Admin action performed"
    );
}

/// Log a failed service operation with its error classification
pub fn log_service_error(operation: &str, error: &EventHubError) {
    match error.kind() {
        crate::utils::errors::ErrorKind::Internal => error!(
            operation = operation,
            severity = %error.severity(),
            error = %error,
            "Service operation failed"
        ),
        kind => debug!(
            operation = operation,
            kind = ?kind,
            error = %error,
            "Service operation rejected"
        ),
    }
}
