//! Error handling for EventHub
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy. Every error maps onto an
//! [`ErrorKind`] so callers can render a stable, structured failure without
//! leaking internals.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Main error type for EventHub operations
#[derive(Error, Debug)]
pub enum EventHubError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Event not found: {event_id}")]
    EventNotFound { event_id: Uuid },

    #[error("Category not found: {category_id}")]
    CategoryNotFound { category_id: Uuid },

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: Uuid },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("{0}")]
    Conflict(ConflictReason),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for EventHub operations
pub type Result<T> = std::result::Result<T, EventHubError>;

/// A request that is well-formed but clashes with the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictReason {
    EventFull,
    AlreadyParticipant,
    NotParticipant,
    NotOpenForParticipation,
    NotPendingApproval,
    AlreadyCanceled,
    EventClosed,
    HasParticipants,
    CapacityBelowParticipants,
    CategoryInactive,
    DuplicateCategoryName,
    DuplicateEmail,
    HasActiveEvents,
    ConcurrentModification,
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ConflictReason::EventFull => "Event is full",
            ConflictReason::AlreadyParticipant => "User is already participating in this event",
            ConflictReason::NotParticipant => "User is not participating in this event",
            ConflictReason::NotOpenForParticipation => "Event is not open for participation",
            ConflictReason::NotPendingApproval => "Event is not pending approval",
            ConflictReason::AlreadyCanceled => "Event is already canceled",
            ConflictReason::EventClosed => "Canceled or finished events cannot be changed",
            ConflictReason::HasParticipants => "Events with participants cannot be deleted",
            ConflictReason::CapacityBelowParticipants => {
                "Capacity cannot be lower than the current number of participants"
            }
            ConflictReason::CategoryInactive => "Category is inactive",
            ConflictReason::DuplicateCategoryName => "A category with this name already exists",
            ConflictReason::DuplicateEmail => "Email is already in use",
            ConflictReason::HasActiveEvents => "User still organizes active events",
            ConflictReason::ConcurrentModification => {
                "Event was modified concurrently, please retry"
            }
        };
        f.write_str(message)
    }
}

/// A single violated field constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every field constraint violated by one request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation for `field`
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Check whether `field` was reported as invalid
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Turn the collected violations into a result
    pub fn into_result(self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(EventHubError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

/// Caller-facing classification of an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Forbidden,
    Unauthorized,
    Conflict,
    Internal,
}

impl ErrorKind {
    /// HTTP-style status code for transports that want one
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Forbidden => 403,
            ErrorKind::Unauthorized => 401,
            ErrorKind::Conflict => 409,
            ErrorKind::Internal => 500,
        }
    }
}

impl EventHubError {
    /// Shorthand for a single-field validation failure
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, message);
        EventHubError::Validation(errors)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EventHubError::Validation(_) => ErrorKind::Validation,
            EventHubError::EventNotFound { .. }
            | EventHubError::CategoryNotFound { .. }
            | EventHubError::UserNotFound { .. } => ErrorKind::NotFound,
            EventHubError::PermissionDenied(_) => ErrorKind::Forbidden,
            EventHubError::Authentication(_) => ErrorKind::Unauthorized,
            EventHubError::Conflict(_) => ErrorKind::Conflict,
            EventHubError::Database(_)
            | EventHubError::Migration(_)
            | EventHubError::Config(_)
            | EventHubError::Serialization(_)
            | EventHubError::Io(_) => ErrorKind::Internal,
        }
    }

    /// Check if the error is recoverable by the caller retrying later
    pub fn is_recoverable(&self) -> bool {
        match self {
            EventHubError::Database(_) => true,
            EventHubError::Io(_) => true,
            EventHubError::Conflict(ConflictReason::ConcurrentModification) => true,
            _ => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EventHubError::Database(_) => ErrorSeverity::Critical,
            EventHubError::Migration(_) => ErrorSeverity::Critical,
            EventHubError::Config(_) => ErrorSeverity::Critical,
            EventHubError::PermissionDenied(_) => ErrorSeverity::Warning,
            EventHubError::Authentication(_) => ErrorSeverity::Warning,
            EventHubError::Validation(_) => ErrorSeverity::Info,
            EventHubError::Conflict(_) => ErrorSeverity::Info,
            EventHubError::EventNotFound { .. }
            | EventHubError::CategoryNotFound { .. }
            | EventHubError::UserNotFound { .. } => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }
}

/// Structured failure handed back to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
}

impl From<&EventHubError> for ErrorResponse {
    fn from(error: &EventHubError) -> Self {
        let kind = error.kind();
        let message = match kind {
            ErrorKind::Internal => "Internal server error".to_string(),
            _ => error.to_string(),
        };
        let fields = match error {
            EventHubError::Validation(errors) => Some(errors.errors().to_vec()),
            _ => None,
        };
        Self {
            kind,
            message,
            fields,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_collect_fields() {
        let mut errors = ValidationErrors::new();
        assert!(errors.is_empty());
        errors.add("title", "too short");
        errors.add("capacity", "must be positive");

        assert!(errors.has_field("title"));
        assert!(errors.has_field("capacity"));
        assert!(!errors.has_field("price"));
        assert_eq!(errors.to_string(), "title: too short; capacity: must be positive");
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn test_kind_and_status_mapping() {
        let conflict = EventHubError::Conflict(ConflictReason::EventFull);
        assert_eq!(conflict.kind(), ErrorKind::Conflict);
        assert_eq!(conflict.kind().status_code(), 409);

        let missing = EventHubError::EventNotFound { event_id: Uuid::nil() };
        assert_eq!(missing.kind().status_code(), 404);

        let denied = EventHubError::PermissionDenied("nope".into());
        assert_eq!(denied.kind(), ErrorKind::Forbidden);

        let unauthenticated = EventHubError::Authentication("no token".into());
        assert_eq!(unauthenticated.kind().status_code(), 401);
    }

    #[test]
    fn test_error_response_masks_internal_errors() {
        let error = EventHubError::Config("secret path /etc/x".into());
        let response = ErrorResponse::from(&error);
        assert_eq!(response.kind, ErrorKind::Internal);
        assert_eq!(response.message, "Internal server error");

        let error = EventHubError::invalid("title", "too short");
        let response = ErrorResponse::from(&error);
        assert_eq!(response.kind, ErrorKind::Validation);
        assert_eq!(response.fields.map(|f| f.len()), Some(1));
    }

    #[test]
    fn test_conflict_message() {
        let error = EventHubError::Conflict(ConflictReason::EventFull);
        assert_eq!(error.to_string(), "Event is full");
        assert!(!error.is_recoverable());
        assert!(EventHubError::Conflict(ConflictReason::ConcurrentModification).is_recoverable());
    }
}
