//! Database repositories module
//!
//! This module contains all repository implementations for data access

pub mod category;
pub mod event;
pub mod user;

// Re-export repositories
pub use category::CategoryRepository;
pub use event::EventRepository;
pub use user::UserRepository;

use crate::utils::errors::{ConflictReason, EventHubError};

const UNIQUE_VIOLATION: &str = "23505";

/// Map a unique-index violation onto a conflict, passing other errors through
pub(crate) fn map_unique_violation(error: sqlx::Error, reason: ConflictReason) -> EventHubError {
    match &error {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            EventHubError::Conflict(reason)
        }
        _ => EventHubError::Database(error),
    }
}
