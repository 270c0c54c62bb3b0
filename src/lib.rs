//! EventHub
//!
//! Backend core for an event-listing platform. Users browse and search
//! events, organize events that go through admin review, and join capacity
//! bounded rosters. Admins curate categories, review events and manage users.

pub mod config;
pub mod database;
pub mod middleware;
pub mod models;
pub mod search;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{EventHubError, Result};

// Re-export main components for easy access
pub use database::{DatabaseService, MemoryStore, Store};
pub use middleware::AuthMiddleware;
pub use services::ServiceFactory;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
