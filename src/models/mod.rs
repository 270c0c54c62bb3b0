//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod category;
pub mod event;
pub mod user;

// Re-export commonly used models
pub use category::{
    Category, CategoryDeletion, CategoryStats, CategorySummary, NewCategory, UpdateCategoryRequest,
};
pub use event::{
    ApprovalInfo, ApprovalStatus, CreateEventRequest, Event, EventStatus, EventSummary, EventView,
    Location, UpdateEventRequest,
};
pub use user::{
    Actor, MonthlyCount, NewUser, ProfileUpdate, Role, UpdateUserRequest, User, UserDetail,
    UserQuery, UserStats, UserSummary,
};

use serde::Serialize;

/// One page of a paginated listing
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub pages: u32,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: u32, limit: u32, total: u64) -> Self {
        Self {
            items,
            page,
            pages: crate::utils::helpers::page_count(total, limit),
            total,
        }
    }
}
