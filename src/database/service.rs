//! Database service layer
//!
//! Bundles the PostgreSQL repositories into one [`Store`](super::Store)
//! implementation.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::database::store::{CategoryStore, EventStore, UserStore};
use crate::database::{CategoryRepository, DatabasePool, EventRepository, UserRepository};
use crate::models::category::{Category, CategoryDeletion};
use crate::models::event::Event;
use crate::models::user::{Role, User};
use crate::search::EventQuery;
use crate::utils::errors::Result;

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pub events: EventRepository,
    pub categories: CategoryRepository,
    pub users: UserRepository,
    pool: DatabasePool,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            events: EventRepository::new(pool.clone()),
            categories: CategoryRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }
}

impl EventStore for DatabaseService {
    async fn insert_event(&self, event: &Event) -> Result<()> {
        self.events.insert_event(event).await
    }

    async fn find_event(&self, id: Uuid) -> Result<Option<Event>> {
        self.events.find_event(id).await
    }

    async fn update_event(&self, event: &Event, expected_version: i64) -> Result<bool> {
        self.events.update_event(event, expected_version).await
    }

    async fn add_participant(&self, event_id: Uuid, user_id: Uuid) -> Result<bool> {
        self.events.add_participant(event_id, user_id).await
    }

    async fn remove_participant(&self, event_id: Uuid, user_id: Uuid) -> Result<bool> {
        self.events.remove_participant(event_id, user_id).await
    }

    async fn delete_event_if_empty(&self, id: Uuid) -> Result<bool> {
        self.events.delete_event_if_empty(id).await
    }

    async fn search_events(&self, query: &EventQuery) -> Result<(Vec<Event>, u64)> {
        self.events.search_events(query).await
    }

    async fn pending_events(&self) -> Result<Vec<Event>> {
        self.events.pending_events().await
    }

    async fn events_in_category(&self, category_id: Uuid) -> Result<Vec<Event>> {
        self.events.events_in_category(category_id).await
    }

    async fn events_organized_by(&self, user_id: Uuid) -> Result<Vec<Event>> {
        self.events.events_organized_by(user_id).await
    }

    async fn events_participated_by(&self, user_id: Uuid) -> Result<Vec<Event>> {
        self.events.events_participated_by(user_id).await
    }

    async fn finish_past_events(&self, now: DateTime<Utc>) -> Result<u64> {
        self.events.finish_past_events(now).await
    }
}

impl CategoryStore for DatabaseService {
    async fn insert_category(&self, category: &Category) -> Result<()> {
        self.categories.insert_category(category).await
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<Category>> {
        self.categories.find_category(id).await
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        self.categories.find_category_by_name(name).await
    }

    async fn list_categories(&self, include_inactive: bool) -> Result<Vec<Category>> {
        self.categories.list_categories(include_inactive).await
    }

    async fn update_category(&self, category: &Category) -> Result<()> {
        self.categories.update_category(category).await
    }

    async fn delete_or_deactivate_category(&self, id: Uuid) -> Result<CategoryDeletion> {
        self.categories.delete_or_deactivate_category(id).await
    }
}

impl UserStore for DatabaseService {
    async fn insert_user(&self, user: &User) -> Result<()> {
        self.users.insert_user(user).await
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        self.users.find_user(id).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.users.find_user_by_email(email).await
    }

    async fn list_users(
        &self,
        role: Option<Role>,
        search: Option<&str>,
        offset: u64,
        limit: u32,
    ) -> Result<(Vec<User>, u64)> {
        self.users.list_users(role, search, offset, limit).await
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        self.users.update_user(user).await
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool> {
        self.users.record_login(id, at).await
    }

    async fn delete_user_if_idle(&self, id: Uuid) -> Result<bool> {
        self.users.delete_user_if_idle(id).await
    }
}
