//! Test context
//!
//! Wires the services over a fresh [`MemoryStore`] with one admin account and
//! one active category already in place.

use eventhub::database::{MemoryStore, UserStore};
use eventhub::models::{Actor, Category, EventView, Role};
use eventhub::services::ServiceFactory;
use eventhub::Settings;

use super::test_data::*;

pub struct TestContext {
    pub store: MemoryStore,
    pub services: ServiceFactory<MemoryStore>,
    pub settings: Settings,
    pub admin: Actor,
    pub category: Category,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_settings(Settings::default()).await
    }

    pub async fn with_settings(settings: Settings) -> Self {
        let store = MemoryStore::new();
        let services = ServiceFactory::new(store.clone(), settings.clone());

        let admin_row = user_row(Role::Admin);
        store
            .insert_user(&admin_row)
            .await
            .expect("Failed to seed admin");
        let admin = Actor::admin(admin_row.id);

        let category = services
            .category_service
            .create(&admin, new_category())
            .await
            .expect("Failed to create category");

        Self {
            store,
            services,
            settings,
            admin,
            category,
        }
    }

    /// Register a regular account and return it as an authenticated caller
    pub async fn register_user(&self) -> Actor {
        let user = self
            .services
            .user_service
            .register(new_user())
            .await
            .expect("Failed to register user");
        Actor::new(user.id, user.role)
    }

    /// An event created by the admin, so already approved and open
    pub async fn approved_event(&self, capacity: i32) -> EventView {
        let mut request = event_request(self.category.id);
        request.capacity = capacity;
        self.services
            .event_service
            .create(&self.admin, request)
            .await
            .expect("Failed to create approved event")
    }

    /// An event created by `organizer`, awaiting review
    pub async fn pending_event(&self, organizer: &Actor) -> EventView {
        self.services
            .event_service
            .create(organizer, event_request(self.category.id))
            .await
            .expect("Failed to create pending event")
    }
}
