//! In-process store
//!
//! Keeps every record behind one `RwLock`; each conditional write runs under
//! the write guard, which makes it atomic with respect to all other writes.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::store::{CategoryStore, EventStore, UserStore};
use crate::models::category::{Category, CategoryDeletion};
use crate::models::event::{ApprovalStatus, Event, EventStatus};
use crate::models::user::{Role, User};
use crate::search::EventQuery;
use crate::utils::errors::{ConflictReason, EventHubError, Result};

#[derive(Debug, Default)]
struct State {
    events: HashMap<Uuid, Event>,
    categories: HashMap<Uuid, Category>,
    users: HashMap<Uuid, User>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn collect_sorted<F>(state: &State, predicate: F) -> Vec<Event>
where
    F: Fn(&Event) -> bool,
{
    let mut events: Vec<Event> = state.events.values().filter(|e| predicate(e)).cloned().collect();
    events.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
    events
}

impl EventStore for MemoryStore {
    async fn insert_event(&self, event: &Event) -> Result<()> {
        let mut state = self.state.write().await;
        state.events.insert(event.id, event.clone());
        Ok(())
    }

    async fn find_event(&self, id: Uuid) -> Result<Option<Event>> {
        Ok(self.state.read().await.events.get(&id).cloned())
    }

    async fn update_event(&self, event: &Event, expected_version: i64) -> Result<bool> {
        let mut state = self.state.write().await;
        let Some(stored) = state.events.get_mut(&event.id) else {
            return Ok(false);
        };
        if stored.version != expected_version
            || stored.participants.len() as i64 > i64::from(event.capacity)
        {
            return Ok(false);
        }

        let participants = std::mem::take(&mut stored.participants);
        *stored = Event {
            participants,
            version: expected_version + 1,
            ..event.clone()
        };
        Ok(true)
    }

    async fn add_participant(&self, event_id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        let Some(event) = state.events.get_mut(&event_id) else {
            return Ok(false);
        };
        if event.join(user_id).is_err() {
            return Ok(false);
        }
        event.version += 1;
        event.updated_at = Utc::now();
        Ok(true)
    }

    async fn remove_participant(&self, event_id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        let Some(event) = state.events.get_mut(&event_id) else {
            return Ok(false);
        };
        if event.leave(user_id).is_err() {
            return Ok(false);
        }
        event.version += 1;
        event.updated_at = Utc::now();
        Ok(true)
    }

    async fn delete_event_if_empty(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.events.get(&id) {
            Some(event) if event.participants.is_empty() => {
                state.events.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn search_events(&self, query: &EventQuery) -> Result<(Vec<Event>, u64)> {
        let state = self.state.read().await;
        let matching: Vec<Event> = state
            .events
            .values()
            .filter(|event| query.matches(event))
            .cloned()
            .collect();
        let total = matching.len() as u64;
        Ok((query.paginate(query.rank(matching)), total))
    }

    async fn pending_events(&self) -> Result<Vec<Event>> {
        let state = self.state.read().await;
        let mut events: Vec<Event> = state
            .events
            .values()
            .filter(|e| e.approval_status == ApprovalStatus::Pending)
            .cloned()
            .collect();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(events)
    }

    async fn events_in_category(&self, category_id: Uuid) -> Result<Vec<Event>> {
        let state = self.state.read().await;
        Ok(collect_sorted(&state, |e| e.category_id == category_id))
    }

    async fn events_organized_by(&self, user_id: Uuid) -> Result<Vec<Event>> {
        let state = self.state.read().await;
        Ok(collect_sorted(&state, |e| e.organizer_id == user_id))
    }

    async fn events_participated_by(&self, user_id: Uuid) -> Result<Vec<Event>> {
        let state = self.state.read().await;
        Ok(collect_sorted(&state, |e| e.has_participant(user_id)))
    }

    async fn finish_past_events(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut state = self.state.write().await;
        let mut finished = 0;
        for event in state.events.values_mut() {
            if event.status == EventStatus::Active && event.ends_at() < now {
                event.status = EventStatus::Finished;
                event.version += 1;
                event.updated_at = now;
                finished += 1;
            }
        }
        Ok(finished)
    }
}

impl CategoryStore for MemoryStore {
    async fn insert_category(&self, category: &Category) -> Result<()> {
        let mut state = self.state.write().await;
        if state.categories.values().any(|c| c.name == category.name) {
            return Err(EventHubError::Conflict(ConflictReason::DuplicateCategoryName));
        }
        state.categories.insert(category.id, category.clone());
        Ok(())
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<Category>> {
        Ok(self.state.read().await.categories.get(&id).cloned())
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        let state = self.state.read().await;
        Ok(state.categories.values().find(|c| c.name == name).cloned())
    }

    async fn list_categories(&self, include_inactive: bool) -> Result<Vec<Category>> {
        let state = self.state.read().await;
        let mut categories: Vec<Category> = state
            .categories
            .values()
            .filter(|c| include_inactive || c.active)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn update_category(&self, category: &Category) -> Result<()> {
        let mut state = self.state.write().await;
        if state
            .categories
            .values()
            .any(|c| c.id != category.id && c.name == category.name)
        {
            return Err(EventHubError::Conflict(ConflictReason::DuplicateCategoryName));
        }
        match state.categories.get_mut(&category.id) {
            Some(stored) => {
                *stored = category.clone();
                Ok(())
            }
            None => Err(EventHubError::CategoryNotFound {
                category_id: category.id,
            }),
        }
    }

    async fn delete_or_deactivate_category(&self, id: Uuid) -> Result<CategoryDeletion> {
        let mut state = self.state.write().await;
        if !state.categories.contains_key(&id) {
            return Err(EventHubError::CategoryNotFound { category_id: id });
        }
        let dependent_events = state.events.values().filter(|e| e.category_id == id).count() as u64;
        if dependent_events > 0 {
            if let Some(category) = state.categories.get_mut(&id) {
                category.active = false;
                category.updated_at = Utc::now();
            }
            Ok(CategoryDeletion::Deactivated { dependent_events })
        } else {
            state.categories.remove(&id);
            Ok(CategoryDeletion::Deleted)
        }
    }
}

impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<()> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.email == user.email) {
            return Err(EventHubError::Conflict(ConflictReason::DuplicateEmail));
        }
        state.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn list_users(
        &self,
        role: Option<Role>,
        search: Option<&str>,
        offset: u64,
        limit: u32,
    ) -> Result<(Vec<User>, u64)> {
        let state = self.state.read().await;
        let needle = search.map(str::to_lowercase);
        let mut users: Vec<User> = state
            .users
            .values()
            .filter(|u| role.map_or(true, |role| u.role == role))
            .filter(|u| {
                needle.as_ref().map_or(true, |n| {
                    u.name.to_lowercase().contains(n) || u.email.contains(n)
                })
            })
            .cloned()
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        let total = users.len() as u64;
        let page = users
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Ok((page, total))
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let mut state = self.state.write().await;
        if state
            .users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(EventHubError::Conflict(ConflictReason::DuplicateEmail));
        }
        match state.users.get_mut(&user.id) {
            Some(stored) => {
                *stored = user.clone();
                Ok(())
            }
            None => Err(EventHubError::UserNotFound { user_id: user.id }),
        }
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool> {
        let mut state = self.state.write().await;
        Ok(match state.users.get_mut(&id) {
            Some(user) => {
                user.last_login = Some(at);
                true
            }
            None => false,
        })
    }

    async fn delete_user_if_idle(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&id) {
            return Ok(false);
        }
        if state
            .events
            .values()
            .any(|e| e.organizer_id == id && e.status == EventStatus::Active)
        {
            return Err(EventHubError::Conflict(ConflictReason::HasActiveEvents));
        }

        let now = Utc::now();
        for event in state.events.values_mut() {
            if event.has_participant(id) {
                event.participants.retain(|p| *p != id);
                event.version += 1;
                event.updated_at = now;
            }
        }
        state.users.remove(&id);
        Ok(true)
    }
}
