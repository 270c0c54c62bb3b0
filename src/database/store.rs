//! Persistent store contract
//!
//! Services talk to storage only through these traits. Every write that has
//! a precondition is expressed as a single conditional operation returning
//! whether it applied, so capacity and membership checks cannot race.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::category::{Category, CategoryDeletion};
use crate::models::event::Event;
use crate::models::user::{Role, User};
use crate::search::EventQuery;
use crate::utils::errors::Result;

pub trait EventStore: Send + Sync {
    fn insert_event(&self, event: &Event) -> impl Future<Output = Result<()>> + Send;

    fn find_event(&self, id: Uuid) -> impl Future<Output = Result<Option<Event>>> + Send;

    /// Compare-and-set on `version`: writes every field except the roster and
    /// bumps the version. Returns `false` when the stored version moved on or
    /// the roster no longer fits the new capacity.
    fn update_event(
        &self,
        event: &Event,
        expected_version: i64,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Append `user_id` if the event is open, has room and does not list them yet
    fn add_participant(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Remove `user_id` if listed
    fn remove_participant(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Delete the event only while its roster is empty
    fn delete_event_if_empty(&self, id: Uuid) -> impl Future<Output = Result<bool>> + Send;

    /// Matching events for the requested page, plus the total match count
    fn search_events(
        &self,
        query: &EventQuery,
    ) -> impl Future<Output = Result<(Vec<Event>, u64)>> + Send;

    /// Events awaiting review, newest first
    fn pending_events(&self) -> impl Future<Output = Result<Vec<Event>>> + Send;

    fn events_in_category(
        &self,
        category_id: Uuid,
    ) -> impl Future<Output = Result<Vec<Event>>> + Send;

    fn events_organized_by(&self, user_id: Uuid)
        -> impl Future<Output = Result<Vec<Event>>> + Send;

    fn events_participated_by(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Vec<Event>>> + Send;

    /// Mark active events that ended before `now` as finished
    fn finish_past_events(&self, now: DateTime<Utc>) -> impl Future<Output = Result<u64>> + Send;
}

pub trait CategoryStore: Send + Sync {
    /// Fails with a duplicate-name conflict when the name is taken
    fn insert_category(&self, category: &Category) -> impl Future<Output = Result<()>> + Send;

    fn find_category(&self, id: Uuid) -> impl Future<Output = Result<Option<Category>>> + Send;

    fn find_category_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Category>>> + Send;

    /// Categories sorted by name
    fn list_categories(
        &self,
        include_inactive: bool,
    ) -> impl Future<Output = Result<Vec<Category>>> + Send;

    fn update_category(&self, category: &Category) -> impl Future<Output = Result<()>> + Send;

    /// Hard-delete an unreferenced category, or deactivate a referenced one.
    /// Runs atomically.
    fn delete_or_deactivate_category(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<CategoryDeletion>> + Send;
}

pub trait UserStore: Send + Sync {
    /// Fails with a duplicate-email conflict when the email is taken
    fn insert_user(&self, user: &User) -> impl Future<Output = Result<()>> + Send;

    fn find_user(&self, id: Uuid) -> impl Future<Output = Result<Option<User>>> + Send;

    fn find_user_by_email(&self, email: &str) -> impl Future<Output = Result<Option<User>>> + Send;

    /// Users matching the role and name/email substring, newest first
    fn list_users(
        &self,
        role: Option<Role>,
        search: Option<&str>,
        offset: u64,
        limit: u32,
    ) -> impl Future<Output = Result<(Vec<User>, u64)>> + Send;

    fn update_user(&self, user: &User) -> impl Future<Output = Result<()>> + Send;

    fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> impl Future<Output = Result<bool>> + Send;

    /// Delete a user who organizes no active event, pulling them from every
    /// roster first. Runs atomically. Returns `false` when the user is unknown.
    fn delete_user_if_idle(&self, id: Uuid) -> impl Future<Output = Result<bool>> + Send;
}

/// Everything a service needs from storage
pub trait Store: EventStore + CategoryStore + UserStore + Clone + 'static {}

impl<T> Store for T where T: EventStore + CategoryStore + UserStore + Clone + 'static {}
