//! User service implementation
//!
//! Registration and profile management, plus the admin-side user operations.
//! Deleting a user is guarded: it is refused while they organize an active
//! event, and otherwise removes them from every roster in the same step.

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use super::require_admin;
use crate::config::SearchConfig;
use crate::database::Store;
use crate::models::event::{Event, EventStatus};
use crate::models::user::{
    Actor, MonthlyCount, NewUser, ProfileUpdate, Role, UpdateUserRequest, User, UserDetail,
    UserQuery, UserStats,
};
use crate::models::Page;
use crate::utils::errors::{ConflictReason, EventHubError, Result, ValidationErrors};
use crate::utils::helpers::{
    calculate_offset, is_valid_email, is_valid_phone, monthly_histogram, non_blank, round2,
};
use crate::utils::logging::log_admin_action;

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 100;
pub const BIO_MAX_CHARS: usize = 500;
const STATS_MONTHS: u32 = 12;

#[derive(Clone)]
pub struct UserService<S: Store> {
    store: S,
    pagination: SearchConfig,
}

impl<S: Store> UserService<S> {
    /// Create a new UserService instance
    pub fn new(store: S, pagination: SearchConfig) -> Self {
        Self { store, pagination }
    }

    /// Register a new account with the `user` role
    pub async fn register(&self, request: NewUser) -> Result<User> {
        let mut errors = ValidationErrors::new();
        check_name(&mut errors, &request.name);
        check_email(&mut errors, &request.email);
        check_phone(&mut errors, request.phone.as_deref());
        check_bio(&mut errors, request.bio.as_deref());
        if request.password_hash.is_empty() {
            errors.add("password", "Password is required");
        }
        errors.into_result()?;

        let email = normalize_email(&request.email);
        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(EventHubError::Conflict(ConflictReason::DuplicateEmail));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            email,
            password_hash: request.password_hash,
            role: Role::User,
            phone: non_blank(request.phone.as_deref()),
            bio: non_blank(request.bio.as_deref()),
            last_login: None,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_user(&user).await?;

        info!(user_id = %user.id, "New user registered successfully");
        Ok(user)
    }

    /// Stamp a successful sign-in
    pub async fn record_login(&self, id: Uuid) -> Result<()> {
        if !self.store.record_login(id, Utc::now()).await? {
            return Err(EventHubError::UserNotFound { user_id: id });
        }
        debug!(user_id = %id, "Login recorded");
        Ok(())
    }

    /// The caller's own record with the events they have joined
    pub async fn profile(&self, actor: &Actor) -> Result<UserDetail> {
        self.detail(actor.id).await
    }

    pub async fn update_profile(&self, actor: &Actor, changes: ProfileUpdate) -> Result<User> {
        let mut errors = ValidationErrors::new();
        if let Some(name) = &changes.name {
            check_name(&mut errors, name);
        }
        check_phone(&mut errors, changes.phone.as_deref());
        check_bio(&mut errors, changes.bio.as_deref());
        errors.into_result()?;

        let mut user = self.load(actor.id).await?;
        if let Some(name) = &changes.name {
            user.name = name.trim().to_string();
        }
        if let Some(phone) = &changes.phone {
            user.phone = non_blank(Some(phone));
        }
        if let Some(bio) = &changes.bio {
            user.bio = non_blank(Some(bio));
        }
        user.updated_at = Utc::now();
        self.store.update_user(&user).await?;

        info!(user_id = %user.id, "User profile updated successfully");
        Ok(user)
    }

    /// Users newest first, filtered by role and name/email substring
    pub async fn list(&self, actor: &Actor, query: UserQuery) -> Result<Page<User>> {
        require_admin(actor, "list users")?;

        let page = query.page.unwrap_or(1);
        if page == 0 {
            return Err(EventHubError::invalid("page", "page must be a positive integer"));
        }
        let limit = query.limit.unwrap_or(self.pagination.default_page_size);
        if limit == 0 || limit > self.pagination.max_page_size {
            return Err(EventHubError::invalid(
                "limit",
                format!("limit must be between 1 and {}", self.pagination.max_page_size),
            ));
        }

        let search = non_blank(query.search.as_deref());
        let (users, total) = self
            .store
            .list_users(query.role, search.as_deref(), calculate_offset(page, limit), limit)
            .await?;

        Ok(Page::new(users, page, limit, total))
    }

    /// A user and the events they take part in
    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<UserDetail> {
        require_admin(actor, "view users")?;
        self.detail(id).await
    }

    pub async fn update(&self, actor: &Actor, id: Uuid, changes: UpdateUserRequest) -> Result<User> {
        require_admin(actor, "update users")?;

        let mut errors = ValidationErrors::new();
        if let Some(name) = &changes.name {
            check_name(&mut errors, name);
        }
        if let Some(email) = &changes.email {
            check_email(&mut errors, email);
        }
        check_phone(&mut errors, changes.phone.as_deref());
        check_bio(&mut errors, changes.bio.as_deref());
        errors.into_result()?;

        let mut user = self.load(id).await?;
        if let Some(email) = &changes.email {
            let email = normalize_email(email);
            if email != user.email {
                if let Some(existing) = self.store.find_user_by_email(&email).await? {
                    if existing.id != id {
                        return Err(EventHubError::Conflict(ConflictReason::DuplicateEmail));
                    }
                }
                user.email = email;
            }
        }
        if let Some(name) = &changes.name {
            user.name = name.trim().to_string();
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        if let Some(phone) = &changes.phone {
            user.phone = non_blank(Some(phone));
        }
        if let Some(bio) = &changes.bio {
            user.bio = non_blank(Some(bio));
        }
        user.updated_at = Utc::now();
        self.store.update_user(&user).await?;

        log_admin_action(actor.id, "update_user", Some(id), None);
        Ok(user)
    }

    /// Delete a user who organizes no active event
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<()> {
        require_admin(actor, "delete users")?;
        if !self.store.delete_user_if_idle(id).await? {
            return Err(EventHubError::UserNotFound { user_id: id });
        }

        info!(user_id = %id, "User deleted");
        log_admin_action(actor.id, "delete_user", Some(id), None);
        Ok(())
    }

    pub async fn stats(&self, actor: &Actor, id: Uuid) -> Result<UserStats> {
        require_admin(actor, "view user statistics")?;
        let user = self.load(id).await?;
        let (organized, participating) = futures::try_join!(
            self.store.events_organized_by(id),
            self.store.events_participated_by(id),
        )?;

        Ok(build_stats(&user, &organized, participating.len() as u64, Utc::now()))
    }

    async fn detail(&self, id: Uuid) -> Result<UserDetail> {
        let user = self.load(id).await?;
        let participating = self
            .store
            .events_participated_by(id)
            .await?
            .iter()
            .map(Event::summary)
            .collect();

        Ok(UserDetail {
            user,
            participating,
        })
    }

    async fn load(&self, id: Uuid) -> Result<User> {
        self.store
            .find_user(id)
            .await?
            .ok_or(EventHubError::UserNotFound { user_id: id })
    }
}

fn build_stats(user: &User, organized: &[Event], participating: u64, now: DateTime<Utc>) -> UserStats {
    let events_organized = organized.len() as u64;
    let count_status =
        |status: EventStatus| organized.iter().filter(|e| e.status == status).count() as u64;
    let total_participants: u64 = organized.iter().map(|e| e.participants_count() as u64).sum();
    let avg_participants_per_event = if events_organized > 0 {
        round2(total_participants as f64 / events_organized as f64)
    } else {
        0.0
    };

    let events_by_month = monthly_histogram(now, STATS_MONTHS, organized.iter().map(|e| e.created_at))
        .into_iter()
        .map(|(date, count)| MonthlyCount { date, count })
        .collect();

    UserStats {
        user: user.summary(),
        events_organized,
        events_participating: participating,
        active_events: count_status(EventStatus::Active),
        canceled_events: count_status(EventStatus::Canceled),
        total_participants,
        avg_participants_per_event,
        events_by_month,
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_name(errors: &mut ValidationErrors, name: &str) {
    let len = name.trim().chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&len) {
        errors.add(
            "name",
            format!(
                "Name must be between {} and {} characters",
                NAME_MIN_CHARS, NAME_MAX_CHARS
            ),
        );
    }
}

fn check_email(errors: &mut ValidationErrors, email: &str) {
    if !is_valid_email(&normalize_email(email)) {
        errors.add("email", "Invalid email address");
    }
}

fn check_phone(errors: &mut ValidationErrors, phone: Option<&str>) {
    if let Some(phone) = non_blank(phone) {
        if !is_valid_phone(&phone) {
            errors.add("phone", "Phone may only contain digits, spaces and +-()");
        }
    }
}

fn check_bio(errors: &mut ValidationErrors, bio: Option<&str>) {
    if let Some(bio) = bio {
        if bio.trim().chars().count() > BIO_MAX_CHARS {
            errors.add("bio", format!("Bio cannot exceed {} characters", BIO_MAX_CHARS));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::{CreateEventRequest, Location};
    use chrono::{Duration, TimeZone};

    fn user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            password_hash: "hash".to_string(),
            role: Role::User,
            phone: None,
            bio: None,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn organized(organizer: &Actor, created_at: DateTime<Utc>, participants: usize) -> Event {
        let request = CreateEventRequest {
            title: "Forró night".to_string(),
            description: "Dancing until late in the evening".to_string(),
            date: created_at + Duration::days(10),
            end_date: None,
            location: Location {
                address: "Av. Ipiranga 1".to_string(),
                city: "Porto Alegre".to_string(),
                state: "RS".to_string(),
                country: "Brasil".to_string(),
            },
            category_id: Uuid::new_v4(),
            capacity: 10,
            price: None,
            tags: Vec::new(),
        };
        let mut event = Event::new(request, organizer, created_at);
        for _ in 0..participants {
            event.join(Uuid::new_v4()).unwrap();
        }
        event
    }

    #[test]
    fn test_build_stats() {
        let now = Utc.with_ymd_and_hms(2030, 6, 15, 12, 0, 0).unwrap();
        let owner = user();
        let admin_actor = Actor::admin(owner.id);
        let mut canceled = organized(&admin_actor, now - Duration::days(40), 0);
        canceled.cancel(now).unwrap();
        let events = vec![
            organized(&admin_actor, now, 2),
            organized(&admin_actor, now - Duration::days(1), 1),
            canceled,
            organized(&admin_actor, now - Duration::days(400), 0),
        ];

        let stats = build_stats(&owner, &events, 5, now);
        assert_eq!(stats.events_organized, 4);
        assert_eq!(stats.events_participating, 5);
        assert_eq!(stats.active_events, 3);
        assert_eq!(stats.canceled_events, 1);
        assert_eq!(stats.total_participants, 3);
        assert_eq!(stats.avg_participants_per_event, 0.75);
        assert_eq!(stats.events_by_month.len(), 12);
        assert_eq!(stats.events_by_month[0].date, "2030-06-01");
        assert_eq!(stats.events_by_month[0].count, 2);
        assert_eq!(stats.events_by_month[1].count, 1);
    }

    #[test]
    fn test_user_field_checks() {
        let mut errors = ValidationErrors::new();
        check_name(&mut errors, "A");
        check_email(&mut errors, "not-an-email");
        check_phone(&mut errors, Some("abc"));
        check_bio(&mut errors, Some(&"x".repeat(501)));
        for field in ["name", "email", "phone", "bio"] {
            assert!(errors.has_field(field));
        }

        let mut errors = ValidationErrors::new();
        check_name(&mut errors, "Al");
        check_email(&mut errors, "  Ana@Example.COM ");
        check_phone(&mut errors, Some(""));
        assert!(errors.is_empty());
    }
}
