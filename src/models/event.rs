//! Event model
//!
//! An event carries two independent state axes: the operational [`EventStatus`]
//! and the admin review outcome [`ApprovalStatus`]. All transitions between
//! them go through the methods on [`Event`], which keep the axes consistent:
//! an event is only ever `active` while `approved`, and pending or rejected
//! events stay `inactive`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::category::CategorySummary;
use crate::models::user::{Actor, UserSummary};
use crate::utils::errors::{ConflictReason, EventHubError, Result, ValidationErrors};

pub const TITLE_MIN_CHARS: usize = 3;
pub const TITLE_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MIN_CHARS: usize = 10;
pub const MAX_TAGS: usize = 10;
pub const TAG_MIN_CHARS: usize = 3;
pub const TAG_MAX_CHARS: usize = 30;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "event_status", rename_all = "lowercase")]
pub enum EventStatus {
    Active,
    Inactive,
    Canceled,
    Finished,
}

impl EventStatus {
    pub const ALL: [EventStatus; 4] = [
        EventStatus::Active,
        EventStatus::Inactive,
        EventStatus::Canceled,
        EventStatus::Finished,
    ];

    /// Canceled and finished events accept no further changes
    pub fn is_terminal(&self) -> bool {
        matches!(self, EventStatus::Canceled | EventStatus::Finished)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Active => "active",
            EventStatus::Inactive => "inactive",
            EventStatus::Canceled => "canceled",
            EventStatus::Finished => "finished",
        }
    }
}

impl std::str::FromStr for EventStatus {
    type Err = EventHubError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "active" => Ok(EventStatus::Active),
            "inactive" => Ok(EventStatus::Inactive),
            "canceled" | "cancelled" => Ok(EventStatus::Canceled),
            "finished" => Ok(EventStatus::Finished),
            other => Err(EventHubError::invalid(
                "status",
                format!("Unknown event status: {}", other),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "approval_status", rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Location {
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
}

impl Location {
    fn trimmed(&self) -> Self {
        Self {
            address: self.address.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            country: self.country.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[sqlx(rename = "event_date")]
    pub date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    #[sqlx(flatten)]
    pub location: Location,
    pub category_id: Uuid,
    pub capacity: i32,
    pub price: f64,
    pub organizer_id: Uuid,
    pub participants: Vec<Uuid>,
    pub tags: Vec<String>,
    pub status: EventStatus,
    pub approval_status: ApprovalStatus,
    pub approved_by: Option<Uuid>,
    pub approval_date: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: Location,
    pub category_id: Uuid,
    pub capacity: i32,
    pub price: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: Option<Location>,
    pub category_id: Option<Uuid>,
    pub capacity: Option<i32>,
    pub price: Option<f64>,
    pub tags: Option<Vec<String>>,
}

impl CreateEventRequest {
    /// Check every field constraint, reporting all violations at once
    pub fn validate(&self, now: DateTime<Utc>) -> Result<()> {
        let mut errors = ValidationErrors::new();
        check_title(&mut errors, &self.title);
        check_description(&mut errors, &self.description);
        check_future_date(&mut errors, self.date, now);
        check_end_date(&mut errors, self.date, self.end_date);
        check_location(&mut errors, &self.location);
        check_capacity(&mut errors, self.capacity);
        if let Some(price) = self.price {
            check_price(&mut errors, price);
        }
        check_tags(&mut errors, &self.tags);
        errors.into_result()
    }
}

impl Event {
    /// Build a new event; admin organizers are approved on the spot
    pub fn new(request: CreateEventRequest, organizer: &Actor, now: DateTime<Utc>) -> Self {
        let mut event = Self {
            id: Uuid::new_v4(),
            title: request.title.trim().to_string(),
            description: request.description.trim().to_string(),
            date: request.date,
            end_date: request.end_date,
            location: request.location.trimmed(),
            category_id: request.category_id,
            capacity: request.capacity,
            price: request.price.unwrap_or(0.0),
            organizer_id: organizer.id,
            participants: Vec::new(),
            tags: normalize_tags(&request.tags),
            status: EventStatus::Inactive,
            approval_status: ApprovalStatus::Pending,
            approved_by: None,
            approval_date: None,
            rejection_reason: None,
            version: 0,
            created_at: now,
            updated_at: now,
        };

        if organizer.is_admin() {
            event.mark_approved(organizer.id, now);
        }

        event
    }

    pub fn participants_count(&self) -> usize {
        self.participants.len()
    }

    pub fn is_fully_booked(&self) -> bool {
        self.participants.len() as i64 >= i64::from(self.capacity)
    }

    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.participants.contains(&user_id)
    }

    /// Open for participation: approved and active
    pub fn is_open(&self) -> bool {
        self.status == EventStatus::Active && self.approval_status == ApprovalStatus::Approved
    }

    pub fn is_organized_by(&self, user_id: Uuid) -> bool {
        self.organizer_id == user_id
    }

    /// Organizer and admins share edit, cancel and delete rights
    pub fn can_be_managed_by(&self, actor: &Actor) -> bool {
        actor.is_admin() || self.is_organized_by(actor.id)
    }

    /// Unapproved events are only shown to admins and their organizer
    pub fn is_visible_to(&self, viewer: Option<&Actor>) -> bool {
        if self.approval_status == ApprovalStatus::Approved {
            return true;
        }
        viewer.map_or(false, |actor| self.can_be_managed_by(actor))
    }

    /// End of the event for finishing purposes
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.end_date.unwrap_or(self.date)
    }

    pub fn ensure_can_join(&self, user_id: Uuid) -> Result<()> {
        if !self.is_open() {
            return Err(EventHubError::Conflict(ConflictReason::NotOpenForParticipation));
        }
        if self.has_participant(user_id) {
            return Err(EventHubError::Conflict(ConflictReason::AlreadyParticipant));
        }
        if self.is_fully_booked() {
            return Err(EventHubError::Conflict(ConflictReason::EventFull));
        }
        Ok(())
    }

    pub fn ensure_can_leave(&self, user_id: Uuid) -> Result<()> {
        if !self.has_participant(user_id) {
            return Err(EventHubError::Conflict(ConflictReason::NotParticipant));
        }
        Ok(())
    }

    pub fn ensure_deletable(&self) -> Result<()> {
        if !self.participants.is_empty() {
            return Err(EventHubError::Conflict(ConflictReason::HasParticipants));
        }
        Ok(())
    }

    pub fn join(&mut self, user_id: Uuid) -> Result<()> {
        self.ensure_can_join(user_id)?;
        self.participants.push(user_id);
        Ok(())
    }

    pub fn leave(&mut self, user_id: Uuid) -> Result<()> {
        self.ensure_can_leave(user_id)?;
        self.participants.retain(|id| *id != user_id);
        Ok(())
    }

    pub fn approve(&mut self, admin_id: Uuid, now: DateTime<Utc>) -> Result<()> {
        self.ensure_pending()?;
        self.mark_approved(admin_id, now);
        Ok(())
    }

    pub fn reject(&mut self, admin_id: Uuid, reason: &str, now: DateTime<Utc>) -> Result<()> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(EventHubError::invalid("reason", "A rejection reason is required"));
        }
        self.ensure_pending()?;
        self.approval_status = ApprovalStatus::Rejected;
        self.status = EventStatus::Inactive;
        self.approved_by = Some(admin_id);
        self.approval_date = Some(now);
        self.rejection_reason = Some(reason.to_string());
        self.updated_at = now;
        Ok(())
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<()> {
        match self.status {
            EventStatus::Canceled => Err(EventHubError::Conflict(ConflictReason::AlreadyCanceled)),
            EventStatus::Finished => Err(EventHubError::Conflict(ConflictReason::EventClosed)),
            _ => {
                self.status = EventStatus::Canceled;
                self.updated_at = now;
                Ok(())
            }
        }
    }

    pub fn finish(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.status.is_terminal() {
            return Err(EventHubError::Conflict(ConflictReason::EventClosed));
        }
        self.status = EventStatus::Finished;
        self.updated_at = now;
        Ok(())
    }

    /// Apply an edit made by `actor`.
    ///
    /// Category existence is checked by the caller beforehand. Organizer edits
    /// send the event back to review; admin edits approve it.
    pub fn apply_update(
        &mut self,
        changes: &UpdateEventRequest,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if self.status.is_terminal() {
            return Err(EventHubError::Conflict(ConflictReason::EventClosed));
        }

        let mut errors = ValidationErrors::new();
        if let Some(title) = &changes.title {
            check_title(&mut errors, title);
        }
        if let Some(description) = &changes.description {
            check_description(&mut errors, description);
        }
        if let Some(date) = changes.date {
            check_future_date(&mut errors, date, now);
        }
        if changes.date.is_some() || changes.end_date.is_some() {
            let start = changes.date.unwrap_or(self.date);
            check_end_date(&mut errors, start, changes.end_date.or(self.end_date));
        }
        if let Some(location) = &changes.location {
            check_location(&mut errors, location);
        }
        if let Some(capacity) = changes.capacity {
            check_capacity(&mut errors, capacity);
        }
        if let Some(price) = changes.price {
            check_price(&mut errors, price);
        }
        if let Some(tags) = &changes.tags {
            check_tags(&mut errors, tags);
        }
        errors.into_result()?;

        if let Some(capacity) = changes.capacity {
            if (self.participants.len() as i64) > i64::from(capacity) {
                return Err(EventHubError::Conflict(ConflictReason::CapacityBelowParticipants));
            }
        }

        if let Some(title) = &changes.title {
            self.title = title.trim().to_string();
        }
        if let Some(description) = &changes.description {
            self.description = description.trim().to_string();
        }
        if let Some(date) = changes.date {
            self.date = date;
        }
        if let Some(end_date) = changes.end_date {
            self.end_date = Some(end_date);
        }
        if let Some(location) = &changes.location {
            self.location = location.trimmed();
        }
        if let Some(category_id) = changes.category_id {
            self.category_id = category_id;
        }
        if let Some(capacity) = changes.capacity {
            self.capacity = capacity;
        }
        if let Some(price) = changes.price {
            self.price = price;
        }
        if let Some(tags) = &changes.tags {
            self.tags = normalize_tags(tags);
        }

        if actor.is_admin() {
            self.mark_approved(actor.id, now);
        } else {
            self.approval_status = ApprovalStatus::Pending;
            self.status = EventStatus::Inactive;
            self.approved_by = None;
            self.approval_date = None;
            self.rejection_reason = None;
        }
        self.updated_at = now;
        Ok(())
    }

    fn ensure_pending(&self) -> Result<()> {
        if self.approval_status != ApprovalStatus::Pending {
            return Err(EventHubError::Conflict(ConflictReason::NotPendingApproval));
        }
        Ok(())
    }

    fn mark_approved(&mut self, approver: Uuid, now: DateTime<Utc>) {
        self.approval_status = ApprovalStatus::Approved;
        self.status = EventStatus::Active;
        self.approved_by = Some(approver);
        self.approval_date = Some(now);
        self.rejection_reason = None;
        self.updated_at = now;
    }

    pub fn summary(&self) -> EventSummary {
        EventSummary {
            id: self.id,
            title: self.title.clone(),
            date: self.date,
            location: self.location.clone(),
            status: self.status,
        }
    }
}

/// Event with its references expanded for display
#[derive(Debug, Clone, Serialize)]
pub struct EventView {
    #[serde(flatten)]
    pub event: Event,
    pub category: Option<CategorySummary>,
    pub organizer: Option<UserSummary>,
    pub participants_count: usize,
    pub is_fully_booked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendees: Option<Vec<UserSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approver: Option<UserSummary>,
}

/// Compact event projection used in user details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSummary {
    pub id: Uuid,
    pub title: String,
    pub date: DateTime<Utc>,
    pub location: Location,
    pub status: EventStatus,
}

/// Review state of an event
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalInfo {
    pub event_id: Uuid,
    pub approval_status: ApprovalStatus,
    pub approved_by: Option<UserSummary>,
    pub approval_date: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}

fn char_len(value: &str) -> usize {
    value.trim().chars().count()
}

fn normalize_tags(tags: &[String]) -> Vec<String> {
    tags.iter().map(|tag| tag.trim().to_string()).collect()
}

fn check_title(errors: &mut ValidationErrors, title: &str) {
    let len = char_len(title);
    if len < TITLE_MIN_CHARS || len > TITLE_MAX_CHARS {
        errors.add(
            "title",
            format!(
                "Title must be between {} and {} characters",
                TITLE_MIN_CHARS, TITLE_MAX_CHARS
            ),
        );
    }
}

fn check_description(errors: &mut ValidationErrors, description: &str) {
    if char_len(description) < DESCRIPTION_MIN_CHARS {
        errors.add(
            "description",
            format!("Description must have at least {} characters", DESCRIPTION_MIN_CHARS),
        );
    }
}

fn check_future_date(errors: &mut ValidationErrors, date: DateTime<Utc>, now: DateTime<Utc>) {
    if date <= now {
        errors.add("date", "Event date must be in the future");
    }
}

fn check_end_date(errors: &mut ValidationErrors, start: DateTime<Utc>, end: Option<DateTime<Utc>>) {
    if let Some(end) = end {
        if end < start {
            errors.add("end_date", "End date cannot be before the start date");
        }
    }
}

fn check_location(errors: &mut ValidationErrors, location: &Location) {
    let parts = [
        ("location.address", &location.address),
        ("location.city", &location.city),
        ("location.state", &location.state),
        ("location.country", &location.country),
    ];
    for (field, value) in parts {
        if value.trim().is_empty() {
            errors.add(field, "This location field is required");
        }
    }
}

fn check_capacity(errors: &mut ValidationErrors, capacity: i32) {
    if capacity < 1 {
        errors.add("capacity", "Capacity must be at least 1");
    }
}

fn check_price(errors: &mut ValidationErrors, price: f64) {
    if !price.is_finite() || price < 0.0 {
        errors.add("price", "Price cannot be negative");
    }
}

fn check_tags(errors: &mut ValidationErrors, tags: &[String]) {
    if tags.len() > MAX_TAGS {
        errors.add("tags", format!("At most {} tags are allowed", MAX_TAGS));
    }
    if tags.iter().any(|tag| {
        let len = char_len(tag);
        len < TAG_MIN_CHARS || len > TAG_MAX_CHARS
    }) {
        errors.add(
            "tags",
            format!(
                "Each tag must be between {} and {} characters",
                TAG_MIN_CHARS, TAG_MAX_CHARS
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Duration;

    fn request(now: DateTime<Utc>) -> CreateEventRequest {
        CreateEventRequest {
            title: "Lindy Hop Social".to_string(),
            description: "An evening of swing dancing with live band".to_string(),
            date: now + Duration::days(7),
            end_date: None,
            location: Location {
                address: "1 Main St".to_string(),
                city: "Porto Alegre".to_string(),
                state: "RS".to_string(),
                country: "Brasil".to_string(),
            },
            category_id: Uuid::new_v4(),
            capacity: 2,
            price: None,
            tags: vec!["dance".to_string()],
        }
    }

    fn approved_event(now: DateTime<Utc>) -> Event {
        Event::new(request(now), &Actor::admin(Uuid::new_v4()), now)
    }

    #[test]
    fn test_user_created_event_is_pending() {
        let now = Utc::now();
        let event = Event::new(request(now), &Actor::user(Uuid::new_v4()), now);
        assert_eq!(event.approval_status, ApprovalStatus::Pending);
        assert_eq!(event.status, EventStatus::Inactive);
        assert_eq!(event.price, 0.0);
        assert!(event.approved_by.is_none());
    }

    #[test]
    fn test_admin_created_event_is_approved() {
        let now = Utc::now();
        let admin = Actor::admin(Uuid::new_v4());
        let event = Event::new(request(now), &admin, now);
        assert_eq!(event.approval_status, ApprovalStatus::Approved);
        assert_eq!(event.status, EventStatus::Active);
        assert_eq!(event.approved_by, Some(admin.id));
        assert_eq!(event.approval_date, Some(now));
    }

    #[test]
    fn test_validation_reports_each_field() {
        let now = Utc::now();
        let mut bad = request(now);
        bad.title = "ab".to_string();
        bad.description = "short".to_string();
        bad.date = now - Duration::hours(1);
        bad.capacity = 0;
        bad.price = Some(-5.0);
        bad.tags = vec!["ok-tag".to_string(), "x".to_string()];
        bad.location.city = "  ".to_string();

        let err = bad.validate(now).unwrap_err();
        let EventHubError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        for field in ["title", "description", "date", "capacity", "price", "tags", "location.city"] {
            assert!(errors.has_field(field), "missing {field}");
        }
        assert!(!errors.has_field("location.address"));
    }

    #[test]
    fn test_title_boundaries() {
        let now = Utc::now();
        let mut req = request(now);
        req.title = "abc".to_string();
        assert!(req.validate(now).is_ok());
        req.title = "a".repeat(100);
        assert!(req.validate(now).is_ok());
        req.title = "a".repeat(101);
        assert!(req.validate(now).is_err());
    }

    #[test]
    fn test_end_date_may_equal_start() {
        let now = Utc::now();
        let mut req = request(now);
        req.end_date = Some(req.date);
        assert!(req.validate(now).is_ok());
        req.end_date = Some(req.date - Duration::minutes(1));
        assert!(req.validate(now).is_err());
    }

    #[test]
    fn test_too_many_tags() {
        let now = Utc::now();
        let mut req = request(now);
        req.tags = (0..11).map(|i| format!("tag{i}")).collect();
        assert!(req.validate(now).is_err());
    }

    #[test]
    fn test_approve_then_reject_conflicts() {
        let now = Utc::now();
        let mut event = Event::new(request(now), &Actor::user(Uuid::new_v4()), now);
        let admin = Uuid::new_v4();

        event.approve(admin, now).unwrap();
        assert_eq!(event.status, EventStatus::Active);
        assert_eq!(event.approved_by, Some(admin));

        assert_matches!(
            event.reject(admin, "late", now),
            Err(EventHubError::Conflict(ConflictReason::NotPendingApproval))
        );
        assert_matches!(
            event.approve(admin, now),
            Err(EventHubError::Conflict(ConflictReason::NotPendingApproval))
        );
    }

    #[test]
    fn test_reject_requires_reason_and_deactivates() {
        let now = Utc::now();
        let mut event = Event::new(request(now), &Actor::user(Uuid::new_v4()), now);
        let admin = Uuid::new_v4();

        assert_matches!(event.reject(admin, "   ", now), Err(EventHubError::Validation(_)));
        event.reject(admin, "Missing details", now).unwrap();
        assert_eq!(event.approval_status, ApprovalStatus::Rejected);
        assert_eq!(event.status, EventStatus::Inactive);
        assert_eq!(event.rejection_reason.as_deref(), Some("Missing details"));
        assert!(event.approve(admin, now).is_err());
    }

    #[test]
    fn test_capacity_bounds_participation() {
        let now = Utc::now();
        let mut event = approved_event(now);
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        event.join(a).unwrap();
        assert_matches!(
            event.join(a),
            Err(EventHubError::Conflict(ConflictReason::AlreadyParticipant))
        );
        event.join(b).unwrap();
        assert!(event.is_fully_booked());
        assert_matches!(event.join(c), Err(EventHubError::Conflict(ConflictReason::EventFull)));

        event.leave(a).unwrap();
        event.join(c).unwrap();
        assert_eq!(event.participants_count(), 2);
        assert_matches!(
            event.leave(a),
            Err(EventHubError::Conflict(ConflictReason::NotParticipant))
        );
    }

    #[test]
    fn test_pending_event_is_closed_for_participation() {
        let now = Utc::now();
        let event = Event::new(request(now), &Actor::user(Uuid::new_v4()), now);
        assert_matches!(
            event.ensure_can_join(Uuid::new_v4()),
            Err(EventHubError::Conflict(ConflictReason::NotOpenForParticipation))
        );
    }

    #[test]
    fn test_cancel_is_terminal() {
        let now = Utc::now();
        let mut event = approved_event(now);
        event.cancel(now).unwrap();
        assert_eq!(event.status, EventStatus::Canceled);
        assert_matches!(
            event.cancel(now),
            Err(EventHubError::Conflict(ConflictReason::AlreadyCanceled))
        );
        assert!(event.join(Uuid::new_v4()).is_err());
        assert_matches!(
            event.apply_update(&UpdateEventRequest::default(), &Actor::admin(Uuid::new_v4()), now),
            Err(EventHubError::Conflict(ConflictReason::EventClosed))
        );
    }

    #[test]
    fn test_finish_rules() {
        let now = Utc::now();
        let mut event = approved_event(now);
        event.finish(now).unwrap();
        assert_eq!(event.status, EventStatus::Finished);
        assert!(event.finish(now).is_err());
        assert_matches!(event.cancel(now), Err(EventHubError::Conflict(ConflictReason::EventClosed)));
    }

    #[test]
    fn test_organizer_edit_resets_review() {
        let now = Utc::now();
        let organizer = Actor::user(Uuid::new_v4());
        let mut event = Event::new(request(now), &organizer, now);
        event.approve(Uuid::new_v4(), now).unwrap();

        let changes = UpdateEventRequest {
            description: Some("A brand new description".to_string()),
            ..Default::default()
        };
        event.apply_update(&changes, &organizer, now).unwrap();
        assert_eq!(event.approval_status, ApprovalStatus::Pending);
        assert_eq!(event.status, EventStatus::Inactive);
        assert!(event.approved_by.is_none());
        assert!(event.approval_date.is_none());
    }

    #[test]
    fn test_admin_edit_approves() {
        let now = Utc::now();
        let mut event = Event::new(request(now), &Actor::user(Uuid::new_v4()), now);
        let admin = Actor::admin(Uuid::new_v4());

        let changes = UpdateEventRequest {
            price: Some(25.0),
            ..Default::default()
        };
        event.apply_update(&changes, &admin, now).unwrap();
        assert_eq!(event.approval_status, ApprovalStatus::Approved);
        assert_eq!(event.status, EventStatus::Active);
        assert_eq!(event.approved_by, Some(admin.id));
        assert_eq!(event.price, 25.0);
    }

    #[test]
    fn test_capacity_cannot_drop_below_roster() {
        let now = Utc::now();
        let mut event = approved_event(now);
        event.join(Uuid::new_v4()).unwrap();
        event.join(Uuid::new_v4()).unwrap();

        let changes = UpdateEventRequest {
            capacity: Some(1),
            ..Default::default()
        };
        assert_matches!(
            event.apply_update(&changes, &Actor::admin(Uuid::new_v4()), now),
            Err(EventHubError::Conflict(ConflictReason::CapacityBelowParticipants))
        );
        assert_eq!(event.capacity, 2);
    }

    #[test]
    fn test_update_checks_end_date_against_new_start() {
        let now = Utc::now();
        let mut req = request(now);
        req.end_date = Some(req.date + Duration::hours(3));
        let organizer = Actor::user(Uuid::new_v4());
        let mut event = Event::new(req, &organizer, now);

        let changes = UpdateEventRequest {
            date: Some(event.date + Duration::days(1)),
            ..Default::default()
        };
        let err = event.apply_update(&changes, &organizer, now).unwrap_err();
        assert_matches!(err, EventHubError::Validation(ref errors) if errors.has_field("end_date"));
    }

    #[test]
    fn test_visibility() {
        let now = Utc::now();
        let organizer = Actor::user(Uuid::new_v4());
        let event = Event::new(request(now), &organizer, now);

        assert!(!event.is_visible_to(None));
        assert!(!event.is_visible_to(Some(&Actor::user(Uuid::new_v4()))));
        assert!(event.is_visible_to(Some(&organizer)));
        assert!(event.is_visible_to(Some(&Actor::admin(Uuid::new_v4()))));
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("Active".parse::<EventStatus>().unwrap(), EventStatus::Active);
        assert_eq!("cancelled".parse::<EventStatus>().unwrap(), EventStatus::Canceled);
        assert!("ativo".parse::<EventStatus>().is_err());
    }
}
