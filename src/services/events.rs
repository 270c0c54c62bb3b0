//! Event service implementation
//!
//! Owns the event lifecycle: creation and review, edits, participation,
//! cancellation and finishing. State transitions are computed by
//! [`Event`] itself; this service loads, authorizes and persists them.
//!
//! Lifecycle writes are compare-and-set on the event version and are retried
//! a bounded number of times. Roster changes and deletes are single
//! conditional writes; when one does not apply, the event is re-read so the
//! caller learns which precondition failed.

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::categories::CategoryService;
use super::require_admin;
use crate::config::SearchConfig;
use crate::database::Store;
use crate::models::event::{
    ApprovalInfo, CreateEventRequest, Event, EventView, UpdateEventRequest,
};
use crate::models::user::Actor;
use crate::search::{EventQuery, SearchParams, SearchResult};
use crate::utils::errors::{ConflictReason, EventHubError, Result};
use crate::utils::helpers::page_count;
use crate::utils::logging::{log_admin_action, log_event_action};

/// Attempts for a version-checked write before reporting a conflict
const MAX_WRITE_ATTEMPTS: u32 = 3;

#[derive(Clone)]
pub struct EventService<S: Store> {
    store: S,
    categories: CategoryService<S>,
    search: SearchConfig,
}

impl<S: Store> EventService<S> {
    /// Create a new EventService instance
    pub fn new(store: S, categories: CategoryService<S>, search: SearchConfig) -> Self {
        Self {
            store,
            categories,
            search,
        }
    }

    /// Search events visible to `viewer`
    pub async fn search(&self, viewer: Option<&Actor>, params: &SearchParams) -> Result<SearchResult> {
        let query = EventQuery::build(params, viewer, Utc::now(), &self.search)?;
        debug!(filters = query.filters.len(), sort = ?query.sort, page = query.page, "Searching events");

        let (events, total) = self.store.search_events(&query).await?;
        let events = self.views(events).await?;

        Ok(SearchResult {
            events,
            page: query.page,
            pages: page_count(total, query.limit),
            total,
            filters: query.applied,
        })
    }

    /// Create an event organized by `actor`
    pub async fn create(&self, actor: &Actor, request: CreateEventRequest) -> Result<EventView> {
        let now = Utc::now();
        request.validate(now)?;
        self.ensure_known(actor).await?;
        self.categories.ensure_usable(request.category_id).await?;

        let event = Event::new(request, actor, now);
        self.store.insert_event(&event).await?;

        info!(
            event_id = %event.id,
            organizer_id = %actor.id,
            approval_status = event.approval_status.as_str(),
            "Event created"
        );
        log_event_action(event.id, "create", actor.id, None);
        self.view(event).await
    }

    /// Event detail with roster and approver expanded
    pub async fn get(&self, viewer: Option<&Actor>, id: Uuid) -> Result<EventView> {
        let event = self.load(id).await?;
        if !event.is_visible_to(viewer) {
            return Err(EventHubError::PermissionDenied(
                "This event is awaiting review".to_string(),
            ));
        }
        self.detail(event).await
    }

    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        changes: UpdateEventRequest,
    ) -> Result<EventView> {
        let current = self.load(id).await?;
        ensure_manager(&current, actor, "edit")?;
        if let Some(category_id) = changes.category_id {
            if current.status.is_terminal() {
                return Err(EventHubError::Conflict(ConflictReason::EventClosed));
            }
            self.categories.ensure_usable(category_id).await?;
        }

        let event = self
            .mutate(id, |event| {
                ensure_manager(event, actor, "edit")?;
                event.apply_update(&changes, actor, Utc::now())
            })
            .await?;

        info!(
            event_id = %id,
            actor_id = %actor.id,
            approval_status = event.approval_status.as_str(),
            "Event updated"
        );
        log_event_action(id, "update", actor.id, None);
        self.view(event).await
    }

    pub async fn approve(&self, actor: &Actor, id: Uuid) -> Result<EventView> {
        require_admin(actor, "approve events")?;
        let event = self
            .mutate(id, |event| event.approve(actor.id, Utc::now()))
            .await?;

        log_admin_action(actor.id, "approve_event", Some(id), None);
        self.view(event).await
    }

    pub async fn reject(&self, actor: &Actor, id: Uuid, reason: &str) -> Result<EventView> {
        if reason.trim().is_empty() {
            return Err(EventHubError::invalid("reason", "A rejection reason is required"));
        }
        require_admin(actor, "reject events")?;
        let event = self
            .mutate(id, |event| event.reject(actor.id, reason, Utc::now()))
            .await?;

        log_admin_action(actor.id, "reject_event", Some(id), Some(reason.trim()));
        self.view(event).await
    }

    /// Join the roster of an open event
    pub async fn participate(&self, actor: &Actor, id: Uuid) -> Result<EventView> {
        self.ensure_known(actor).await?;
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            if self.store.add_participant(id, actor.id).await? {
                log_event_action(id, "participate", actor.id, None);
                let event = self.load(id).await?;
                return self.view(event).await;
            }
            let event = self.load(id).await?;
            event.ensure_can_join(actor.id)?;
            debug!(event_id = %id, attempt, "Roster changed while joining, retrying");
        }
        Err(self.contended(id))
    }

    /// Leave the roster of an event
    pub async fn cancel_participation(&self, actor: &Actor, id: Uuid) -> Result<EventView> {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            if self.store.remove_participant(id, actor.id).await? {
                log_event_action(id, "cancel_participation", actor.id, None);
                let event = self.load(id).await?;
                return self.view(event).await;
            }
            let event = self.load(id).await?;
            event.ensure_can_leave(actor.id)?;
            debug!(event_id = %id, attempt, "Roster changed while leaving, retrying");
        }
        Err(self.contended(id))
    }

    /// Cancel the event itself; canceled events are terminal
    pub async fn cancel(&self, actor: &Actor, id: Uuid) -> Result<EventView> {
        let event = self
            .mutate(id, |event| {
                ensure_manager(event, actor, "cancel")?;
                event.cancel(Utc::now())
            })
            .await?;

        log_event_action(id, "cancel", actor.id, None);
        self.view(event).await
    }

    /// Mark an event finished ahead of the periodic sweep
    pub async fn finish(&self, actor: &Actor, id: Uuid) -> Result<EventView> {
        require_admin(actor, "finish events")?;
        let event = self.mutate(id, |event| event.finish(Utc::now())).await?;

        log_admin_action(actor.id, "finish_event", Some(id), None);
        self.view(event).await
    }

    /// Delete an event with an empty roster
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<()> {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let event = self.load(id).await?;
            ensure_manager(&event, actor, "delete")?;
            event.ensure_deletable()?;

            if self.store.delete_event_if_empty(id).await? {
                info!(event_id = %id, actor_id = %actor.id, "Event deleted");
                log_event_action(id, "delete", actor.id, None);
                return Ok(());
            }
            debug!(event_id = %id, attempt, "Event changed while deleting, retrying");
        }
        Err(self.contended(id))
    }

    /// Events awaiting review, newest first
    pub async fn list_pending(&self, actor: &Actor) -> Result<Vec<EventView>> {
        require_admin(actor, "review pending events")?;
        let events = self.store.pending_events().await?;
        self.views(events).await
    }

    pub async fn approval_status(&self, actor: &Actor, id: Uuid) -> Result<ApprovalInfo> {
        let event = self.load(id).await?;
        if !event.is_visible_to(Some(actor)) {
            return Err(EventHubError::PermissionDenied(
                "Only the organizer or an admin can see this review".to_string(),
            ));
        }

        let approved_by = match event.approved_by {
            Some(approver) => self.store.find_user(approver).await?.map(|u| u.summary()),
            None => None,
        };

        Ok(ApprovalInfo {
            event_id: event.id,
            approval_status: event.approval_status,
            approved_by,
            approval_date: event.approval_date,
            rejection_reason: event.rejection_reason,
        })
    }

    /// Finish every active event that ended before `now`
    pub async fn finish_past_events(&self, now: DateTime<Utc>) -> Result<u64> {
        let finished = self.store.finish_past_events(now).await?;
        if finished > 0 {
            info!(finished, "Past events marked as finished");
        }
        Ok(finished)
    }

    /// Refuse callers whose account has been deleted
    async fn ensure_known(&self, actor: &Actor) -> Result<()> {
        if self.store.find_user(actor.id).await?.is_some() {
            return Ok(());
        }
        warn!(user_id = %actor.id, "Refused caller without an account");
        Err(EventHubError::Authentication(
            "Account no longer exists".to_string(),
        ))
    }

    async fn load(&self, id: Uuid) -> Result<Event> {
        self.store
            .find_event(id)
            .await?
            .ok_or(EventHubError::EventNotFound { event_id: id })
    }

    /// Read, transform and compare-and-set an event
    async fn mutate<F>(&self, id: Uuid, apply: F) -> Result<Event>
    where
        F: Fn(&mut Event) -> Result<()> + Send,
    {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let mut event = self.load(id).await?;
            let expected = event.version;
            apply(&mut event)?;

            if self.store.update_event(&event, expected).await? {
                event.version = expected + 1;
                return Ok(event);
            }
            debug!(event_id = %id, attempt, "Event version moved, retrying");
        }
        Err(self.contended(id))
    }

    fn contended(&self, id: Uuid) -> EventHubError {
        warn!(event_id = %id, attempts = MAX_WRITE_ATTEMPTS, "Giving up on contended event write");
        EventHubError::Conflict(ConflictReason::ConcurrentModification)
    }

    async fn view(&self, event: Event) -> Result<EventView> {
        let (category, organizer) = futures::try_join!(
            self.store.find_category(event.category_id),
            self.store.find_user(event.organizer_id),
        )?;

        Ok(EventView {
            participants_count: event.participants_count(),
            is_fully_booked: event.is_fully_booked(),
            category: category.map(|c| c.summary()),
            organizer: organizer.map(|u| u.summary()),
            attendees: None,
            approver: None,
            event,
        })
    }

    async fn views(&self, events: Vec<Event>) -> Result<Vec<EventView>> {
        try_join_all(events.into_iter().map(|event| self.view(event))).await
    }

    async fn detail(&self, event: Event) -> Result<EventView> {
        let attendees = try_join_all(event.participants.iter().map(|id| self.store.find_user(*id)))
            .await?
            .into_iter()
            .flatten()
            .map(|user| user.summary())
            .collect();
        let approver = match event.approved_by {
            Some(id) => self.store.find_user(id).await?.map(|u| u.summary()),
            None => None,
        };

        let mut view = self.view(event).await?;
        view.attendees = Some(attendees);
        view.approver = approver;
        Ok(view)
    }
}

fn ensure_manager(event: &Event, actor: &Actor, action: &str) -> Result<()> {
    if event.can_be_managed_by(actor) {
        Ok(())
    } else {
        Err(EventHubError::PermissionDenied(format!(
            "Only the organizer or an admin can {} this event",
            action
        )))
    }
}
