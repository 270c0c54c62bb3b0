//! Category service implementation
//!
//! Gatekeeper for event writes (a target category must exist and be active),
//! admin management with soft delete, and per-category statistics.

use std::collections::BTreeMap;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use super::require_admin;
use crate::database::Store;
use crate::models::category::{
    Category, CategoryDeletion, CategoryStats, NewCategory, UpdateCategoryRequest,
};
use crate::models::event::{ApprovalStatus, EventStatus};
use crate::models::user::{is_admin, Actor};
use crate::utils::errors::{ConflictReason, EventHubError, Result, ValidationErrors};
use crate::utils::helpers::{non_blank, round2};
use crate::utils::logging::log_admin_action;

pub const NAME_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 500;

#[derive(Clone)]
pub struct CategoryService<S: Store> {
    store: S,
}

impl<S: Store> CategoryService<S> {
    /// Create a new CategoryService instance
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Categories sorted by name; inactive ones only for admins
    pub async fn list(&self, viewer: Option<&Actor>) -> Result<Vec<Category>> {
        self.store.list_categories(is_admin(viewer)).await
    }

    pub async fn get(&self, viewer: Option<&Actor>, id: Uuid) -> Result<Category> {
        let category = self.load(id).await?;
        if !category.active && !is_admin(viewer) {
            return Err(EventHubError::CategoryNotFound { category_id: id });
        }
        Ok(category)
    }

    pub async fn create(&self, actor: &Actor, request: NewCategory) -> Result<Category> {
        require_admin(actor, "create categories")?;

        let mut errors = ValidationErrors::new();
        check_name(&mut errors, &request.name);
        check_description(&mut errors, request.description.as_deref());
        errors.into_result()?;

        let name = request.name.trim().to_string();
        if self.store.find_category_by_name(&name).await?.is_some() {
            return Err(EventHubError::Conflict(ConflictReason::DuplicateCategoryName));
        }

        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4(),
            name,
            description: non_blank(request.description.as_deref()),
            active: request.active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };
        self.store.insert_category(&category).await?;

        info!(category_id = %category.id, name = %category.name, "Category created");
        log_admin_action(actor.id, "create_category", Some(category.id), None);
        Ok(category)
    }

    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        changes: UpdateCategoryRequest,
    ) -> Result<Category> {
        require_admin(actor, "update categories")?;

        let mut errors = ValidationErrors::new();
        if let Some(name) = &changes.name {
            check_name(&mut errors, name);
        }
        check_description(&mut errors, changes.description.as_deref());
        errors.into_result()?;

        let mut category = self.load(id).await?;
        if let Some(name) = &changes.name {
            let name = name.trim().to_string();
            if name != category.name {
                if let Some(existing) = self.store.find_category_by_name(&name).await? {
                    if existing.id != id {
                        return Err(EventHubError::Conflict(ConflictReason::DuplicateCategoryName));
                    }
                }
                category.name = name;
            }
        }
        if let Some(description) = &changes.description {
            category.description = non_blank(Some(description));
        }
        if let Some(active) = changes.active {
            category.active = active;
        }
        category.updated_at = Utc::now();
        self.store.update_category(&category).await?;

        log_admin_action(actor.id, "update_category", Some(id), None);
        Ok(category)
    }

    /// Delete a category, or deactivate it while events still reference it
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<CategoryDeletion> {
        require_admin(actor, "delete categories")?;
        let outcome = self.store.delete_or_deactivate_category(id).await?;

        match outcome {
            CategoryDeletion::Deleted => info!(category_id = %id, "Category deleted"),
            CategoryDeletion::Deactivated { dependent_events } => info!(
                category_id = %id,
                dependent_events,
                "Category still in use, deactivated instead of deleted"
            ),
        }
        log_admin_action(actor.id, "delete_category", Some(id), None);
        Ok(outcome)
    }

    /// Event statistics; non-admins only see approved, active events
    pub async fn stats(&self, viewer: Option<&Actor>, id: Uuid) -> Result<CategoryStats> {
        let category = self.get(viewer, id).await?;
        let admin = is_admin(viewer);

        let events: Vec<_> = self
            .store
            .events_in_category(id)
            .await?
            .into_iter()
            .filter(|e| {
                admin
                    || (e.approval_status == ApprovalStatus::Approved
                        && e.status == EventStatus::Active)
            })
            .collect();

        let mut events_by_status: BTreeMap<EventStatus, u64> =
            EventStatus::ALL.iter().map(|status| (*status, 0)).collect();
        for event in &events {
            *events_by_status.entry(event.status).or_insert(0) += 1;
        }

        let events_count = events.len() as u64;
        let total_participants: u64 = events.iter().map(|e| e.participants_count() as u64).sum();
        let avg_participants_per_event = if events_count > 0 {
            round2(total_participants as f64 / events_count as f64)
        } else {
            0.0
        };

        debug!(category_id = %id, events_count, "Category stats computed");
        Ok(CategoryStats {
            category: category.summary(),
            description: category.description,
            events_count,
            total_participants,
            avg_participants_per_event,
            events_by_status,
        })
    }

    /// Reject missing or inactive categories as event targets
    pub async fn ensure_usable(&self, id: Uuid) -> Result<Category> {
        let category = self.load(id).await?;
        if !category.active {
            return Err(EventHubError::Conflict(ConflictReason::CategoryInactive));
        }
        Ok(category)
    }

    async fn load(&self, id: Uuid) -> Result<Category> {
        self.store
            .find_category(id)
            .await?
            .ok_or(EventHubError::CategoryNotFound { category_id: id })
    }
}

fn check_name(errors: &mut ValidationErrors, name: &str) {
    let len = name.trim().chars().count();
    if len == 0 {
        errors.add("name", "Name is required");
    } else if len > NAME_MAX_CHARS {
        errors.add(
            "name",
            format!("Name cannot exceed {} characters", NAME_MAX_CHARS),
        );
    }
}

fn check_description(errors: &mut ValidationErrors, description: Option<&str>) {
    if let Some(description) = description {
        if description.trim().chars().count() > DESCRIPTION_MAX_CHARS {
            errors.add(
                "description",
                format!("Description cannot exceed {} characters", DESCRIPTION_MAX_CHARS),
            );
        }
    }
}
