//! Services module
//!
//! This module contains business logic services

pub mod categories;
pub mod events;
pub mod users;

// Re-export commonly used services
pub use categories::CategoryService;
pub use events::EventService;
pub use users::UserService;

use tracing::{debug, warn};

use crate::config::settings::Settings;
use crate::database::Store;
use crate::middleware::AuthMiddleware;
use crate::models::user::Actor;
use crate::utils::errors::{EventHubError, Result};

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory<S: Store> {
    pub event_service: EventService<S>,
    pub category_service: CategoryService<S>,
    pub user_service: UserService<S>,
    store: S,
    settings: Settings,
}

impl<S: Store> ServiceFactory<S> {
    /// Create a new ServiceFactory with all services sharing one store
    pub fn new(store: S, settings: Settings) -> Self {
        let category_service = CategoryService::new(store.clone());
        let event_service = EventService::new(
            store.clone(),
            category_service.clone(),
            settings.search.clone(),
        );
        let user_service = UserService::new(store.clone(), settings.search.clone());

        Self {
            event_service,
            category_service,
            user_service,
            store,
            settings,
        }
    }

    /// Get authentication middleware
    pub fn auth_middleware(&self) -> AuthMiddleware {
        AuthMiddleware::new(&self.settings.auth)
    }

    /// Resolve an `Authorization` header against the user store.
    ///
    /// The token only names the account; the role is taken from the stored
    /// record, and a token for a deleted account is refused.
    pub async fn authenticate(&self, header: Option<&str>) -> Result<Option<Actor>> {
        match self.auth_middleware().authenticate(header)? {
            Some(claimed) => self.resolve(claimed).await.map(Some),
            None => Ok(None),
        }
    }

    /// Like [`authenticate`](Self::authenticate) but anonymous callers are refused
    pub async fn require_actor(&self, header: Option<&str>) -> Result<Actor> {
        self.authenticate(header)
            .await?
            .ok_or_else(|| EventHubError::Authentication("Authentication required".to_string()))
    }

    async fn resolve(&self, claimed: Actor) -> Result<Actor> {
        let Some(user) = self.store.find_user(claimed.id).await? else {
            warn!(user_id = %claimed.id, "Token names an account that no longer exists");
            return Err(EventHubError::Authentication(
                "Account no longer exists".to_string(),
            ));
        };
        if user.role != claimed.role {
            debug!(user_id = %user.id, role = ?user.role, "Token role is stale, using stored role");
        }
        Ok(Actor::new(user.id, user.role))
    }
}

/// Refuse non-admin callers
pub(crate) fn require_admin(actor: &Actor, action: &str) -> Result<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(EventHubError::PermissionDenied(format!(
            "Only admins can {}",
            action
        )))
    }
}
