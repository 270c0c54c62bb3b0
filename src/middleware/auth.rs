//! Authentication middleware
//!
//! Verifies bearer tokens issued by the external credential service and
//! turns them into an [`Actor`]. Token issuance happens elsewhere.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::models::user::{Actor, Role};
use crate::utils::errors::{EventHubError, Result};

/// Token payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub exp: usize,
}

/// Authentication middleware
#[derive(Clone)]
pub struct AuthMiddleware {
    key: DecodingKey,
    validation: Validation,
}

impl AuthMiddleware {
    /// Create a new AuthMiddleware instance
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway_seconds;

        Self {
            key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Resolve an `Authorization` header value; no header means anonymous
    pub fn authenticate(&self, header: Option<&str>) -> Result<Option<Actor>> {
        let Some(header) = header.map(str::trim).filter(|h| !h.is_empty()) else {
            return Ok(None);
        };
        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                EventHubError::Authentication("Expected a bearer token".to_string())
            })?;

        self.verify(token).map(Some)
    }

    /// Like [`authenticate`](Self::authenticate) but anonymous callers are refused
    pub fn require_actor(&self, header: Option<&str>) -> Result<Actor> {
        self.authenticate(header)?
            .ok_or_else(|| EventHubError::Authentication("Authentication required".to_string()))
    }

    /// Verify a raw token
    pub fn verify(&self, token: &str) -> Result<Actor> {
        match decode::<Claims>(token, &self.key, &self.validation) {
            Ok(data) => {
                debug!(user_id = %data.claims.sub, "Token verified");
                Ok(Actor::new(data.claims.sub, data.claims.role))
            }
            Err(e) => {
                warn!(error = %e, "Rejected bearer token");
                Err(EventHubError::Authentication(format!("Invalid token: {}", e)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "a-test-secret-that-is-long-enough-123";

    fn config() -> AuthConfig {
        AuthConfig {
            jwt_secret: SECRET.to_string(),
            leeway_seconds: 30,
        }
    }

    fn token(secret: &str, sub: Uuid, role: Role, ttl: Duration) -> String {
        let claims = Claims {
            sub,
            role,
            exp: (Utc::now() + ttl).timestamp() as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn test_valid_token_yields_actor() {
        let auth = AuthMiddleware::new(&config());
        let id = Uuid::new_v4();
        let header = format!("Bearer {}", token(SECRET, id, Role::Admin, Duration::hours(1)));

        let actor = auth.authenticate(Some(&header)).unwrap().unwrap();
        assert_eq!(actor, Actor::admin(id));
    }

    #[test]
    fn test_missing_header_is_anonymous() {
        let auth = AuthMiddleware::new(&config());
        assert_eq!(auth.authenticate(None).unwrap(), None);
        assert_eq!(auth.authenticate(Some("  ")).unwrap(), None);
        assert_matches!(auth.require_actor(None), Err(EventHubError::Authentication(_)));
    }

    #[test]
    fn test_rejected_tokens() {
        let auth = AuthMiddleware::new(&config());
        let id = Uuid::new_v4();

        let expired = token(SECRET, id, Role::User, Duration::hours(-1));
        assert_matches!(auth.verify(&expired), Err(EventHubError::Authentication(_)));

        let forged = token("some-other-secret-of-sufficient-size", id, Role::Admin, Duration::hours(1));
        assert_matches!(auth.verify(&forged), Err(EventHubError::Authentication(_)));

        assert_matches!(auth.verify("garbage"), Err(EventHubError::Authentication(_)));
        assert_matches!(
            auth.authenticate(Some("Basic dXNlcjpwYXNz")),
            Err(EventHubError::Authentication(_))
        );
    }
}
