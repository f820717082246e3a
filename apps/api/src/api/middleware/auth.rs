use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::auth::jwt::verify_token;
use crate::domain::user::{User, UserRole};
use crate::services::ServiceError;
use crate::state::AppState;

/// Authenticated caller for protected routes
///
/// The token is verified and the account reloaded (through the user cache),
/// so tokens of deleted or disabled users stop working immediately.
///
/// Usage:
/// ```rust,ignore
/// async fn protected_handler(auth: AuthUser) -> Result<String, ApiError> {
///     auth.require(&[UserRole::Admin])?;
///     Ok(format!("Hello {}", auth.user().username))
/// }
/// ```
pub struct AuthUser(pub User);

impl AuthUser {
    pub fn id(&self) -> Uuid {
        self.0.id
    }

    pub fn user(&self) -> &User {
        &self.0
    }

    /// Fails with 403 unless the caller holds one of `roles`
    pub fn require(&self, roles: &[UserRole]) -> Result<(), ApiError> {
        if roles.contains(&self.0.role) {
            Ok(())
        } else {
            tracing::warn!(user_id = %self.0.id, role = %self.0.role, "access denied");
            Err(ApiError::forbidden("Access denied"))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Extract the authorization header
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing authorization header"))?;

        // Extract bearer token
        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            ApiError::unauthorized("Invalid authorization format. Use: Bearer <token>")
        })?;

        let claims = verify_token(token, &state.config.jwt_secret)
            .map_err(|e| ApiError::unauthorized(format!("Invalid token: {}", e)))?;

        let user = state
            .users
            .get_by_id(claims.sub)
            .await
            .map_err(|e| match e {
                ServiceError::NotFound(_) => ApiError::unauthorized("Account no longer exists"),
                other => ApiError::from(other),
            })?;

        if !user.enabled {
            return Err(ApiError::unauthorized("Account is disabled"));
        }

        Ok(AuthUser(user))
    }
}
