use axum::{extract::Request, middleware::Next, response::Response};

use crate::database::manager::DatabaseManager;
use crate::database::models::User;
use crate::error::ApiError;
use crate::services::{KindergartenService, UserService};

use super::auth::AuthUser;

/// Current database row of the authenticated user.
#[derive(Clone, Debug)]
pub struct ValidatedUser(pub User);

/// Re-validates the session against the database on every request.
///
/// The user must still exist and be active, and still hold the role the
/// token was issued with. Tenant users additionally need their kindergarten
/// to be active and not trashed.
pub async fn validate_user_middleware(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    let pool = DatabaseManager::pool().await?;
    let user = UserService::new(pool.clone()).find(auth_user.user_id).await?;

    let user = match user {
        Some(user) if user.is_active => user,
        _ => {
            tracing::warn!("Session for user {} rejected: account missing or inactive", auth_user.user_id);
            return Err(ApiError::forbidden("Your account is not active"));
        }
    };

    if user.role != auth_user.role {
        tracing::warn!(
            "Session for {} rejected: token role {} no longer matches {}",
            user.email,
            auth_user.role,
            user.role
        );
        return Err(ApiError::forbidden("Your role has changed, please sign in again"));
    }

    if !user.role.is_system() {
        let kindergarten = match user.kindergarten_id {
            Some(id) => KindergartenService::new(pool).find_active(id).await?,
            None => None,
        };
        if kindergarten.is_none() || user.kindergarten_id != auth_user.kindergarten_id {
            tracing::warn!("Session for {} rejected: kindergarten is not active", user.email);
            return Err(ApiError::forbidden("Your kindergarten is not active"));
        }
    }

    tracing::debug!("User validation successful: {} ({})", user.email, user.role);
    request.extensions_mut().insert(ValidatedUser(user));
    Ok(next.run(request).await)
}
