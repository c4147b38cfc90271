// handlers/elevated/root/user/mod.rs - Account management across kindergartens

use axum::extract::Extension;

use crate::database::manager::DatabaseManager;
use crate::database::models::{User, UserListing};
use crate::error::ApiError;
use crate::extract::{Json, Path};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::user_service::UserInput;
use crate::services::UserService;

async fn service() -> Result<UserService, ApiError> {
    Ok(UserService::new(DatabaseManager::pool().await?))
}

/// GET /api/root/users - Newest first, with kindergarten names
pub async fn user_list() -> ApiResult<Vec<UserListing>> {
    Ok(ApiResponse::success(service().await?.list().await?))
}

/// GET /api/root/users/:id
pub async fn user_show(Path(id): Path<i32>) -> ApiResult<UserListing> {
    Ok(ApiResponse::success(service().await?.get(id).await?))
}

/**
 * POST /api/root/users - Create an account
 *
 * Expected Input:
 * ```json
 * {
 *   "username": "ayse",
 *   "email": "ayse@ornek.com",        // Unique, case-insensitive (409)
 *   "password": "at-least-8-chars",
 *   "role": "Teacher",                // SuperAdmin | KindergartenAdmin | Teacher
 *   "kindergarten_id": 1,             // Required unless SuperAdmin (ignored for SuperAdmin)
 *   "is_active": true
 * }
 * ```
 */
pub async fn user_create(Json(input): Json<UserInput>) -> ApiResult<User> {
    let user = service().await?.create(input).await?;
    tracing::info!("Created {} account {}", user.role, user.email);
    Ok(ApiResponse::created(user))
}

/// PUT /api/root/users/:id - A blank or missing password keeps the current one
pub async fn user_update(
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(input): Json<UserInput>,
) -> ApiResult<User> {
    Ok(ApiResponse::success(service().await?.update(id, input, auth_user.user_id).await?))
}

/// DELETE /api/root/users/:id - Deleting your own account is forbidden
pub async fn user_delete(Extension(auth_user): Extension<AuthUser>, Path(id): Path<i32>) -> ApiResult<User> {
    let user = service().await?.delete(id, auth_user.user_id).await?;
    tracing::info!("Deleted account {} ({})", user.email, user.id);
    Ok(ApiResponse::success(user))
}
