// handlers/protected/admin/messages.rs - Contact form inbox

use axum::extract::Extension;
use serde::Serialize;

use crate::database::manager::DatabaseManager;
use crate::database::models::ContactSubmission;
use crate::error::ApiError;
use crate::extract::Path;
use crate::middleware::{ApiResponse, ApiResult, TenantScope};
use crate::services::{MessageService, UploadService};

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub unread: i64,
}

async fn message_service(scope: &TenantScope) -> Result<MessageService, ApiError> {
    let pool = DatabaseManager::pool().await?;
    Ok(MessageService::new(pool, scope.kindergarten_id, UploadService::from_config()))
}

/// GET /api/admin/messages - Newest first
pub async fn list(Extension(scope): Extension<TenantScope>) -> ApiResult<Vec<ContactSubmission>> {
    Ok(ApiResponse::success(message_service(&scope).await?.list().await?))
}

/// GET /api/admin/messages/:id - Opening a message marks it read
pub async fn show(Extension(scope): Extension<TenantScope>, Path(id): Path<i32>) -> ApiResult<ContactSubmission> {
    Ok(ApiResponse::success(message_service(&scope).await?.open(id).await?))
}

/// POST /api/admin/messages/:id/read
pub async fn mark_read(Extension(scope): Extension<TenantScope>, Path(id): Path<i32>) -> ApiResult<ContactSubmission> {
    Ok(ApiResponse::success(message_service(&scope).await?.set_read(id, true).await?))
}

/// POST /api/admin/messages/:id/unread
pub async fn mark_unread(
    Extension(scope): Extension<TenantScope>,
    Path(id): Path<i32>,
) -> ApiResult<ContactSubmission> {
    Ok(ApiResponse::success(message_service(&scope).await?.set_read(id, false).await?))
}

/// DELETE /api/admin/messages/:id - Removes the attachment as well
pub async fn delete(Extension(scope): Extension<TenantScope>, Path(id): Path<i32>) -> ApiResult<ContactSubmission> {
    Ok(ApiResponse::success(message_service(&scope).await?.delete(id).await?))
}

/// GET /api/admin/messages/unread-count
pub async fn unread_count(Extension(scope): Extension<TenantScope>) -> ApiResult<UnreadCount> {
    let unread = message_service(&scope).await?.unread_count().await?;
    Ok(ApiResponse::success(UnreadCount { unread }))
}
