// handlers/protected/admin/content.rs - Generic CRUD for list-style content
//
// Mounted once per entity (programs, testimonials, events, staff,
// announcements, gallery) with the entity as a type parameter, e.g.
// `get(content::list::<Event>)`.

use axum::extract::Extension;
use serde::{Deserialize, Serialize};

use crate::database::manager::DatabaseManager;
use crate::extract::{Json, Path};
use crate::middleware::{ApiResponse, ApiResult, TenantScope};
use crate::services::content_service::ContentForm;
use crate::services::{ContentEntity, NotificationService, SiteService, UploadService};

use super::content_service;

#[derive(Debug, Deserialize)]
pub struct OrderRequest {
    pub display_order: i32,
}

#[derive(Debug, Serialize)]
pub struct OrderResult {
    pub success: bool,
}

/// GET /api/admin/<entity> - All records of the kindergarten, inactive included
pub async fn list<E: ContentEntity>(Extension(scope): Extension<TenantScope>) -> ApiResult<Vec<E>> {
    Ok(ApiResponse::success(content_service::<E>(&scope).await?.list().await?))
}

/// GET /api/admin/<entity>/:id
pub async fn show<E: ContentEntity>(Extension(scope): Extension<TenantScope>, Path(id): Path<i32>) -> ApiResult<E> {
    Ok(ApiResponse::success(content_service::<E>(&scope).await?.get(id).await?))
}

/**
 * POST /api/admin/<entity> - Create a record
 *
 * JSON or multipart/form-data. Entities with an image (events, staff,
 * testimonials, gallery) take it from the first non-empty file part;
 * gallery records require one. Programs, staff and gallery images are
 * appended after the current highest `display_order`.
 *
 * Validation failures answer 400 with `field_errors`.
 */
pub async fn create<E: ContentEntity>(Extension(scope): Extension<TenantScope>, form: ContentForm) -> ApiResult<E> {
    let record = content_service::<E>(&scope).await?.create(form).await?;

    if let Some((title, body)) = record.notification() {
        announce(&scope, title, body).await;
    }

    Ok(ApiResponse::created(record))
}

/// PUT /api/admin/<entity>/:id - Replace the editable fields; a new upload replaces the image
pub async fn update<E: ContentEntity>(
    Extension(scope): Extension<TenantScope>,
    Path(id): Path<i32>,
    form: ContentForm,
) -> ApiResult<E> {
    Ok(ApiResponse::success(content_service::<E>(&scope).await?.update(id, form).await?))
}

/// DELETE /api/admin/<entity>/:id - Hard delete; the stored image is removed too
pub async fn delete<E: ContentEntity>(Extension(scope): Extension<TenantScope>, Path(id): Path<i32>) -> ApiResult<E> {
    Ok(ApiResponse::success(content_service::<E>(&scope).await?.delete(id).await?))
}

/// PATCH /api/admin/<entity>/:id/order - `{ "display_order": 3 }` -> `{ "success": true }`
pub async fn order<E: ContentEntity>(
    Extension(scope): Extension<TenantScope>,
    Path(id): Path<i32>,
    Json(payload): Json<OrderRequest>,
) -> ApiResult<OrderResult> {
    let success = content_service::<E>(&scope).await?.update_order(id, payload.display_order).await?;
    Ok(ApiResponse::success(OrderResult { success }))
}

async fn announce(scope: &TenantScope, title: String, body: String) {
    let settings = match DatabaseManager::pool().await {
        Ok(pool) => SiteService::new(pool, scope.kindergarten_id, UploadService::from_config())
            .find_settings()
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Could not load settings for announcement notification: {}", e);
                None
            }),
        Err(e) => {
            tracing::warn!("Could not load settings for announcement notification: {}", e);
            None
        }
    };
    NotificationService::from_config().spawn_announcement(title, body, settings);
}
