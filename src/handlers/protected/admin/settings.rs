// handlers/protected/admin/settings.rs - Site settings and about page singletons

use axum::extract::Extension;

use crate::database::manager::DatabaseManager;
use crate::database::models::AboutUsContent;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, TenantScope};
use crate::services::content_service::ContentForm;
use crate::services::site_service::SiteSettings;
use crate::services::{SiteService, UploadService};

async fn site_service(scope: &TenantScope) -> Result<SiteService, ApiError> {
    let pool = DatabaseManager::pool().await?;
    Ok(SiteService::new(pool, scope.kindergarten_id, UploadService::from_config()))
}

/// GET /api/admin/settings - General settings with mission and vision
///
/// The rows are created empty on first access.
pub async fn settings_get(Extension(scope): Extension<TenantScope>) -> ApiResult<SiteSettings> {
    Ok(ApiResponse::success(site_service(&scope).await?.settings().await?))
}

/**
 * PUT /api/admin/settings - Update general settings and mission/vision
 *
 * JSON or multipart/form-data. Multipart requests may carry `logo`,
 * `footer_logo` and `hero_background` images, each replacing the stored file.
 *
 * Expected Input:
 * ```json
 * {
 *   "slogan": "string",
 *   "sub_slogan": "string",
 *   "footer_slogan": "string",
 *   "address": "string",
 *   "phone": "string",
 *   "email": "info@example.com",
 *   "facebook_url": "https://...",
 *   "twitter_url": "https://...",
 *   "instagram_url": "https://...",
 *   "google_map_embed": "<iframe ...>",
 *   "mission_title": "string",
 *   "mission_text": "string",
 *   "vision_title": "string",
 *   "vision_text": "string"
 * }
 * ```
 */
pub async fn settings_put(Extension(scope): Extension<TenantScope>, form: ContentForm) -> ApiResult<SiteSettings> {
    let updated = site_service(&scope).await?.update_settings(form).await?;
    tracing::info!("Settings updated for kindergarten {}", scope.kindergarten_id);
    Ok(ApiResponse::success(updated))
}

/// GET /api/admin/about
pub async fn about_get(Extension(scope): Extension<TenantScope>) -> ApiResult<AboutUsContent> {
    Ok(ApiResponse::success(site_service(&scope).await?.about().await?))
}

/// PUT /api/admin/about - `title`, `description` and an optional `image` upload
pub async fn about_put(Extension(scope): Extension<TenantScope>, form: ContentForm) -> ApiResult<AboutUsContent> {
    Ok(ApiResponse::success(site_service(&scope).await?.update_about(form).await?))
}
