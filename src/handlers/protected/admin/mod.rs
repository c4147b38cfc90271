// handlers/protected/admin/mod.rs - Kindergarten admin panel
//
// Every handler receives the `TenantScope` resolved by
// `validate_tenant_middleware`; all reads and writes go through services
// bound to that kindergarten id.

pub mod content;
pub mod dashboard;
pub mod gallery;
pub mod messages;
pub mod settings;

use crate::database::manager::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::TenantScope;
use crate::services::{ContentEntity, ContentService, UploadService};

pub(crate) async fn content_service<E: ContentEntity>(scope: &TenantScope) -> Result<ContentService<E>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    Ok(ContentService::new(pool, scope.kindergarten_id, UploadService::from_config()))
}
