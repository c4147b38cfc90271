use axum::extract::Extension;
use serde::Serialize;

use crate::database::models::GalleryImage;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, TenantScope};
use crate::services::content_service::ContentForm;

use super::content_service;

#[derive(Debug, Serialize)]
pub struct BulkUploadResult {
    pub success: bool,
    pub count: usize,
}

/**
 * POST /api/admin/gallery/upload - Bulk upload gallery images
 *
 * multipart/form-data with any number of file parts. Each non-empty file
 * becomes an active gallery record titled after the file name (without
 * extension), appended in upload order.
 */
pub async fn bulk_upload(Extension(scope): Extension<TenantScope>, form: ContentForm) -> ApiResult<BulkUploadResult> {
    if form.file().is_none() {
        return Err(ApiError::bad_request("No files were uploaded"));
    }

    let count = content_service::<GalleryImage>(&scope).await?.bulk_upload(&form.files).await?;
    tracing::info!("Uploaded {} gallery images for kindergarten {}", count, scope.kindergarten_id);
    Ok(ApiResponse::success(BulkUploadResult { success: true, count }))
}
