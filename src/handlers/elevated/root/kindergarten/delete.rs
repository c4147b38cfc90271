use crate::database::models::Kindergarten;
use crate::extract::Path;
use crate::middleware::{ApiResponse, ApiResult};

/// DELETE /api/root/kindergartens/:id - Soft delete: trashed and deactivated, content kept
pub async fn kindergarten_delete(Path(id): Path<i32>) -> ApiResult<Kindergarten> {
    let kindergarten = super::service().await?.delete(id).await?;
    tracing::info!("Soft-deleted kindergarten '{}' ({})", kindergarten.subdomain, kindergarten.id);
    Ok(ApiResponse::success(kindergarten))
}
