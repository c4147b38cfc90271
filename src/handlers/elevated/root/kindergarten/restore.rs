use crate::database::models::Kindergarten;
use crate::extract::Path;
use crate::middleware::{ApiResponse, ApiResult};

/// POST /api/root/kindergartens/:id/restore - Undo a soft delete
pub async fn kindergarten_restore(Path(id): Path<i32>) -> ApiResult<Kindergarten> {
    Ok(ApiResponse::success(super::service().await?.restore(id).await?))
}
