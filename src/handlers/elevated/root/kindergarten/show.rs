use crate::database::models::Kindergarten;
use crate::extract::Path;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /api/root/kindergartens/:id
pub async fn kindergarten_show(Path(id): Path<i32>) -> ApiResult<Kindergarten> {
    Ok(ApiResponse::success(super::service().await?.get(id).await?))
}
