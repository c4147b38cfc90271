use crate::database::models::Kindergarten;
use crate::extract::{Json, Path};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::kindergarten_service::KindergartenInput;

/// PUT /api/root/kindergartens/:id - Name, subdomain and active flag
pub async fn kindergarten_update(Path(id): Path<i32>, Json(input): Json<KindergartenInput>) -> ApiResult<Kindergarten> {
    Ok(ApiResponse::success(super::service().await?.update(id, input).await?))
}
