use serde::Deserialize;

use crate::database::models::Kindergarten;
use crate::extract::Query;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Include soft-deleted kindergartens
    #[serde(default)]
    pub include_trashed: bool,
}

/// GET /api/root/kindergartens - Newest first
pub async fn kindergarten_list(Query(query): Query<ListQuery>) -> ApiResult<Vec<Kindergarten>> {
    Ok(ApiResponse::success(super::service().await?.list(query.include_trashed).await?))
}
