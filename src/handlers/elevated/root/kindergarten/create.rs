// handlers/elevated/root/kindergarten/create.rs - POST /api/root/kindergartens handler

use crate::database::models::Kindergarten;
use crate::extract::Json;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::kindergarten_service::KindergartenInput;

/**
 * POST /api/root/kindergartens - Create a kindergarten
 *
 * Also creates its default general settings, mission/vision and about
 * content in the same transaction.
 *
 * Expected Input:
 * ```json
 * {
 *   "name": "Güneş Kreş",     // Required
 *   "subdomain": "gunes",     // Required: letters, digits, hyphens; not reserved
 *   "is_active": true         // Optional, defaults to true
 * }
 * ```
 *
 * A subdomain already in use (case-insensitive) answers 409.
 */
pub async fn kindergarten_create(Json(input): Json<KindergartenInput>) -> ApiResult<Kindergarten> {
    let kindergarten = super::service().await?.create(input).await?;
    tracing::info!("Created kindergarten '{}' ({})", kindergarten.subdomain, kindergarten.id);
    Ok(ApiResponse::created(kindergarten))
}
