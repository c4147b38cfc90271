use crate::database::manager::DatabaseManager;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::dashboard_service::SystemDashboard;
use crate::services::DashboardService;

/// GET /api/root/dashboard - Kindergarten and user totals with the newest of each
pub async fn dashboard_get() -> ApiResult<SystemDashboard> {
    let pool = DatabaseManager::pool().await?;
    Ok(ApiResponse::success(DashboardService::new(pool).system().await?))
}
