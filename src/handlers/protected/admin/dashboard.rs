use axum::extract::Extension;

use crate::database::manager::DatabaseManager;
use crate::middleware::{ApiResponse, ApiResult, TenantScope};
use crate::services::dashboard_service::AdminDashboard;
use crate::services::DashboardService;

/// GET /api/admin/dashboard - Content counts, unread messages and recent activity
pub async fn dashboard_get(Extension(scope): Extension<TenantScope>) -> ApiResult<AdminDashboard> {
    let pool = DatabaseManager::pool().await?;
    let dashboard = DashboardService::new(pool).admin(scope.kindergarten_id).await?;
    Ok(ApiResponse::success(dashboard))
}
