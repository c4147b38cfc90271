// handlers/public/site/pages.rs - Read-only public pages

use axum::extract::Extension;

use crate::database::manager::DatabaseManager;
use crate::database::models::{Announcement, Event, GalleryImage, Staff};
use crate::extract::Path;
use crate::middleware::{ApiResponse, ApiResult, SiteTenant};
use crate::services::site_service::{AboutPage, DetailPage, HomePage, ListPage};
use crate::services::{SiteService, UploadService};

async fn site_service(tenant: &SiteTenant) -> Result<SiteService, crate::error::ApiError> {
    let pool = DatabaseManager::pool().await?;
    Ok(SiteService::new(pool, tenant.0.id, UploadService::from_config()))
}

/// GET / - Hero, mission/vision, programs and the newest testimonials
pub async fn home(Extension(tenant): Extension<SiteTenant>) -> ApiResult<HomePage> {
    let page = site_service(&tenant).await?.home_page(&tenant.0).await?;
    Ok(ApiResponse::success(page))
}

/// GET /about
pub async fn about(Extension(tenant): Extension<SiteTenant>) -> ApiResult<AboutPage> {
    let page = site_service(&tenant).await?.about_page(&tenant.0).await?;
    Ok(ApiResponse::success(page))
}

/// GET /events - Active events, newest date first
pub async fn events(Extension(tenant): Extension<SiteTenant>) -> ApiResult<ListPage<Event>> {
    let page = site_service(&tenant).await?.list_page::<Event>(&tenant.0).await?;
    Ok(ApiResponse::success(page))
}

/// GET /events/:id - Inactive events and other kindergartens' events are 404
pub async fn event_detail(
    Extension(tenant): Extension<SiteTenant>,
    Path(id): Path<i32>,
) -> ApiResult<DetailPage<Event>> {
    let page = site_service(&tenant).await?.detail_page::<Event>(&tenant.0, id).await?;
    Ok(ApiResponse::success(page))
}

/// GET /staff
pub async fn staff(Extension(tenant): Extension<SiteTenant>) -> ApiResult<ListPage<Staff>> {
    let page = site_service(&tenant).await?.list_page::<Staff>(&tenant.0).await?;
    Ok(ApiResponse::success(page))
}

/// GET /announcements
pub async fn announcements(Extension(tenant): Extension<SiteTenant>) -> ApiResult<ListPage<Announcement>> {
    let page = site_service(&tenant).await?.list_page::<Announcement>(&tenant.0).await?;
    Ok(ApiResponse::success(page))
}

/// GET /announcements/:id
pub async fn announcement_detail(
    Extension(tenant): Extension<SiteTenant>,
    Path(id): Path<i32>,
) -> ApiResult<DetailPage<Announcement>> {
    let page = site_service(&tenant).await?.detail_page::<Announcement>(&tenant.0, id).await?;
    Ok(ApiResponse::success(page))
}

/// GET /gallery
pub async fn gallery(Extension(tenant): Extension<SiteTenant>) -> ApiResult<ListPage<GalleryImage>> {
    let page = site_service(&tenant).await?.list_page::<GalleryImage>(&tenant.0).await?;
    Ok(ApiResponse::success(page))
}
