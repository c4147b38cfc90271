// handlers/public/site/contact.rs - GET/POST /contact handlers

use axum::extract::Extension;
use serde::Serialize;

use crate::database::manager::DatabaseManager;
use crate::middleware::{ApiResponse, ApiResult, SiteTenant};
use crate::services::content_service::ContentForm;
use crate::services::site_service::ContactPage;
use crate::services::{MessageService, NotificationService, SiteService, UploadService};

#[derive(Debug, Serialize)]
pub struct ContactReceipt {
    pub id: i32,
    pub message: &'static str,
}

/// GET /contact - Address, phone, email and map embed via the `site` block
pub async fn contact_get(Extension(tenant): Extension<SiteTenant>) -> ApiResult<ContactPage> {
    let pool = DatabaseManager::pool().await?;
    let page = SiteService::new(pool, tenant.0.id, UploadService::from_config())
        .contact_page(&tenant.0)
        .await?;
    Ok(ApiResponse::success(page))
}

/**
 * POST /contact - Submit the public contact form
 *
 * Accepts JSON or multipart/form-data. With multipart, an optional
 * attachment (jpg, jpeg, png, pdf, doc, docx; 10 MB) may be sent as `file`.
 *
 * Expected Input:
 * ```json
 * {
 *   "first_name": "Elif",
 *   "last_name": "Yılmaz",
 *   "email": "elif@example.com",
 *   "phone": "0555 000 00 00",
 *   "subject": "Kayıt",
 *   "message": "Merhaba..."
 * }
 * ```
 *
 * The kindergarten is notified in the background; a failed notification
 * never fails the submission.
 */
pub async fn contact_post(Extension(tenant): Extension<SiteTenant>, form: ContentForm) -> ApiResult<ContactReceipt> {
    let pool = DatabaseManager::pool().await?;
    let uploads = UploadService::from_config();
    let submission = MessageService::new(pool.clone(), tenant.0.id, uploads.clone()).submit(form).await?;

    let settings = match SiteService::new(pool, tenant.0.id, uploads).find_settings().await {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!("Could not load settings for contact notification: {}", e);
            None
        }
    };
    let id = submission.id;
    NotificationService::from_config().spawn_contact(submission, settings);

    Ok(ApiResponse::created(ContactReceipt {
        id,
        message: "Your message has been sent. We will get back to you as soon as possible.",
    }))
}
