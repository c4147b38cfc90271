pub mod content_entities;
pub mod content_service;
pub mod dashboard_service;
pub mod kindergarten_service;
pub mod message_service;
pub mod notification_service;
pub mod seed;
pub mod site_service;
pub mod upload_service;
pub mod user_service;
pub mod validation;

use crate::auth::AuthError;
use crate::database::DatabaseError;
use crate::tenant::TenantError;

pub use content_service::{ContentEntity, ContentService};
pub use dashboard_service::DashboardService;
pub use kindergarten_service::KindergartenService;
pub use message_service::MessageService;
pub use notification_service::NotificationService;
pub use site_service::SiteService;
pub use upload_service::{UploadError, UploadService, UploadedFile};
pub use user_service::UserService;
pub use validation::ValidationErrors;

/// Errors raised by the service layer, mapped onto HTTP statuses by `ApiError`.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Tenant(#[from] TenantError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Database(DatabaseError::Sqlx(err))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
