// handlers/elevated/root/kindergarten/mod.rs - Kindergarten (tenant) management

pub mod create;
pub mod delete;
pub mod list;
pub mod restore;
pub mod show;
pub mod update;

pub use create::kindergarten_create;
pub use delete::kindergarten_delete;
pub use list::kindergarten_list;
pub use restore::kindergarten_restore;
pub use show::kindergarten_show;
pub use update::kindergarten_update;

use crate::database::manager::DatabaseManager;
use crate::error::ApiError;
use crate::services::KindergartenService;

async fn service() -> Result<KindergartenService, ApiError> {
    Ok(KindergartenService::new(DatabaseManager::pool().await?))
}
