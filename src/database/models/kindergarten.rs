use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Kindergarten {
    pub id: i32,
    pub name: String,
    pub subdomain: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub trashed_at: Option<DateTime<Utc>>,
}

impl Kindergarten {
    /// Active and not soft-deleted.
    pub fn is_serving(&self) -> bool {
        self.is_active && self.trashed_at.is_none()
    }
}
