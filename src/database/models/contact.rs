use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContactSubmission {
    pub id: i32,
    pub kindergarten_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub subject: String,
    pub message: String,
    pub file_path: Option<String>,
    pub is_read: bool,
    pub submitted_at: DateTime<Utc>,
}

impl ContactSubmission {
    pub fn sender_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
