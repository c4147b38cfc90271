use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CoreEducationProgram {
    pub id: i32,
    pub kindergarten_id: i32,
    /// Font Awesome class, e.g. `fa-solid fa-palette`.
    pub icon: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ParentTestimonial {
    pub id: i32,
    pub kindergarten_id: i32,
    pub parent_name: String,
    pub parent_photo: Option<String>,
    pub rating: i32,
    pub comment: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: i32,
    pub kindergarten_id: i32,
    pub title: String,
    pub short_description: Option<String>,
    pub detailed_description: Option<String>,
    pub image_path: Option<String>,
    pub event_date: DateTime<Utc>,
    pub event_time: Option<String>,
    pub location: Option<String>,
    /// Free-form agenda, usually a JSON document authored in the admin UI.
    pub event_schedule: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Staff {
    pub id: i32,
    pub kindergarten_id: i32,
    pub full_name: String,
    pub title: Option<String>,
    pub branch: Option<String>,
    pub biography: Option<String>,
    pub photo_path: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Announcement {
    pub id: i32,
    pub kindergarten_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub announcement_date: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GalleryImage {
    pub id: i32,
    pub kindergarten_id: i32,
    pub image_path: String,
    pub title: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
