use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Per-kindergarten site chrome: logos, slogans, contact details, social links.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GeneralSettings {
    pub id: i32,
    pub kindergarten_id: i32,
    pub logo_path: Option<String>,
    pub footer_logo_path: Option<String>,
    pub slogan: Option<String>,
    pub sub_slogan: Option<String>,
    pub hero_background_path: Option<String>,
    pub footer_slogan: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub facebook_url: Option<String>,
    pub twitter_url: Option<String>,
    pub instagram_url: Option<String>,
    pub google_map_embed: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MissionVision {
    pub id: i32,
    pub kindergarten_id: i32,
    pub mission_title: Option<String>,
    pub mission_text: Option<String>,
    pub vision_title: Option<String>,
    pub vision_text: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AboutUsContent {
    pub id: i32,
    pub kindergarten_id: i32,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_path: Option<String>,
    pub updated_at: DateTime<Utc>,
}
