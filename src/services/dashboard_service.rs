use serde::Serialize;
use sqlx::PgPool;

use crate::database::models::{
    Announcement, ContactSubmission, CoreEducationProgram, Event, Kindergarten, ParentTestimonial, Staff, UserListing,
};
use crate::services::content_service::ContentService;
use crate::services::message_service::MessageService;
use crate::services::upload_service::UploadService;
use crate::services::user_service::UserService;
use crate::services::ServiceResult;

const RECENT: i32 = 5;

#[derive(Debug, Serialize)]
pub struct AdminDashboard {
    pub total_events: i64,
    pub total_staff: i64,
    pub total_programs: i64,
    pub total_testimonials: i64,
    pub unread_messages: i64,
    pub recent_messages: Vec<ContactSubmission>,
    pub recent_announcements: Vec<Announcement>,
}

#[derive(Debug, Serialize)]
pub struct SystemDashboard {
    pub total_kindergartens: i64,
    pub active_kindergartens: i64,
    pub total_users: i64,
    pub active_users: i64,
    pub recent_kindergartens: Vec<Kindergarten>,
    pub recent_users: Vec<UserListing>,
}

pub struct DashboardService {
    pool: PgPool,
}

impl DashboardService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn admin(&self, kindergarten_id: i32) -> ServiceResult<AdminDashboard> {
        let uploads = UploadService::from_config();
        let events = ContentService::<Event>::new(self.pool.clone(), kindergarten_id, uploads.clone());
        let staff = ContentService::<Staff>::new(self.pool.clone(), kindergarten_id, uploads.clone());
        let programs = ContentService::<CoreEducationProgram>::new(self.pool.clone(), kindergarten_id, uploads.clone());
        let testimonials = ContentService::<ParentTestimonial>::new(self.pool.clone(), kindergarten_id, uploads.clone());
        let announcements = ContentService::<Announcement>::new(self.pool.clone(), kindergarten_id, uploads.clone());
        let messages = MessageService::new(self.pool.clone(), kindergarten_id, uploads);

        let (total_events, total_staff, total_programs, total_testimonials, unread_messages) = futures::try_join!(
            events.count(None),
            staff.count(None),
            programs.count(None),
            testimonials.count(None),
            messages.unread_count(),
        )?;

        let (recent_messages, recent_announcements) =
            futures::try_join!(messages.recent(RECENT), announcements.list_recent(RECENT))?;

        Ok(AdminDashboard {
            total_events,
            total_staff,
            total_programs,
            total_testimonials,
            unread_messages,
            recent_messages,
            recent_announcements,
        })
    }

    pub async fn system(&self) -> ServiceResult<SystemDashboard> {
        let (kindergartens, users) = futures::try_join!(
            sqlx::query_as::<_, (i64, i64)>(
                "SELECT COUNT(*), COUNT(*) FILTER (WHERE is_active AND trashed_at IS NULL) FROM kindergartens"
            )
            .fetch_one(&self.pool),
            sqlx::query_as::<_, (i64, i64)>("SELECT COUNT(*), COUNT(*) FILTER (WHERE is_active) FROM users")
                .fetch_one(&self.pool),
        )?;

        let recent_kindergartens = sqlx::query_as::<_, Kindergarten>(
            "SELECT * FROM kindergartens ORDER BY created_at DESC, id DESC LIMIT $1",
        )
        .bind(RECENT as i64)
        .fetch_all(&self.pool)
        .await?;
        let recent_users = UserService::new(self.pool.clone()).list_recent(RECENT as i64).await?;

        Ok(SystemDashboard {
            total_kindergartens: kindergartens.0,
            active_kindergartens: kindergartens.1,
            total_users: users.0,
            active_users: users.1,
            recent_kindergartens,
            recent_users,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dashboard_serializes_counts() {
        let dashboard = AdminDashboard {
            total_events: 2,
            total_staff: 3,
            total_programs: 4,
            total_testimonials: 1,
            unread_messages: 7,
            recent_messages: vec![],
            recent_announcements: vec![],
        };
        let value = serde_json::to_value(&dashboard).unwrap();
        assert_eq!(value, json!({
            "total_events": 2,
            "total_staff": 3,
            "total_programs": 4,
            "total_testimonials": 1,
            "unread_messages": 7,
            "recent_messages": [],
            "recent_announcements": [],
        }));
    }
}
