//! Development fixture: one sample kindergarten with accounts and content.
//!
//! The data lives in `fixtures/seed.yaml`. Seeding is idempotent: an
//! existing subdomain or email is left untouched.

use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use sqlx::PgPool;
use tracing::info;

use crate::auth::Role;
use crate::database::models::{Announcement, CoreEducationProgram, Event, Staff};
use crate::services::content_service::{ContentEntity, ContentForm, ContentService};
use crate::services::kindergarten_service::{KindergartenInput, KindergartenService};
use crate::services::site_service::SiteService;
use crate::services::upload_service::UploadService;
use crate::services::user_service::{UserInput, UserService};
use crate::services::{ServiceError, ServiceResult};

const FIXTURE: &str = include_str!("../../fixtures/seed.yaml");

#[derive(Debug, Deserialize)]
pub struct SeedFixture {
    pub kindergarten: SeedKindergarten,
    pub users: Vec<SeedUser>,
    #[serde(default)]
    pub settings: Map<String, Value>,
    #[serde(default)]
    pub programs: Vec<Map<String, Value>>,
    #[serde(default)]
    pub events: Vec<Map<String, Value>>,
    #[serde(default)]
    pub staff: Vec<Map<String, Value>>,
    #[serde(default)]
    pub announcements: Vec<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
pub struct SeedKindergarten {
    pub name: String,
    pub subdomain: String,
}

#[derive(Debug, Deserialize)]
pub struct SeedUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Default, serde::Serialize)]
pub struct SeedReport {
    pub kindergarten_id: Option<i32>,
    pub kindergarten_created: bool,
    pub users_created: Vec<String>,
    pub users_skipped: Vec<String>,
}

pub fn load_fixture() -> Result<SeedFixture, serde_yaml::Error> {
    serde_yaml::from_str(FIXTURE)
}

/// Replace a `days_from_now` offset with an RFC 3339 timestamp in `column`.
fn resolve_offset(mut values: Map<String, Value>, column: &str) -> Map<String, Value> {
    if let Some(days) = values.remove("days_from_now").and_then(|v| v.as_i64()) {
        let at = Utc::now() + Duration::days(days);
        values.insert(column.to_string(), json!(at.to_rfc3339()));
    }
    values
}

async fn create_all<E: ContentEntity>(
    service: &ContentService<E>,
    rows: Vec<Map<String, Value>>,
    date_column: Option<&str>,
) -> ServiceResult<usize> {
    let mut created = 0;
    for row in rows {
        let row = match date_column {
            Some(column) => resolve_offset(row, column),
            None => row,
        };
        service.create(ContentForm::from_json(row)).await?;
        created += 1;
    }
    Ok(created)
}

pub async fn run(pool: PgPool, fixture: SeedFixture) -> ServiceResult<SeedReport> {
    let mut report = SeedReport::default();
    let kindergartens = KindergartenService::new(pool.clone());
    let users = UserService::new(pool.clone());
    let uploads = UploadService::from_config();

    let kindergarten = match kindergartens.find_by_subdomain(&fixture.kindergarten.subdomain).await? {
        Some(existing) => {
            info!("Kindergarten '{}' already exists, skipping content", existing.subdomain);
            existing
        }
        None => {
            let created = kindergartens
                .create(KindergartenInput {
                    name: fixture.kindergarten.name.clone(),
                    subdomain: fixture.kindergarten.subdomain.clone(),
                    is_active: Some(true),
                })
                .await?;
            report.kindergarten_created = true;

            let site = SiteService::new(pool.clone(), created.id, uploads.clone());
            site.update_settings(ContentForm::from_json(fixture.settings.clone())).await?;

            let programs = ContentService::<CoreEducationProgram>::new(pool.clone(), created.id, uploads.clone());
            let events = ContentService::<Event>::new(pool.clone(), created.id, uploads.clone());
            let staff = ContentService::<Staff>::new(pool.clone(), created.id, uploads.clone());
            let announcements = ContentService::<Announcement>::new(pool.clone(), created.id, uploads.clone());

            let count = create_all(&programs, fixture.programs, None).await?
                + create_all(&events, fixture.events, Some("event_date")).await?
                + create_all(&staff, fixture.staff, None).await?
                + create_all(&announcements, fixture.announcements, Some("announcement_date")).await?;
            info!("Seeded kindergarten '{}' with {} content records", created.subdomain, count);
            created
        }
    };
    report.kindergarten_id = Some(kindergarten.id);

    for user in fixture.users {
        if users.find_by_email(&user.email).await?.is_some() {
            report.users_skipped.push(user.email);
            continue;
        }
        let input = UserInput {
            username: user.username,
            email: user.email.clone(),
            password: Some(user.password),
            role: user.role,
            kindergarten_id: Some(kindergarten.id),
            is_active: Some(true),
        };
        match users.create(input).await {
            Ok(_) => report.users_created.push(user.email),
            Err(ServiceError::Conflict(_)) => report.users_skipped.push(user.email),
            Err(e) => return Err(e),
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_parses() {
        let fixture = load_fixture().unwrap();
        assert_eq!(fixture.kindergarten.subdomain, "ornek");
        assert_eq!(fixture.users.len(), 3);
        assert_eq!(fixture.users[0].role, Role::SuperAdmin);
        assert_eq!(fixture.programs.len(), 3);
        assert_eq!(fixture.events.len(), 2);
        assert_eq!(fixture.staff.len(), 2);
        assert_eq!(fixture.announcements.len(), 2);
        assert_eq!(fixture.settings["email"], "info@ornekkres.com");
    }

    #[test]
    fn fixture_content_passes_validation() {
        let fixture = load_fixture().unwrap();
        for row in fixture.programs {
            assert!(crate::services::content_service::prepare_input::<CoreEducationProgram>(row).is_ok());
        }
        for row in fixture.staff {
            assert!(crate::services::content_service::prepare_input::<Staff>(row).is_ok());
        }
    }

    #[test]
    fn day_offsets_become_dates() {
        let mut row = Map::new();
        row.insert("title".into(), json!("Veli Toplantısı"));
        row.insert("days_from_now".into(), json!(-2));
        let row = resolve_offset(row, "announcement_date");
        assert!(row.get("days_from_now").is_none());
        let date = row["announcement_date"].as_str().unwrap();
        let parsed = chrono::DateTime::parse_from_rfc3339(date).unwrap();
        assert!(parsed.with_timezone(&Utc) < Utc::now());
    }
}
