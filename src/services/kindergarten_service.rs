use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use tracing::info;

use crate::database::models::Kindergarten;
use crate::database::Repository;
use crate::filter::FilterData;
use crate::services::validation::ValidationErrors;
use crate::services::{ServiceError, ServiceResult};
use crate::tenant::validate_subdomain;

pub const DEFAULT_SLOGAN: &str = "Welcome to Our Kindergarten";
pub const DEFAULT_SUB_SLOGAN: &str = "A safe and nurturing environment for your children";
pub const DEFAULT_MISSION_TITLE: &str = "Our Mission";
pub const DEFAULT_MISSION_TEXT: &str = "To provide quality early childhood education in a nurturing environment.";
pub const DEFAULT_VISION_TITLE: &str = "Our Vision";
pub const DEFAULT_VISION_TEXT: &str = "To be a leading kindergarten that prepares children for lifelong learning.";
pub const DEFAULT_ABOUT_TITLE: &str = "About Our Kindergarten";
pub const DEFAULT_ABOUT_TEXT: &str = "We are dedicated to providing the best early childhood education experience.";

const SUBDOMAIN_TAKEN: &str = "This subdomain is already taken.";

#[derive(Debug, Clone, Deserialize)]
pub struct KindergartenInput {
    pub name: String,
    pub subdomain: String,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl KindergartenInput {
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            subdomain: self.subdomain.trim().to_ascii_lowercase(),
            is_active: self.is_active,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors
            .required("name", &self.name)
            .max_len("name", Some(&self.name), 200)
            .required("subdomain", &self.subdomain)
            .max_len("subdomain", Some(&self.subdomain), 100);
        if errors.get("subdomain").is_none() {
            if let Err(e) = validate_subdomain(&self.subdomain) {
                errors.add("subdomain", e.to_string());
            }
        }
        errors.into_result()
    }
}

pub struct KindergartenService {
    pool: PgPool,
}

impl KindergartenService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn repository(&self) -> Repository<Kindergarten> {
        Repository::new("kindergartens", self.pool.clone())
    }

    /// Newest first; soft-deleted rows only when asked for.
    pub async fn list(&self, include_trashed: bool) -> ServiceResult<Vec<Kindergarten>> {
        let where_clause = (!include_trashed).then(|| json!({ "trashed_at": null }));
        Ok(self
            .repository()
            .select_any(FilterData {
                where_clause,
                order: Some(json!("created_at desc, id desc")),
                ..Default::default()
            })
            .await?)
    }

    /// Kindergartens that can be logged into or browsed, by name.
    pub async fn list_active(&self) -> ServiceResult<Vec<Kindergarten>> {
        Ok(self
            .repository()
            .select_any(FilterData {
                where_clause: Some(json!({ "is_active": true, "trashed_at": null })),
                order: Some(json!("name asc")),
                ..Default::default()
            })
            .await?)
    }

    pub async fn get(&self, id: i32) -> ServiceResult<Kindergarten> {
        Ok(self
            .repository()
            .select_404(
                FilterData { where_clause: Some(json!({ "id": id })), ..Default::default() },
                "Kindergarten",
            )
            .await?)
    }

    pub async fn find_active(&self, id: i32) -> ServiceResult<Option<Kindergarten>> {
        Ok(self
            .repository()
            .select_one(FilterData {
                where_clause: Some(json!({ "id": id, "is_active": true, "trashed_at": null })),
                ..Default::default()
            })
            .await?)
    }

    pub async fn find_active_by_subdomain(&self, subdomain: &str) -> ServiceResult<Option<Kindergarten>> {
        let row = sqlx::query_as::<_, Kindergarten>(
            "SELECT * FROM kindergartens \
             WHERE LOWER(subdomain) = LOWER($1) AND is_active = TRUE AND trashed_at IS NULL",
        )
        .bind(subdomain.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn find_by_subdomain(&self, subdomain: &str) -> ServiceResult<Option<Kindergarten>> {
        let row = sqlx::query_as::<_, Kindergarten>("SELECT * FROM kindergartens WHERE LOWER(subdomain) = LOWER($1)")
            .bind(subdomain.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn subdomain_taken(&self, subdomain: &str, except_id: Option<i32>) -> ServiceResult<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM kindergartens WHERE LOWER(subdomain) = LOWER($1) AND ($2::INTEGER IS NULL OR id <> $2))",
        )
        .bind(subdomain)
        .bind(except_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    /// Create a kindergarten together with its default site content.
    pub async fn create(&self, input: KindergartenInput) -> ServiceResult<Kindergarten> {
        let input = input.normalized();
        input.validate()?;

        if self.subdomain_taken(&input.subdomain, None).await? {
            return Err(ServiceError::Conflict(SUBDOMAIN_TAKEN.to_string()));
        }

        let mut tx = self.pool.begin().await?;

        let kindergarten = sqlx::query_as::<_, Kindergarten>(
            "INSERT INTO kindergartens (name, subdomain, is_active) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(&input.name)
        .bind(&input.subdomain)
        .bind(input.is_active.unwrap_or(true))
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO general_settings (kindergarten_id, slogan, sub_slogan) VALUES ($1, $2, $3)")
            .bind(kindergarten.id)
            .bind(DEFAULT_SLOGAN)
            .bind(DEFAULT_SUB_SLOGAN)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO mission_visions (kindergarten_id, mission_title, mission_text, vision_title, vision_text) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(kindergarten.id)
        .bind(DEFAULT_MISSION_TITLE)
        .bind(DEFAULT_MISSION_TEXT)
        .bind(DEFAULT_VISION_TITLE)
        .bind(DEFAULT_VISION_TEXT)
        .execute(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO about_us_contents (kindergarten_id, title, description) VALUES ($1, $2, $3)")
            .bind(kindergarten.id)
            .bind(DEFAULT_ABOUT_TITLE)
            .bind(DEFAULT_ABOUT_TEXT)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!("Created kindergarten '{}' ({}) with id {}", kindergarten.name, kindergarten.subdomain, kindergarten.id);
        Ok(kindergarten)
    }

    pub async fn update(&self, id: i32, input: KindergartenInput) -> ServiceResult<Kindergarten> {
        let input = input.normalized();
        input.validate()?;
        let current = self.get(id).await?;

        if self.subdomain_taken(&input.subdomain, Some(id)).await? {
            return Err(ServiceError::Conflict(SUBDOMAIN_TAKEN.to_string()));
        }

        let updated = sqlx::query_as::<_, Kindergarten>(
            "UPDATE kindergartens SET name = $1, subdomain = $2, is_active = $3, updated_at = NOW() \
             WHERE id = $4 RETURNING *",
        )
        .bind(&input.name)
        .bind(&input.subdomain)
        .bind(input.is_active.unwrap_or(current.is_active))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        info!("Updated kindergarten {} ({})", updated.id, updated.subdomain);
        Ok(updated)
    }

    pub async fn set_active(&self, id: i32, is_active: bool) -> ServiceResult<Kindergarten> {
        sqlx::query_as::<_, Kindergarten>(
            "UPDATE kindergartens SET is_active = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
        .bind(is_active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Kindergarten not found".to_string()))
    }

    /// Soft delete: the row and its content stay, the site stops resolving.
    pub async fn delete(&self, id: i32) -> ServiceResult<Kindergarten> {
        let trashed = sqlx::query_as::<_, Kindergarten>(
            "UPDATE kindergartens SET trashed_at = NOW(), is_active = FALSE, updated_at = NOW() \
             WHERE id = $1 AND trashed_at IS NULL RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Kindergarten not found".to_string()))?;

        info!("Trashed kindergarten {} ({})", trashed.id, trashed.subdomain);
        Ok(trashed)
    }

    pub async fn restore(&self, id: i32) -> ServiceResult<Kindergarten> {
        let restored = sqlx::query_as::<_, Kindergarten>(
            "UPDATE kindergartens SET trashed_at = NULL, is_active = TRUE, updated_at = NOW() \
             WHERE id = $1 AND trashed_at IS NOT NULL RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Trashed kindergarten not found".to_string()))?;

        info!("Restored kindergarten {} ({})", restored.id, restored.subdomain);
        Ok(restored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, subdomain: &str) -> KindergartenInput {
        KindergartenInput { name: name.to_string(), subdomain: subdomain.to_string(), is_active: None }
    }

    #[test]
    fn normalizes_subdomain_case() {
        let normalized = input(" Güneş Kreş ", " Gunes ").normalized();
        assert_eq!(normalized.name, "Güneş Kreş");
        assert_eq!(normalized.subdomain, "gunes");
        assert!(normalized.validate().is_ok());
    }

    #[test]
    fn rejects_reserved_and_malformed_subdomains() {
        let errors = input("Kreş", "admin").normalized().validate().unwrap_err();
        assert!(errors.get("subdomain").is_some_and(|m| m.contains("reserved")));

        let errors = input("", "bad_sub").validate().unwrap_err();
        assert_eq!(errors.get("name"), Some("This field is required"));
        assert!(errors.get("subdomain").is_some());
    }
}
