use serde::Deserialize;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::auth::{hash_password, verify_against_dummy, verify_password, AuthError, Role};
use crate::config;
use crate::database::models::{Kindergarten, User, UserListing};
use crate::services::validation::ValidationErrors;
use crate::services::{ServiceError, ServiceResult};

const EMAIL_TAKEN: &str = "This email is already registered.";

const LISTING_SELECT: &str = "SELECT u.id, u.kindergarten_id, k.name AS kindergarten_name, u.username, u.email, \
     u.role, u.is_active, u.created_at \
     FROM users u LEFT JOIN kindergartens k ON k.id = u.kindergarten_id";

#[derive(Debug, Clone, Deserialize)]
pub struct UserInput {
    pub username: String,
    pub email: String,
    /// Required on create; on update a blank value keeps the current password.
    #[serde(default)]
    pub password: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub kindergarten_id: Option<i32>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl UserInput {
    fn normalized(self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.filter(|p| !p.is_empty()),
            kindergarten_id: if self.role.is_system() { None } else { self.kindergarten_id },
            ..self
        }
    }

    fn validate(&self, creating: bool) -> Result<(), ValidationErrors> {
        let min_len = config::config().security.min_password_length;
        let mut errors = ValidationErrors::new();
        errors
            .required("username", &self.username)
            .max_len("username", Some(&self.username), 100)
            .required("email", &self.email)
            .max_len("email", Some(&self.email), 200)
            .email("email", Some(&self.email));

        match self.password.as_deref() {
            None if creating => errors.add("password", "This field is required"),
            Some(p) if p.chars().count() < min_len => {
                errors.add("password", format!("Must be at least {} characters", min_len))
            }
            _ => {}
        }

        if !self.role.is_system() && self.kindergarten_id.is_none() {
            errors.add("kindergarten_id", "A kindergarten is required for this role");
        }
        errors.into_result()
    }
}

pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Newest first, with the owning kindergarten's name.
    pub async fn list(&self) -> ServiceResult<Vec<UserListing>> {
        let query = format!("{} ORDER BY u.created_at DESC, u.id DESC", LISTING_SELECT);
        Ok(sqlx::query_as::<_, UserListing>(&query).fetch_all(&self.pool).await?)
    }

    pub async fn list_recent(&self, limit: i64) -> ServiceResult<Vec<UserListing>> {
        let query = format!("{} ORDER BY u.created_at DESC, u.id DESC LIMIT $1", LISTING_SELECT);
        Ok(sqlx::query_as::<_, UserListing>(&query).bind(limit).fetch_all(&self.pool).await?)
    }

    pub async fn get(&self, id: i32) -> ServiceResult<UserListing> {
        let query = format!("{} WHERE u.id = $1", LISTING_SELECT);
        sqlx::query_as::<_, UserListing>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))
    }

    pub async fn find(&self, id: i32) -> ServiceResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn find_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn email_taken(&self, email: &str, except_id: Option<i32>) -> ServiceResult<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1) AND ($2::INTEGER IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(except_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn ensure_kindergarten(&self, kindergarten_id: Option<i32>) -> ServiceResult<()> {
        let Some(id) = kindergarten_id else {
            return Ok(());
        };
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM kindergartens WHERE id = $1 AND trashed_at IS NULL)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        if exists {
            Ok(())
        } else {
            Err(ServiceError::Validation(ValidationErrors::single(
                "kindergarten_id",
                "Kindergarten does not exist",
            )))
        }
    }

    pub async fn create(&self, input: UserInput) -> ServiceResult<User> {
        let input = input.normalized();
        input.validate(true)?;
        self.ensure_kindergarten(input.kindergarten_id).await?;

        if self.email_taken(&input.email, None).await? {
            return Err(ServiceError::Conflict(EMAIL_TAKEN.to_string()));
        }

        let password_hash = hash_in_background(input.password.clone().unwrap_or_default()).await?;

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (kindergarten_id, username, email, password_hash, role, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(input.kindergarten_id)
        .bind(&input.username)
        .bind(&input.email)
        .bind(&password_hash)
        .bind(input.role.as_str())
        .bind(input.is_active.unwrap_or(true))
        .fetch_one(&self.pool)
        .await?;

        info!("Created {} user {} ({})", user.role, user.id, user.email);
        Ok(user)
    }

    /// Replace profile fields; the password only changes when a new one is given.
    pub async fn update(&self, id: i32, input: UserInput, acting_user_id: i32) -> ServiceResult<User> {
        let input = input.normalized();
        input.validate(false)?;
        let current = self
            .find(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

        if id == acting_user_id {
            if input.is_active == Some(false) {
                return Err(ServiceError::Forbidden("You cannot deactivate your own account.".to_string()));
            }
            if input.role != current.role {
                return Err(ServiceError::Forbidden("You cannot change your own role.".to_string()));
            }
        }

        self.ensure_kindergarten(input.kindergarten_id).await?;
        if self.email_taken(&input.email, Some(id)).await? {
            return Err(ServiceError::Conflict(EMAIL_TAKEN.to_string()));
        }

        let password_hash = match input.password.clone() {
            Some(password) => hash_in_background(password).await?,
            None => current.password_hash.clone(),
        };

        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET kindergarten_id = $1, username = $2, email = $3, password_hash = $4, role = $5, \
             is_active = $6 WHERE id = $7 RETURNING *",
        )
        .bind(input.kindergarten_id)
        .bind(&input.username)
        .bind(&input.email)
        .bind(&password_hash)
        .bind(input.role.as_str())
        .bind(input.is_active.unwrap_or(current.is_active))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        info!("Updated user {} ({})", user.id, user.email);
        Ok(user)
    }

    pub async fn delete(&self, id: i32, acting_user_id: i32) -> ServiceResult<User> {
        if id == acting_user_id {
            return Err(ServiceError::Forbidden("You cannot delete your own account.".to_string()));
        }
        let user = sqlx::query_as::<_, User>("DELETE FROM users WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;
        info!("Deleted user {} ({})", user.id, user.email);
        Ok(user)
    }

    pub async fn set_password(&self, email: &str, password: &str) -> ServiceResult<User> {
        let min_len = config::config().security.min_password_length;
        if password.chars().count() < min_len {
            return Err(ServiceError::Validation(ValidationErrors::single(
                "password",
                format!("Must be at least {} characters", min_len),
            )));
        }
        let password_hash = hash_in_background(password.to_string()).await?;
        sqlx::query_as::<_, User>("UPDATE users SET password_hash = $1 WHERE LOWER(email) = LOWER($2) RETURNING *")
            .bind(&password_hash)
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("No user with email '{}'", email)))
    }

    /// Resolve login credentials to an active account.
    ///
    /// Without a kindergarten only an active SuperAdmin can sign in; with one
    /// the user must belong to that active kindergarten. Every failure is the
    /// same `InvalidCredentials`, and every attempt that reaches the lookup
    /// runs one Argon2 verification, against a dummy hash when no account
    /// matched.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
        kindergarten_id: Option<i32>,
    ) -> ServiceResult<(User, Option<Kindergarten>)> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials.into());
        }

        if kindergarten_id.is_none() {
            let admin = sqlx::query_as::<_, User>(
                "SELECT * FROM users WHERE LOWER(email) = LOWER($1) AND role = 'SuperAdmin' AND is_active = TRUE",
            )
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

            let verified = match &admin {
                Some(admin) => verify_in_background(password.to_string(), admin.password_hash.clone()).await,
                None => verify_dummy_in_background(password.to_string()).await,
            };
            if let (true, Some(admin)) = (verified, admin) {
                return Ok((admin, None));
            }
            warn!("Failed system login for {}", email);
            return Err(AuthError::InvalidCredentials.into());
        }

        let Some(kindergarten_id) = kindergarten_id else {
            return Err(AuthError::InvalidCredentials.into());
        };

        let kindergarten = sqlx::query_as::<_, Kindergarten>(
            "SELECT * FROM kindergartens WHERE id = $1 AND is_active = TRUE AND trashed_at IS NULL",
        )
        .bind(kindergarten_id)
        .fetch_optional(&self.pool)
        .await?;

        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE LOWER(email) = LOWER($1) AND kindergarten_id = $2 AND is_active = TRUE",
        )
        .bind(email)
        .bind(kindergarten_id)
        .fetch_optional(&self.pool)
        .await?;

        match (user, kindergarten) {
            (Some(user), Some(kindergarten))
                if verify_in_background(password.to_string(), user.password_hash.clone()).await =>
            {
                Ok((user, Some(kindergarten)))
            }
            (Some(_), Some(_)) => {
                warn!("Failed login for {} in kindergarten {}", email, kindergarten_id);
                Err(AuthError::InvalidCredentials.into())
            }
            _ => {
                verify_dummy_in_background(password.to_string()).await;
                warn!("Failed login for {} in kindergarten {}", email, kindergarten_id);
                Err(AuthError::InvalidCredentials.into())
            }
        }
    }
}

/// Argon2 is deliberately slow; keep it off the async workers.
async fn hash_in_background(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AuthError::PasswordHash(e.to_string()))?
}

async fn verify_in_background(password: String, hash: String) -> bool {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .unwrap_or(false)
}

/// Same cost as a real verification for accounts that do not exist.
async fn verify_dummy_in_background(password: String) -> bool {
    tokio::task::spawn_blocking(move || verify_against_dummy(&password))
        .await
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(role: Role, kindergarten_id: Option<i32>, password: Option<&str>) -> UserInput {
        UserInput {
            username: " ayse ".to_string(),
            email: " ayse@ornek.com ".to_string(),
            password: password.map(str::to_string),
            role,
            kindergarten_id,
            is_active: None,
        }
    }

    #[test]
    fn superadmin_is_never_bound_to_a_kindergarten() {
        let normalized = input(Role::SuperAdmin, Some(4), Some("longenough")).normalized();
        assert_eq!(normalized.kindergarten_id, None);
        assert_eq!(normalized.email, "ayse@ornek.com");
        assert!(normalized.validate(true).is_ok());
    }

    #[test]
    fn tenant_roles_need_a_kindergarten() {
        let errors = input(Role::Teacher, None, Some("longenough")).normalized().validate(true).unwrap_err();
        assert!(errors.get("kindergarten_id").is_some());
    }

    #[test]
    fn password_rules_differ_for_create_and_update() {
        let missing = input(Role::Teacher, Some(1), None).normalized();
        assert_eq!(missing.validate(true).unwrap_err().get("password"), Some("This field is required"));
        assert!(missing.validate(false).is_ok());

        let blank = input(Role::Teacher, Some(1), Some("")).normalized();
        assert!(blank.password.is_none());

        let short = input(Role::Teacher, Some(1), Some("short")).normalized();
        assert!(short.validate(false).unwrap_err().get("password").is_some());
    }

    #[tokio::test]
    async fn background_hashing_verifies() {
        let hash = hash_in_background("teacher123".to_string()).await.unwrap();
        assert!(verify_in_background("teacher123".to_string(), hash.clone()).await);
        assert!(!verify_in_background("wrong".to_string(), hash).await);
    }

    #[tokio::test]
    async fn missing_accounts_never_verify() {
        assert!(!verify_dummy_in_background("admin123".to_string()).await);
        assert!(!verify_dummy_in_background(String::new()).await);
    }
}
