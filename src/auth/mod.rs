pub mod password;
pub mod role;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config;

pub use password::{hash_password, verify_against_dummy, verify_password, PasswordHasher};
pub use role::Role;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Authentication required")]
    MissingCredentials,

    #[error("Invalid session token: {0}")]
    InvalidToken(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),
}

/// Session claims. The tenant fields are copied from the kindergarten at
/// login so handlers can scope queries without another lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i32,
    /// `None` for SuperAdmin sessions.
    pub kindergarten_id: Option<i32>,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub kindergarten_name: String,
    pub subdomain: String,
    pub remember_me: bool,
    pub exp: i64,
    pub iat: i64,
}

/// Kindergarten identity carried into a new session.
#[derive(Debug, Clone)]
pub struct SessionTenant {
    pub id: i32,
    pub name: String,
    pub subdomain: String,
}

impl Claims {
    pub fn new(
        user_id: i32,
        username: impl Into<String>,
        email: impl Into<String>,
        role: Role,
        tenant: Option<SessionTenant>,
        remember_me: bool,
    ) -> Self {
        let now = Utc::now();
        let exp = (now + session_lifetime(remember_me)).timestamp();

        let (kindergarten_id, kindergarten_name, subdomain) = match tenant {
            Some(t) if !role.is_system() => (Some(t.id), t.name, t.subdomain),
            _ => (None, "System".to_string(), "system".to_string()),
        };

        Self {
            user_id,
            kindergarten_id,
            username: username.into(),
            email: email.into(),
            role,
            kindergarten_name,
            subdomain,
            remember_me,
            exp,
            iat: now.timestamp(),
        }
    }

    /// Same identity with a fresh expiry.
    pub fn renewed(&self) -> Self {
        let now = Utc::now();
        Self {
            exp: (now + session_lifetime(self.remember_me)).timestamp(),
            iat: now.timestamp(),
            ..self.clone()
        }
    }

    pub fn expires_in(&self) -> i64 {
        (self.exp - Utc::now().timestamp()).max(0)
    }
}

/// One hour by default, the configured number of days with remember-me.
pub fn session_lifetime(remember_me: bool) -> Duration {
    let security = &config::config().security;
    if remember_me {
        Duration::days(security.remember_me_days)
    } else {
        Duration::minutes(security.session_minutes)
    }
}

fn jwt_secret() -> Result<&'static str, AuthError> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }
    Ok(secret)
}

pub fn generate_jwt(claims: &Claims) -> Result<String, AuthError> {
    let encoding_key = EncodingKey::from_secret(jwt_secret()?.as_bytes());

    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

pub fn validate_jwt(token: &str) -> Result<Claims, AuthError> {
    let decoding_key = DecodingKey::from_secret(jwt_secret()?.as_bytes());

    decode::<Claims>(token, &decoding_key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| AuthError::InvalidToken(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant() -> SessionTenant {
        SessionTenant { id: 7, name: "Sunny Days".to_string(), subdomain: "sunny".to_string() }
    }

    #[test]
    fn tenant_claims_carry_kindergarten() {
        let claims = Claims::new(3, "admin", "admin@sunny.test", Role::KindergartenAdmin, Some(tenant()), false);
        assert_eq!(claims.kindergarten_id, Some(7));
        assert_eq!(claims.subdomain, "sunny");
        assert!(claims.expires_in() <= 60 * 60);
    }

    #[test]
    fn superadmin_claims_are_system_scoped() {
        let claims = Claims::new(1, "root", "root@system.test", Role::SuperAdmin, Some(tenant()), false);
        assert_eq!(claims.kindergarten_id, None);
        assert_eq!(claims.kindergarten_name, "System");
        assert_eq!(claims.subdomain, "system");
    }

    #[test]
    fn remember_me_extends_lifetime() {
        let short = Claims::new(3, "a", "a@b.test", Role::Teacher, Some(tenant()), false);
        let long = Claims::new(3, "a", "a@b.test", Role::Teacher, Some(tenant()), true);
        assert!(long.exp - short.exp > 29 * 24 * 60 * 60);
    }

    #[test]
    fn jwt_round_trip_preserves_claims() {
        let claims = Claims::new(3, "teacher", "t@sunny.test", Role::Teacher, Some(tenant()), false);
        let token = generate_jwt(&claims).unwrap();
        assert_eq!(validate_jwt(&token).unwrap(), claims);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let claims = Claims::new(3, "teacher", "t@sunny.test", Role::Teacher, Some(tenant()), false);
        let mut token = generate_jwt(&claims).unwrap();
        token.push('x');
        assert!(matches!(validate_jwt(&token), Err(AuthError::InvalidToken(_))));
    }
}
