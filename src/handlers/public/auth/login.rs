// handlers/public/auth/login.rs - GET/POST /auth/login handlers

use axum::http::{HeaderMap, Uri};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use crate::auth::{Claims, SessionTenant};
use crate::config;
use crate::database::manager::DatabaseManager;
use crate::error::ApiError;
use crate::extract::Json;
use crate::middleware::validate_tenant::requested_subdomain;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::site_service::SiteKindergarten;
use crate::services::{KindergartenService, UserService};
use crate::tenant::TenantError;

use super::session::{session_cookie, SessionResponse};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
    /// Overrides the kindergarten resolved from the host.
    #[serde(default)]
    pub kindergarten_id: Option<i32>,
}

/// What the login screen for a host should offer.
#[derive(Debug, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LoginContext {
    Kindergarten { kindergarten: SiteKindergarten },
    System { title: &'static str },
    Select { kindergartens: Vec<SiteKindergarten> },
}

fn site_kindergarten(k: &crate::database::models::Kindergarten) -> SiteKindergarten {
    SiteKindergarten { id: k.id, name: k.name.clone(), subdomain: k.subdomain.clone() }
}

fn is_admin_host(subdomain: Option<&str>) -> bool {
    subdomain == Some(config::config().tenancy.admin_subdomain.as_str())
}

/**
 * GET /auth/login - Login context for the request host
 *
 * Expected Output:
 * ```json
 * { "success": true, "data": { "mode": "kindergarten", "kindergarten": { "id": 1, "name": "Örnek Kreş", "subdomain": "ornek" } } }
 * { "success": true, "data": { "mode": "system", "title": "System Admin" } }
 * { "success": true, "data": { "mode": "select", "kindergartens": [ ... ] } }
 * ```
 */
pub async fn login_get(headers: HeaderMap, uri: Uri) -> ApiResult<LoginContext> {
    let subdomain = requested_subdomain(&headers, &uri);
    if is_admin_host(subdomain.as_deref()) {
        return Ok(ApiResponse::success(LoginContext::System { title: "System Admin" }));
    }

    let kindergartens = KindergartenService::new(DatabaseManager::pool().await?);
    if let Some(subdomain) = subdomain {
        if let Some(kindergarten) = kindergartens.find_active_by_subdomain(&subdomain).await? {
            return Ok(ApiResponse::success(LoginContext::Kindergarten {
                kindergarten: site_kindergarten(&kindergarten),
            }));
        }
    }

    let active = kindergartens.list_active().await?;
    Ok(ApiResponse::success(LoginContext::Select {
        kindergartens: active.iter().map(site_kindergarten).collect(),
    }))
}

/**
 * POST /auth/login - Authenticate and start a session
 *
 * Expected Input:
 * ```json
 * {
 *   "email": "admin@ornek.com",   // Required
 *   "password": "admin123",       // Required
 *   "remember_me": false,         // Optional: 30 day session instead of 1 hour
 *   "kindergarten_id": 1          // Optional: overrides the host subdomain
 * }
 * ```
 *
 * Expected Output (Success):
 * ```json
 * {
 *   "success": true,
 *   "data": {
 *     "token": "eyJhbGciOiJIUzI1NiI...",
 *     "expires_in": 3600,
 *     "user": { "id": 2, "username": "admin", "role": "KindergartenAdmin", "kindergarten_id": 1, ... }
 *   }
 * }
 * ```
 *
 * The token is also set as an HttpOnly session cookie. Unknown users and
 * wrong passwords both answer 401 "Invalid email or password".
 */
pub async fn login_post(
    headers: HeaderMap,
    uri: Uri,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, ApiResponse<SessionResponse>), ApiError> {
    let pool = DatabaseManager::pool().await?;

    let kindergarten_id = match payload.kindergarten_id {
        Some(id) => Some(id),
        None => {
            let subdomain = requested_subdomain(&headers, &uri);
            match subdomain {
                Some(s) if !is_admin_host(Some(&s)) => {
                    let kindergarten = KindergartenService::new(pool.clone())
                        .find_active_by_subdomain(&s)
                        .await?
                        .ok_or(TenantError::NotFound(s))?;
                    Some(kindergarten.id)
                }
                _ => None,
            }
        }
    };

    let (user, kindergarten) = UserService::new(pool)
        .authenticate(&payload.email, &payload.password, kindergarten_id)
        .await?;

    let tenant = kindergarten.map(|k| SessionTenant { id: k.id, name: k.name, subdomain: k.subdomain });
    let claims = Claims::new(user.id, user.username, user.email, user.role, tenant, payload.remember_me);
    let session = SessionResponse::issue(&claims)?;

    tracing::info!("User {} ({}) signed in", claims.email, claims.role);
    let jar = jar.add(session_cookie(session.token.clone(), payload.remember_me));
    Ok((jar, ApiResponse::success(session)))
}
