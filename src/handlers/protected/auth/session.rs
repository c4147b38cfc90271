use axum::extract::Extension;
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;

use crate::auth::Role;
use crate::error::ApiError;
use crate::handlers::public::auth::{session_cookie, SessionResponse};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidatedUser};

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub kindergarten_id: Option<i32>,
    pub kindergarten_name: String,
    pub subdomain: String,
    pub expires_in: i64,
}

/// GET /api/auth/whoami - Current principal
///
/// Expected Output:
/// ```json
/// {
///   "success": true,
///   "data": {
///     "id": 2,
///     "username": "admin",
///     "email": "admin@ornek.com",
///     "role": "KindergartenAdmin",
///     "kindergarten_id": 1,
///     "kindergarten_name": "Örnek Kreş",
///     "subdomain": "ornek",
///     "expires_in": 3412
///   }
/// }
/// ```
pub async fn session_whoami(
    Extension(auth_user): Extension<AuthUser>,
    Extension(ValidatedUser(user)): Extension<ValidatedUser>,
) -> ApiResult<WhoAmI> {
    Ok(ApiResponse::success(WhoAmI {
        id: user.id,
        username: user.username,
        email: user.email,
        role: user.role,
        kindergarten_id: user.kindergarten_id,
        kindergarten_name: auth_user.claims.kindergarten_name.clone(),
        subdomain: auth_user.claims.subdomain.clone(),
        expires_in: auth_user.claims.expires_in(),
    }))
}

/// PUT /api/auth/session/refresh - Re-issue the session with a fresh expiry
pub async fn session_refresh(
    Extension(auth_user): Extension<AuthUser>,
    jar: CookieJar,
) -> Result<(CookieJar, ApiResponse<SessionResponse>), ApiError> {
    let claims = auth_user.claims.renewed();
    let session = SessionResponse::issue(&claims)?;
    let jar = jar.add(session_cookie(session.token.clone(), claims.remember_me));
    Ok((jar, ApiResponse::success(session)))
}
