// handlers/public/auth/logout.rs - POST /auth/logout handler

use axum_extra::extract::cookie::CookieJar;
use serde_json::{json, Value};

use crate::middleware::ApiResponse;

use super::session::clear_session_cookie;

/// POST /auth/logout - Clear the session cookie
///
/// Tokens are stateless; bearer clients simply discard theirs.
pub async fn logout_post(jar: CookieJar) -> (CookieJar, ApiResponse<Value>) {
    (clear_session_cookie(jar), ApiResponse::success(json!({ "logged_out": true })))
}
