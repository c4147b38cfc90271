// handlers/public/auth/session.rs - Session token and cookie helpers

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;

use crate::auth::{generate_jwt, AuthError, Claims, Role};
use crate::config;

/// Body returned by login and refresh.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub expires_in: i64,
    pub user: SessionUser,
}

#[derive(Debug, Serialize)]
pub struct SessionUser {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub kindergarten_id: Option<i32>,
    pub kindergarten_name: String,
    pub subdomain: String,
}

impl SessionResponse {
    pub fn issue(claims: &Claims) -> Result<Self, AuthError> {
        Ok(Self {
            token: generate_jwt(claims)?,
            expires_in: claims.expires_in(),
            user: SessionUser {
                id: claims.user_id,
                username: claims.username.clone(),
                email: claims.email.clone(),
                role: claims.role,
                kindergarten_id: claims.kindergarten_id,
                kindergarten_name: claims.kindergarten_name.clone(),
                subdomain: claims.subdomain.clone(),
            },
        })
    }
}

/// HttpOnly session cookie. Persistent only for remember-me sessions.
pub fn session_cookie(token: String, remember_me: bool) -> Cookie<'static> {
    let security = &config::config().security;
    let mut cookie = Cookie::build((security.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(security.require_https);
    if remember_me {
        cookie = cookie.max_age(time::Duration::days(security.remember_me_days));
    }
    cookie.build()
}

pub fn clear_session_cookie(jar: CookieJar) -> CookieJar {
    let name = config::config().security.cookie_name.clone();
    jar.remove(Cookie::build(name).path("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_is_http_only() {
        let cookie = session_cookie("abc".to_string(), false);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert!(cookie.max_age().is_none());
    }

    #[test]
    fn remember_me_cookie_persists() {
        let cookie = session_cookie("abc".to_string(), true);
        assert_eq!(cookie.max_age(), Some(time::Duration::days(30)));
    }
}
