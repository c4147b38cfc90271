use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::auth::{validate_jwt, AuthError, Claims, Role};
use crate::config;
use crate::error::ApiError;

/// Authenticated principal decoded from the session token.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: i32,
    pub kindergarten_id: Option<i32>,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub claims: Claims,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            kindergarten_id: claims.kindergarten_id,
            username: claims.username.clone(),
            email: claims.email.clone(),
            role: claims.role,
            claims,
        }
    }
}

/// Session token from the `Authorization: Bearer` header, falling back to the session cookie.
pub fn extract_token(headers: &HeaderMap) -> Result<String, AuthError> {
    if let Some(value) = headers.get(AUTHORIZATION) {
        let value = value
            .to_str()
            .map_err(|_| AuthError::InvalidToken("Invalid Authorization header format".to_string()))?;
        let token = value
            .strip_prefix("Bearer ")
            .ok_or_else(|| AuthError::InvalidToken("Authorization header must use Bearer token format".to_string()))?;
        if token.trim().is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        return Ok(token.trim().to_string());
    }

    let jar = CookieJar::from_headers(headers);
    jar.get(&config::config().security.cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(AuthError::MissingCredentials)
}

/// JWT authentication middleware: decodes the session and injects [`AuthUser`].
pub async fn jwt_auth_middleware(headers: HeaderMap, mut request: Request, next: Next) -> Result<Response, ApiError> {
    let token = extract_token(&headers)?;
    let claims = validate_jwt(&token).map_err(|e| {
        tracing::debug!("Rejected session token: {}", e);
        ApiError::from(e)
    })?;

    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}

/// Role gate for a route group. Must run after [`jwt_auth_middleware`].
pub async fn require_roles(
    State(allowed): State<&'static [Role]>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !allowed.contains(&auth_user.role) {
        tracing::warn!(
            "Denied {} {} to {} ({})",
            request.method(),
            request.uri().path(),
            auth_user.email,
            auth_user.role
        );
        return Err(ApiError::forbidden("You do not have permission to access this page"));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer header-token".parse().unwrap());
        headers.insert(COOKIE, "kinder_session=cookie-token".parse().unwrap());
        assert_eq!(extract_token(&headers).unwrap(), "header-token");
    }

    #[test]
    fn session_cookie_is_accepted() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, "theme=dark; kinder_session=cookie-token".parse().unwrap());
        assert_eq!(extract_token(&headers).unwrap(), "cookie-token");
    }

    #[test]
    fn missing_credentials() {
        assert!(matches!(extract_token(&HeaderMap::new()), Err(AuthError::MissingCredentials)));
    }

    #[test]
    fn non_bearer_scheme_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Basic dXNlcjpwYXNz".parse().unwrap());
        assert!(matches!(extract_token(&headers), Err(AuthError::InvalidToken(_))));
    }
}
