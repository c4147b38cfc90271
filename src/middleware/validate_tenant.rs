use axum::{
    extract::Request,
    http::{HeaderMap, Uri},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::config;
use crate::database::manager::DatabaseManager;
use crate::database::models::Kindergarten;
use crate::error::ApiError;
use crate::services::KindergartenService;
use crate::tenant::{extract_subdomain, is_development_host, request_host, TenantError};

use super::auth::AuthUser;

/// Kindergarten a public site request was addressed to.
#[derive(Clone, Debug)]
pub struct SiteTenant(pub Kindergarten);

/// Kindergarten an admin request acts on.
#[derive(Clone, Debug)]
pub struct TenantScope {
    pub kindergarten_id: i32,
    pub kindergarten: Kindergarten,
}

fn query_param(uri: &Uri, key: &str) -> Option<String> {
    let query = uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// Subdomain a request addresses, from the host or (in development) `?subdomain=`.
pub fn requested_subdomain(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    let host = request_host(headers).unwrap_or_default();
    let query = query_param(uri, "subdomain");
    extract_subdomain(&host, query.as_deref(), config::config().tenancy.allow_query_subdomain)
}

/// Same path and query with `subdomain` set.
fn with_subdomain(uri: &Uri, subdomain: &str) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    if let Some(query) = uri.query() {
        for (k, v) in url::form_urlencoded::parse(query.as_bytes()) {
            if k != "subdomain" {
                serializer.append_pair(&k, &v);
            }
        }
    }
    serializer.append_pair("subdomain", subdomain);
    format!("{}?{}", uri.path(), serializer.finish())
}

/// Resolves the public site tenant from the request host.
///
/// In development a bare `localhost` request is redirected to the first
/// active kindergarten so the site can be browsed without DNS.
pub async fn resolve_site_tenant(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let headers = request.headers().clone();
    let uri = request.uri().clone();
    let pool = DatabaseManager::pool().await?;
    let kindergartens = KindergartenService::new(pool);

    let Some(subdomain) = requested_subdomain(&headers, &uri) else {
        let host = request_host(&headers).unwrap_or_default();
        if crate::is_development!() && is_development_host(&host) {
            if let Some(first) = kindergartens.list_active().await?.into_iter().next() {
                tracing::debug!("No subdomain on {}, redirecting to '{}'", host, first.subdomain);
                return Ok(Redirect::temporary(&with_subdomain(&uri, &first.subdomain)).into_response());
            }
        }
        tracing::warn!("Public request without a kindergarten subdomain (host '{}')", host);
        return Err(ApiError::not_found(TenantError::MissingSubdomain.to_string()));
    };

    let kindergarten = kindergartens.find_active_by_subdomain(&subdomain).await?.ok_or_else(|| {
        tracing::warn!("Unknown or inactive kindergarten subdomain '{}'", subdomain);
        ApiError::from(TenantError::NotFound(subdomain.clone()))
    })?;

    request.extensions_mut().insert(SiteTenant(kindergarten));
    Ok(next.run(request).await)
}

/// Kindergarten id a SuperAdmin selected with the scope header or `?kindergarten_id=`.
fn selected_kindergarten(headers: &HeaderMap, uri: &Uri) -> Result<i32, TenantError> {
    let raw = headers
        .get(config::config().tenancy.scope_header.as_str())
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| query_param(uri, "kindergarten_id"))
        .filter(|v| !v.trim().is_empty())
        .ok_or(TenantError::ScopeRequired)?;
    raw.trim().parse::<i32>().map_err(|_| TenantError::InvalidScope(raw))
}

/// Resolves the [`TenantScope`] for admin routes. Must run after
/// authentication; tenant users are always pinned to their own kindergarten.
pub async fn validate_tenant_middleware(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    let kindergarten_id = match auth_user.kindergarten_id {
        Some(id) if !auth_user.role.is_system() => id,
        _ if auth_user.role.is_system() => selected_kindergarten(request.headers(), request.uri())?,
        _ => return Err(ApiError::forbidden("Your account is not assigned to a kindergarten")),
    };

    let pool = DatabaseManager::pool().await?;
    let kindergarten = KindergartenService::new(pool).get(kindergarten_id).await?;
    if kindergarten.trashed_at.is_some() {
        return Err(ApiError::not_found(TenantError::NotFound(kindergarten.subdomain).to_string()));
    }

    tracing::debug!("Request by {} scoped to kindergarten {}", auth_user.email, kindergarten.id);
    request.extensions_mut().insert(TenantScope { kindergarten_id, kindergarten });
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_keeps_other_query_parameters() {
        let uri: Uri = "/events?page=2&subdomain=".parse().unwrap();
        assert_eq!(with_subdomain(&uri, "ornek"), "/events?page=2&subdomain=ornek");
    }

    #[test]
    fn scope_comes_from_header_or_query() {
        let mut headers = HeaderMap::new();
        headers.insert("x-kindergarten-id", "12".parse().unwrap());
        let uri: Uri = "/api/admin/events".parse().unwrap();
        assert_eq!(selected_kindergarten(&headers, &uri).unwrap(), 12);

        let uri: Uri = "/api/admin/events?kindergarten_id=7".parse().unwrap();
        assert_eq!(selected_kindergarten(&HeaderMap::new(), &uri).unwrap(), 7);
    }

    #[test]
    fn scope_is_required_for_superadmin() {
        let uri: Uri = "/api/admin/events".parse().unwrap();
        assert!(matches!(selected_kindergarten(&HeaderMap::new(), &uri), Err(TenantError::ScopeRequired)));
        let uri: Uri = "/api/admin/events?kindergarten_id=abc".parse().unwrap();
        assert!(matches!(selected_kindergarten(&HeaderMap::new(), &uri), Err(TenantError::InvalidScope(_))));
    }

    #[test]
    fn subdomain_from_query_on_localhost() {
        let mut headers = HeaderMap::new();
        headers.insert("host", "localhost:3000".parse().unwrap());
        let uri: Uri = "/?subdomain=ornek".parse().unwrap();
        assert_eq!(requested_subdomain(&headers, &uri).as_deref(), Some("ornek"));
    }
}
