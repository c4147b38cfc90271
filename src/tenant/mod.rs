//! Subdomain parsing and validation for kindergarten tenants.
//!
//! A public request is mapped to a kindergarten by the first label of its
//! host (`ornek.example.com` -> `ornek`). Hosts without a usable subdomain
//! (bare domains, `localhost`, IP literals) fall back to a `subdomain` query
//! parameter when the environment allows it.

use std::net::IpAddr;

use axum::http::HeaderMap;

#[derive(Debug, thiserror::Error)]
pub enum TenantError {
    #[error("No kindergarten subdomain in request")]
    MissingSubdomain,

    #[error("Invalid subdomain: {0}")]
    InvalidSubdomain(String),

    #[error("Kindergarten '{0}' not found")]
    NotFound(String),

    #[error("SuperAdmin requests must select a kindergarten with the X-Kindergarten-Id header")]
    ScopeRequired,

    #[error("Invalid kindergarten id: {0}")]
    InvalidScope(String),
}

pub const MAX_SUBDOMAIN_LENGTH: usize = 63;

/// Labels that can never be assigned to a kindergarten.
pub const RESERVED_SUBDOMAINS: &[&str] = &[
    "admin", "api", "www", "app", "mail", "static", "assets", "uploads", "system", "root",
    "superadmin", "login", "auth", "cdn", "ftp", "smtp",
];

/// Host of the request, preferring the proxy-supplied header.
pub fn request_host(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-host")
        .or_else(|| headers.get(axum::http::header::HOST))
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').next().unwrap_or(v).trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Strip the port from a `Host` value, keeping bracketed IPv6 literals intact.
fn host_without_port(host: &str) -> &str {
    if let Some(rest) = host.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest);
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) && !name.contains(':') => name,
        _ => host,
    }
}

/// True when the host cannot carry a tenant label.
pub fn is_development_host(host: &str) -> bool {
    let name = host_without_port(host);
    name.parse::<IpAddr>().is_ok() || name.contains("localhost") || name.split('.').count() < 3
}

/// Resolve the subdomain for a request.
///
/// `query_subdomain` is only consulted for development hosts and only when
/// `allow_query` is set.
pub fn extract_subdomain(host: &str, query_subdomain: Option<&str>, allow_query: bool) -> Option<String> {
    let name = host_without_port(host.trim());

    let candidate = if is_development_host(name) {
        if !allow_query {
            return None;
        }
        query_subdomain?
    } else {
        name.split('.').next()?
    };

    let candidate = candidate.trim().to_ascii_lowercase();
    if candidate.is_empty() {
        None
    } else {
        Some(candidate)
    }
}

/// Validate a subdomain before it is assigned to a kindergarten.
pub fn validate_subdomain(subdomain: &str) -> Result<(), TenantError> {
    let invalid = |reason: &str| TenantError::InvalidSubdomain(format!("'{}' {}", subdomain, reason));

    if subdomain.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if subdomain.len() > MAX_SUBDOMAIN_LENGTH {
        return Err(invalid("must be at most 63 characters"));
    }
    if !subdomain.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(invalid("may only contain letters, digits and hyphens"));
    }
    if subdomain.starts_with('-') || subdomain.ends_with('-') {
        return Err(invalid("must not start or end with a hyphen"));
    }
    if RESERVED_SUBDOMAINS.contains(&subdomain.to_ascii_lowercase().as_str()) {
        return Err(invalid("is reserved"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_label_of_tenant_host() {
        assert_eq!(extract_subdomain("ornek.kres.com", None, true), Some("ornek".to_string()));
        assert_eq!(extract_subdomain("Ornek.Kres.com:8080", None, false), Some("ornek".to_string()));
    }

    #[test]
    fn tenant_host_ignores_query_parameter() {
        assert_eq!(extract_subdomain("ornek.kres.com", Some("other"), true), Some("ornek".to_string()));
    }

    #[test]
    fn development_hosts_use_query_parameter() {
        assert_eq!(extract_subdomain("localhost:3000", Some("ornek"), true), Some("ornek".to_string()));
        assert_eq!(extract_subdomain("127.0.0.1", Some("ornek"), true), Some("ornek".to_string()));
        assert_eq!(extract_subdomain("kres.com", Some("ornek"), true), Some("ornek".to_string()));
        assert_eq!(extract_subdomain("[::1]:3000", Some("ornek"), true), Some("ornek".to_string()));
        assert_eq!(extract_subdomain("ornek.localhost", Some("q"), true), Some("q".to_string()));
    }

    #[test]
    fn query_fallback_can_be_disabled() {
        assert_eq!(extract_subdomain("localhost:3000", Some("ornek"), false), None);
        assert_eq!(extract_subdomain("localhost", None, true), None);
        assert_eq!(extract_subdomain("localhost", Some("  "), true), None);
    }

    #[test]
    fn validates_subdomains() {
        assert!(validate_subdomain("ornek").is_ok());
        assert!(validate_subdomain("gunes-kres-2").is_ok());
        assert!(validate_subdomain("").is_err());
        assert!(validate_subdomain("-ornek").is_err());
        assert!(validate_subdomain("ornek-").is_err());
        assert!(validate_subdomain("ornek.kres").is_err());
        assert!(validate_subdomain("örnek").is_err());
        assert!(validate_subdomain("Admin").is_err());
        assert!(validate_subdomain(&"a".repeat(64)).is_err());
    }

    #[test]
    fn forwarded_host_wins() {
        let mut headers = HeaderMap::new();
        headers.insert("host", "internal:3000".parse().unwrap());
        headers.insert("x-forwarded-host", "ornek.kres.com, proxy".parse().unwrap());
        assert_eq!(request_host(&headers).as_deref(), Some("ornek.kres.com"));
    }
}
