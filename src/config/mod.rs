use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub filter: FilterConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub tenancy: TenancyConfig,
    pub uploads: UploadConfig,
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    pub max_limit: Option<i32>,
    pub debug_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
    pub enable_slow_query_warning: bool,
    pub slow_query_threshold_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub require_https: bool,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub session_minutes: i64,
    pub remember_me_days: i64,
    pub cookie_name: String,
    pub min_password_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenancyConfig {
    /// Accept `?subdomain=` when the host carries no usable subdomain.
    pub allow_query_subdomain: bool,
    /// Subdomain reserved for the system login.
    pub admin_subdomain: String,
    /// Header a SuperAdmin uses to pick the kindergarten an admin request acts on.
    pub scope_header: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub root: String,
    pub public_prefix: String,
    pub max_image_bytes: usize,
    pub max_attachment_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub enabled: bool,
    pub whatsapp_api_url: Option<String>,
    #[serde(skip_serializing)]
    pub whatsapp_api_token: Option<String>,
    pub extra_email: Option<String>,
    pub timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Filter overrides
        if let Ok(v) = env::var("FILTER_MAX_LIMIT") {
            self.filter.max_limit = v.parse().ok();
        }
        if let Ok(v) = env::var("FILTER_DEBUG_LOGGING") {
            self.filter.debug_logging = v.parse().unwrap_or(self.filter.debug_logging);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }
        if let Ok(v) = env::var("DATABASE_ENABLE_SLOW_QUERY_WARNING") {
            self.database.enable_slow_query_warning = v.parse().unwrap_or(self.database.enable_slow_query_warning);
        }
        if let Ok(v) = env::var("DATABASE_SLOW_QUERY_THRESHOLD_MS") {
            self.database.slow_query_threshold_ms = v.parse().unwrap_or(self.database.slow_query_threshold_ms);
        }

        // API overrides
        if let Some(v) = env::var("KINDER_API_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("SECURITY_REQUIRE_HTTPS") {
            self.security.require_https = v.parse().unwrap_or(self.security.require_https);
        }
        if let Ok(v) = env::var("SECURITY_JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_SESSION_MINUTES") {
            self.security.session_minutes = v.parse().unwrap_or(self.security.session_minutes);
        }
        if let Ok(v) = env::var("SECURITY_REMEMBER_ME_DAYS") {
            self.security.remember_me_days = v.parse().unwrap_or(self.security.remember_me_days);
        }
        if let Ok(v) = env::var("SECURITY_COOKIE_NAME") {
            self.security.cookie_name = v;
        }
        if let Ok(v) = env::var("SECURITY_MIN_PASSWORD_LENGTH") {
            self.security.min_password_length = v.parse().unwrap_or(self.security.min_password_length);
        }

        // Tenancy overrides
        if let Ok(v) = env::var("TENANCY_ALLOW_QUERY_SUBDOMAIN") {
            self.tenancy.allow_query_subdomain = v.parse().unwrap_or(self.tenancy.allow_query_subdomain);
        }
        if let Ok(v) = env::var("TENANCY_ADMIN_SUBDOMAIN") {
            self.tenancy.admin_subdomain = v.to_ascii_lowercase();
        }

        // Upload overrides
        if let Ok(v) = env::var("UPLOADS_ROOT") {
            self.uploads.root = v;
        }
        if let Ok(v) = env::var("UPLOADS_MAX_IMAGE_BYTES") {
            self.uploads.max_image_bytes = v.parse().unwrap_or(self.uploads.max_image_bytes);
        }
        if let Ok(v) = env::var("UPLOADS_MAX_ATTACHMENT_BYTES") {
            self.uploads.max_attachment_bytes = v.parse().unwrap_or(self.uploads.max_attachment_bytes);
        }

        // Notification overrides
        if let Ok(v) = env::var("NOTIFY_ENABLED") {
            self.notifications.enabled = v.parse().unwrap_or(self.notifications.enabled);
        }
        if let Ok(v) = env::var("NOTIFY_WHATSAPP_API_URL") {
            self.notifications.whatsapp_api_url = Some(v).filter(|s| !s.trim().is_empty());
        }
        if let Ok(v) = env::var("NOTIFY_WHATSAPP_API_TOKEN") {
            self.notifications.whatsapp_api_token = Some(v).filter(|s| !s.trim().is_empty());
        }
        if let Ok(v) = env::var("NOTIFY_EXTRA_EMAIL") {
            self.notifications.extra_email = Some(v).filter(|s| !s.trim().is_empty());
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            filter: FilterConfig {
                max_limit: Some(1000),
                debug_logging: true,
            },
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
                enable_slow_query_warning: true,
                slow_query_threshold_ms: 100,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 25 * 1024 * 1024, // 25MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                require_https: false,
                jwt_secret: "development-only-secret".to_string(),
                session_minutes: 60,
                remember_me_days: 30,
                cookie_name: "kinder_session".to_string(),
                min_password_length: 8,
            },
            tenancy: TenancyConfig {
                allow_query_subdomain: true,
                admin_subdomain: "admin".to_string(),
                scope_header: "x-kindergarten-id".to_string(),
            },
            uploads: UploadConfig {
                root: "uploads".to_string(),
                public_prefix: "/uploads".to_string(),
                max_image_bytes: 5 * 1024 * 1024,
                max_attachment_bytes: 10 * 1024 * 1024,
            },
            notifications: NotificationConfig {
                enabled: true,
                whatsapp_api_url: None,
                whatsapp_api_token: None,
                extra_email: None,
                timeout_secs: 10,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            filter: FilterConfig {
                max_limit: Some(500),
                debug_logging: false,
            },
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 10,
                run_migrations: true,
                enable_slow_query_warning: true,
                slow_query_threshold_ms: 500,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 25 * 1024 * 1024,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                require_https: true,
                jwt_secret: String::new(),
                session_minutes: 60,
                remember_me_days: 30,
                cookie_name: "kinder_session".to_string(),
                min_password_length: 8,
            },
            tenancy: TenancyConfig {
                allow_query_subdomain: true,
                admin_subdomain: "admin".to_string(),
                scope_header: "x-kindergarten-id".to_string(),
            },
            uploads: UploadConfig {
                root: "uploads".to_string(),
                public_prefix: "/uploads".to_string(),
                max_image_bytes: 5 * 1024 * 1024,
                max_attachment_bytes: 10 * 1024 * 1024,
            },
            notifications: NotificationConfig {
                enabled: true,
                whatsapp_api_url: None,
                whatsapp_api_token: None,
                extra_email: None,
                timeout_secs: 10,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            filter: FilterConfig {
                max_limit: Some(200),
                debug_logging: false,
            },
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout: 5,
                run_migrations: false,
                enable_slow_query_warning: true,
                slow_query_threshold_ms: 1000,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: false,
                max_request_size_bytes: 25 * 1024 * 1024,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                require_https: true,
                jwt_secret: String::new(),
                session_minutes: 60,
                remember_me_days: 30,
                cookie_name: "kinder_session".to_string(),
                min_password_length: 8,
            },
            tenancy: TenancyConfig {
                allow_query_subdomain: false,
                admin_subdomain: "admin".to_string(),
                scope_header: "x-kindergarten-id".to_string(),
            },
            uploads: UploadConfig {
                root: "uploads".to_string(),
                public_prefix: "/uploads".to_string(),
                max_image_bytes: 5 * 1024 * 1024,
                max_attachment_bytes: 10 * 1024 * 1024,
            },
            notifications: NotificationConfig {
                enabled: true,
                whatsapp_api_url: None,
                whatsapp_api_token: None,
                extra_email: None,
                timeout_secs: 5,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

// Helper macros for common checks
#[macro_export]
macro_rules! is_development {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Development)
    };
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(config.tenancy.allow_query_subdomain);
        assert!(!config.security.jwt_secret.is_empty());
        assert_eq!(config.security.session_minutes, 60);
        assert_eq!(config.security.remember_me_days, 30);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(!config.tenancy.allow_query_subdomain);
        assert!(config.security.jwt_secret.is_empty());
        assert!(config.security.require_https);
        assert!(!config.database.run_migrations);
    }

    #[test]
    fn test_upload_limits_match_across_environments() {
        for config in [AppConfig::development(), AppConfig::staging(), AppConfig::production()] {
            assert_eq!(config.uploads.max_image_bytes, 5 * 1024 * 1024);
            assert!(config.api.max_request_size_bytes >= config.uploads.max_attachment_bytes);
        }
    }
}
