use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Json},
    routing::{get, patch, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    trace::TraceLayer,
};

use crate::auth::role::access;
use crate::config;
use crate::database::manager::DatabaseManager;
use crate::database::models::{Announcement, CoreEducationProgram, Event, GalleryImage, ParentTestimonial, Staff};
use crate::error::ApiError;
use crate::handlers::{elevated, protected, public};
use crate::middleware::{
    jwt_auth_middleware, require_roles, resolve_site_tenant, validate_tenant_middleware, validate_user_middleware,
};
use crate::services::ContentEntity;

pub fn app() -> Router {
    let settings = config::config();

    Router::new()
        .route("/health", get(health))
        .route("/api", get(api_info))
        .merge(auth_public_routes())
        .merge(site_routes())
        .merge(session_routes())
        .merge(admin_routes())
        .merge(editor_routes())
        .merge(root_routes())
        .nest_service(&settings.uploads.public_prefix, ServeDir::new(&settings.uploads.root))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(settings.api.max_request_size_bytes))
        .layer(RequestBodyLimitLayer::new(settings.api.max_request_size_bytes))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

fn auth_public_routes() -> Router {
    use public::auth;

    Router::new()
        .route("/auth/login", get(auth::login_get).post(auth::login_post))
        .route("/auth/logout", post(auth::logout_post))
}

fn site_routes() -> Router {
    use public::site;

    Router::new()
        .route("/", get(site::home))
        .route("/about", get(site::about))
        .route("/events", get(site::events))
        .route("/events/:id", get(site::event_detail))
        .route("/staff", get(site::staff))
        .route("/announcements", get(site::announcements))
        .route("/announcements/:id", get(site::announcement_detail))
        .route("/gallery", get(site::gallery))
        .route("/contact", get(site::contact_get).post(site::contact_post))
        .route_layer(from_fn(resolve_site_tenant))
}

fn session_routes() -> Router {
    use axum::routing::put;
    use protected::auth;

    Router::new()
        .route("/api/auth/whoami", get(auth::session_whoami))
        .route("/api/auth/session/refresh", put(auth::session_refresh))
        .route_layer(from_fn(validate_user_middleware))
        .route_layer(from_fn(jwt_auth_middleware))
}

/// CRUD routes for one content entity; ordered entities also get `PATCH :id/order`.
fn content_routes<E: ContentEntity>(path: &str) -> Router {
    use protected::admin::content;

    let router = Router::new()
        .route(path, get(content::list::<E>).post(content::create::<E>))
        .route(
            &format!("{}/:id", path),
            get(content::show::<E>).put(content::update::<E>).delete(content::delete::<E>),
        );

    if E::APPENDS {
        router.route(&format!("{}/:id/order", path), patch(content::order::<E>))
    } else {
        router
    }
}

/// Site configuration and curated content: kindergarten admins and SuperAdmins.
fn admin_routes() -> Router {
    use protected::admin::{dashboard, messages, settings};

    Router::new()
        .route("/api/admin/dashboard", get(dashboard::dashboard_get))
        .route("/api/admin/settings", get(settings::settings_get).put(settings::settings_put))
        .route("/api/admin/about", get(settings::about_get).put(settings::about_put))
        .merge(content_routes::<CoreEducationProgram>("/api/admin/programs"))
        .merge(content_routes::<Staff>("/api/admin/staff"))
        .merge(content_routes::<ParentTestimonial>("/api/admin/testimonials"))
        .route("/api/admin/messages", get(messages::list))
        .route("/api/admin/messages/unread-count", get(messages::unread_count))
        .route("/api/admin/messages/:id", get(messages::show).delete(messages::delete))
        .route("/api/admin/messages/:id/read", post(messages::mark_read))
        .route("/api/admin/messages/:id/unread", post(messages::mark_unread))
        .route_layer(from_fn(validate_tenant_middleware))
        .route_layer(from_fn_with_state(access::ADMIN, require_roles))
        .route_layer(from_fn(validate_user_middleware))
        .route_layer(from_fn(jwt_auth_middleware))
}

/// Day-to-day content teachers may publish as well.
fn editor_routes() -> Router {
    use protected::admin::gallery;

    Router::new()
        .merge(content_routes::<Event>("/api/admin/events"))
        .merge(content_routes::<Announcement>("/api/admin/announcements"))
        .merge(content_routes::<GalleryImage>("/api/admin/gallery"))
        .route("/api/admin/gallery/upload", post(gallery::bulk_upload))
        .route_layer(from_fn(validate_tenant_middleware))
        .route_layer(from_fn_with_state(access::EDITOR, require_roles))
        .route_layer(from_fn(validate_user_middleware))
        .route_layer(from_fn(jwt_auth_middleware))
}

fn root_routes() -> Router {
    use elevated::root::{self, kindergarten, user};

    Router::new()
        .route("/api/root/dashboard", get(root::dashboard_get))
        .route(
            "/api/root/kindergartens",
            get(kindergarten::kindergarten_list).post(kindergarten::kindergarten_create),
        )
        .route(
            "/api/root/kindergartens/:id",
            get(kindergarten::kindergarten_show)
                .put(kindergarten::kindergarten_update)
                .delete(kindergarten::kindergarten_delete),
        )
        .route("/api/root/kindergartens/:id/restore", post(kindergarten::kindergarten_restore))
        .route("/api/root/users", get(user::user_list).post(user::user_create))
        .route(
            "/api/root/users/:id",
            get(user::user_show).put(user::user_update).delete(user::user_delete),
        )
        .route_layer(from_fn_with_state(access::ROOT, require_roles))
        .route_layer(from_fn(validate_user_middleware))
        .route_layer(from_fn(jwt_auth_middleware))
}

fn cors_layer() -> CorsLayer {
    let security = &config::config().security;
    if !security.enable_cors {
        return CorsLayer::new();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    let scope_header = HeaderName::from_bytes(config::config().tenancy.scope_header.as_bytes())
        .unwrap_or_else(|_| HeaderName::from_static("x-kindergarten-id"));

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, scope_header])
        .allow_credentials(true)
}

async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

async fn api_info() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Kinder CMS",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Multi-tenant kindergarten website backend",
            "endpoints": {
                "site": "/, /about, /events[/:id], /staff, /announcements[/:id], /gallery, /contact (public, by subdomain)",
                "auth": "/auth/login, /auth/logout (public), /api/auth/whoami, /api/auth/session/refresh (session)",
                "admin": "/api/admin/* (KindergartenAdmin, Teacher for events/announcements/gallery)",
                "root": "/api/root/* (SuperAdmin)",
                "uploads": "/uploads/*",
            }
        }
    }))
}

async fn health() -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    async fn status_of(request: Request<Body>) -> StatusCode {
        app().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn admin_routes_require_a_session() {
        let request = Request::builder().uri("/api/admin/events").body(Body::empty()).unwrap();
        assert_eq!(status_of(request).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn root_routes_reject_garbage_tokens() {
        let request = Request::builder()
            .uri("/api/root/kindergartens")
            .header(header::AUTHORIZATION, "Bearer not-a-jwt")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_routes_answer_json_404() {
        let request = Request::builder().uri("/api/nothing-here").body(Body::empty()).unwrap();
        assert_eq!(status_of(request).await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn api_info_is_public() {
        let request = Request::builder().uri("/api").body(Body::empty()).unwrap();
        assert_eq!(status_of(request).await, StatusCode::OK);
    }
}
