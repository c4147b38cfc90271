pub mod auth;
pub mod response;
pub mod validate_tenant;
pub mod validate_user;

pub use auth::{jwt_auth_middleware, require_roles, AuthUser};
pub use response::{ApiResponse, ApiResult};
pub use validate_tenant::{resolve_site_tenant, validate_tenant_middleware, SiteTenant, TenantScope};
pub use validate_user::{validate_user_middleware, ValidatedUser};
