// handlers/public/auth/mod.rs - Public authentication handlers
//
// Session acquisition endpoints. The kindergarten a login is addressed to
// comes from the request host (or `kindergarten_id` in the body); the
// `admin` subdomain and tenant-less hosts log in SuperAdmins.

pub mod login;
pub mod logout;
pub mod session;

pub use login::{login_get, login_post};
pub use logout::logout_post;
pub use session::{clear_session_cookie, session_cookie, SessionResponse};
