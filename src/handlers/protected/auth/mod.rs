// handlers/protected/auth/mod.rs - Session endpoints for signed-in users

pub mod session;

pub use session::{session_refresh, session_whoami};
