// handlers/elevated/root/mod.rs - SuperAdmin console

pub mod dashboard;
pub mod kindergarten;
pub mod user;

pub use dashboard::dashboard_get;
