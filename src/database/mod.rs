pub mod manager;
pub mod models;
pub mod mutation;
pub mod query_builder;
pub mod repository;

pub use manager::{DatabaseError, DatabaseManager};
pub use mutation::{ColumnSpec, SqlType};
pub use repository::{Repository, TenantRepository};
