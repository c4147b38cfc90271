//! JSON filter documents compiled to parameterized PostgreSQL.
//!
//! ```json
//! { "where": { "is_active": true, "display_order": { "$gte": 1 } },
//!   "order": "display_order asc", "limit": 20 }
//! ```

pub mod error;
pub mod filter;
pub mod filter_order;
pub mod filter_where;
pub mod types;

pub use error::FilterError;
pub use filter::Filter;
pub use types::*;
