pub mod schema;
pub mod store;

pub use schema::{LOG_SCHEMA_SQL, LOG_TABLE};
pub use store::SqliteLogStore;
