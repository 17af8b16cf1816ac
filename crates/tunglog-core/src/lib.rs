pub mod clock;
pub mod config;
pub mod export;
pub mod manager;
pub mod models;
pub mod persistence;
pub mod retry;
pub mod sqlite;

pub use config::StoreConfig;
pub use manager::{DEFAULT_REFRESH_LIMIT, LogManager, ManagerResult, Outcome};
