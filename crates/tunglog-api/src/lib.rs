pub mod client;
pub mod error;
pub mod model;
pub mod server;

pub use error::{ApiError, ApiResult};
pub use model::ApiLog;
