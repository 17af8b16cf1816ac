use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("API Endpoint is empty!")]
    EmptyEndpoint,
    #[error("API connection timed out!")]
    Timeout,
    #[error("API connection failed: {0}")]
    Connection(String),
    #[error("HTTP error: {status}")]
    Http { status: u16 },
    #[error("Failed to parse JSON from API!")]
    InvalidJson,
    #[error("API response is not a list!")]
    NotAList,
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

pub type ApiResult<T> = Result<T, ApiError>;
