use thiserror::Error;

/// Failure of a single remote API call.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Network, timeout, or non-success HTTP status.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body did not match the expected shape.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Request rejected locally before anything was sent.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Device login succeeded but carried no user record.
    #[error("login response did not include a user")]
    MissingUser,
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
