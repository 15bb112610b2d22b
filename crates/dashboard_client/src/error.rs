//! crates/dashboard_client/src/error.rs

/// Everything a client call can fail with.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server answered 401. Any stored token has been cleared.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The server answered with the error envelope.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A success envelope without the expected payload.
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// Reading or writing the persisted token failed.
    #[error("Token storage error: {0}")]
    Storage(#[from] std::io::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;
