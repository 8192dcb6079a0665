use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("backend request failed with status {status}: {message}")]
    Http { status: u16, message: String },

    #[error("backend rejected the request: {0}")]
    Rejected(String),

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("transport failure: {0}")]
    Transport(String),
}
