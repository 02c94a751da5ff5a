use thiserror::Error;

/// Errors raised while reading or building HTTP envelopes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HttpError {
    #[error("unsupported response status: {0}")]
    UnsupportedStatus(u16),

    #[error("unsupported method: {0}")]
    UnknownMethod(String),

    #[error("unknown resource action: {0}")]
    UnknownAction(String),

    #[error("unknown response header: {0}")]
    UnknownHeader(String),

    #[error("request body is empty")]
    EmptyBody,

    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("failed to encode response body: {0}")]
    Encode(String),
}
