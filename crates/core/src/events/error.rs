use thiserror::Error;

use super::EventName;

/// Errors raised while encoding, decoding or delivering lifecycle events.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventError {
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    #[error("event name could not be resolved for record")]
    MissingEventName,

    #[error("invalid {event} message: {reason}")]
    InvalidMessage { event: EventName, reason: String },

    #[error("failed to encode {event} message: {reason}")]
    Encode { event: EventName, reason: String },

    #[error("publish failed: {0}")]
    Publish(String),

    #[error("e-mail dispatch failed: {0}")]
    Dispatch(String),
}

/// Result type for event operations.
pub type Result<T> = std::result::Result<T, EventError>;
