//! Error types for DynamoDB operations.

use std::fmt::Display;

use thiserror::Error;

/// Result type alias for dynamodb module.
pub type Result<T> = std::result::Result<T, DynamodbError>;

/// Errors that can occur during DynamoDB operations.
#[derive(Error, Debug)]
pub enum DynamodbError {
    #[error("{operation} failed: {message}")]
    Sdk {
        operation: &'static str,
        message: String,
    },

    #[error("Table '{table_name}' does not exist, run `cargo xtask dynamodb deploy` first")]
    TableNotFound { table_name: String },

    #[error("Aborted")]
    UserCancelled,

    #[error("Table '{table_name}' did not become active after {seconds}s")]
    TableActivationTimeout { table_name: String, seconds: u64 },

    #[error("Prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("Cannot encode seed record: {0}")]
    Encode(String),
}

impl DynamodbError {
    /// Wrap an SDK failure with the DynamoDB operation that produced it.
    pub fn sdk(operation: &'static str, error: impl Display) -> Self {
        Self::Sdk {
            operation,
            message: error.to_string(),
        }
    }
}
