//! Pure functions for mapping repository errors to response statuses.

use super::RepositoryError;
use crate::http::ResponseStatus;

/// Maps a [`RepositoryError`] to the response status a handler answers with.
///
/// - `NotFound` -> 404 (Not Found)
/// - `AlreadyExists` -> 409 (Conflict)
/// - `ConnectionFailed` -> 500 (Internal Server Error)
/// - `QueryFailed` -> 500 (Internal Server Error)
/// - `Serialization` -> 500 (Internal Server Error)
/// - `InvalidData` -> 400 (Bad Request)
///
/// # Examples
///
/// ```
/// use gthome_core::http::ResponseStatus;
/// use gthome_core::storage::{repository_error_to_status, RepositoryError};
///
/// let error = RepositoryError::NotFound {
///     entity_type: "Photo",
///     id: "abc-123".to_string(),
/// };
/// assert_eq!(repository_error_to_status(&error), ResponseStatus::NotFound);
/// ```
pub fn repository_error_to_status(error: &RepositoryError) -> ResponseStatus {
    match error {
        RepositoryError::NotFound { .. } => ResponseStatus::NotFound,
        RepositoryError::AlreadyExists { .. } => ResponseStatus::Conflict,
        RepositoryError::ConnectionFailed(_) => ResponseStatus::InternalServerError,
        RepositoryError::QueryFailed(_) => ResponseStatus::InternalServerError,
        RepositoryError::Serialization(_) => ResponseStatus::InternalServerError,
        RepositoryError::InvalidData(_) => ResponseStatus::BadRequest,
    }
}
