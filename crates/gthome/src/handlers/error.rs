use thiserror::Error;

use gthome_core::auth::AuthError;
use gthome_core::http::{HttpError, Response, ResponseStatus};
use gthome_core::storage::{repository_error_to_status, RepositoryError};

/// Request fields that failed validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl RequestError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    /// Convert into an error response, picking the status from the
    /// underlying error type.
    pub fn into_response(self) -> Response {
        let error = self.0;

        if let Some(repo_error) = error.downcast_ref::<RepositoryError>() {
            let status = repository_error_to_status(repo_error);
            if status == ResponseStatus::InternalServerError {
                tracing::error!(error = %repo_error, "storage failure");
                return Response::error(status, "Internal server error");
            }
            return Response::error(status, repo_error.to_string());
        }

        if let Some(auth_error) = error.downcast_ref::<AuthError>() {
            return auth_error_response(auth_error);
        }

        if let Some(request_error) = error.downcast_ref::<RequestError>() {
            return Response::error(ResponseStatus::BadRequest, request_error.to_string());
        }

        if let Some(http_error) = error.downcast_ref::<HttpError>() {
            return Response::error(ResponseStatus::BadRequest, http_error.to_string());
        }

        tracing::error!(error = %error, "unhandled error");
        Response::error(ResponseStatus::InternalServerError, "Internal server error")
    }
}

fn auth_error_response(error: &AuthError) -> Response {
    match error {
        AuthError::InvalidCredentials
        | AuthError::MissingToken
        | AuthError::InvalidToken(_)
        | AuthError::TokenExpired => {
            tracing::warn!(error = %error, "unauthorized");
            let mut response = Response::error(ResponseStatus::Unauthorized, error.to_string());
            response.headers_mut().www_authenticate = Some("Bearer".to_string());
            response
        }
        AuthError::Forbidden { .. } | AuthError::PasswordNotSet => {
            tracing::warn!(error = %error, "forbidden");
            Response::error(ResponseStatus::Forbidden, error.to_string())
        }
        AuthError::MalformedDigest | AuthError::Issue(_) => {
            tracing::error!(error = %error, "authentication failure");
            Response::error(ResponseStatus::InternalServerError, "Internal server error")
        }
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gthome_core::http::ResponseBody;
    use serde_json::json;

    #[test]
    fn test_not_found_maps_to_404() {
        let response = AppError::from(RepositoryError::NotFound {
            entity_type: "Photo",
            id: "abc".to_string(),
        })
        .into_response();

        assert_eq!(response.status(), ResponseStatus::NotFound);
        assert_eq!(response.error, Some(true));
    }

    #[test]
    fn test_storage_failures_hide_details() {
        let response =
            AppError::from(RepositoryError::ConnectionFailed("timeout".to_string())).into_response();

        assert_eq!(response.status(), ResponseStatus::InternalServerError);
        assert_eq!(
            response.body,
            Some(ResponseBody::Json(json!({"message": "Internal server error"})))
        );
    }

    #[test]
    fn test_unauthorized_carries_challenge() {
        let response = AppError::from(AuthError::InvalidCredentials).into_response();

        assert_eq!(response.status(), ResponseStatus::Unauthorized);
        let headers = response.headers.unwrap();
        assert_eq!(headers.www_authenticate.as_deref(), Some("Bearer"));
    }

    #[test]
    fn test_password_not_set_is_forbidden() {
        let response = AppError::from(AuthError::PasswordNotSet).into_response();
        assert_eq!(response.status(), ResponseStatus::Forbidden);
    }

    #[test]
    fn test_validation_errors_are_bad_requests() {
        let missing = AppError::from(RequestError::MissingField("cpf")).into_response();
        assert_eq!(missing.status(), ResponseStatus::BadRequest);

        let body = AppError::from(HttpError::EmptyBody).into_response();
        assert_eq!(body.status(), ResponseStatus::BadRequest);
    }

    #[test]
    fn test_unknown_errors_are_internal() {
        let response = AppError(anyhow::anyhow!("boom")).into_response();
        assert_eq!(response.status(), ResponseStatus::InternalServerError);
    }
}
