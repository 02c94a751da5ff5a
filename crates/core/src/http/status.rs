use std::fmt;

use serde::{Deserialize, Serialize};

use super::HttpError;

/// The status codes a handler is allowed to answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum ResponseStatus {
    Ok,
    Created,
    Accepted,
    NoContent,
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    Conflict,
    InternalServerError,
}

impl ResponseStatus {
    pub const ALL: [ResponseStatus; 11] = [
        ResponseStatus::Ok,
        ResponseStatus::Created,
        ResponseStatus::Accepted,
        ResponseStatus::NoContent,
        ResponseStatus::BadRequest,
        ResponseStatus::Unauthorized,
        ResponseStatus::Forbidden,
        ResponseStatus::NotFound,
        ResponseStatus::MethodNotAllowed,
        ResponseStatus::Conflict,
        ResponseStatus::InternalServerError,
    ];

    pub fn as_u16(&self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::Created => 201,
            Self::Accepted => 202,
            Self::NoContent => 204,
            Self::BadRequest => 400,
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::MethodNotAllowed => 405,
            Self::Conflict => 409,
            Self::InternalServerError => 500,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Created => "Created",
            Self::Accepted => "Accepted",
            Self::NoContent => "No Content",
            Self::BadRequest => "Bad Request",
            Self::Unauthorized => "Unauthorized",
            Self::Forbidden => "Forbidden",
            Self::NotFound => "Not Found",
            Self::MethodNotAllowed => "Method Not Allowed",
            Self::Conflict => "Conflict",
            Self::InternalServerError => "Internal Server Error",
        }
    }

    pub fn is_error(&self) -> bool {
        self.as_u16() >= 400
    }
}

impl TryFrom<u16> for ResponseStatus {
    type Error = HttpError;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_u16() == code)
            .ok_or(HttpError::UnsupportedStatus(code))
    }
}

impl From<ResponseStatus> for u16 {
    fn from(status: ResponseStatus) -> Self {
        status.as_u16()
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_exactly_the_declared_codes() {
        let accepted: Vec<u16> = (100..600)
            .filter(|code| ResponseStatus::try_from(*code).is_ok())
            .collect();
        assert_eq!(
            accepted,
            vec![200, 201, 202, 204, 400, 401, 403, 404, 405, 409, 500]
        );
    }

    #[test]
    fn rejects_service_unavailable() {
        assert_eq!(
            ResponseStatus::try_from(503),
            Err(HttpError::UnsupportedStatus(503))
        );
    }

    #[test]
    fn serializes_as_number() {
        assert_eq!(serde_json::to_string(&ResponseStatus::Conflict).unwrap(), "409");
        let status: ResponseStatus = serde_json::from_str("204").unwrap();
        assert_eq!(status, ResponseStatus::NoContent);
        assert!(serde_json::from_str::<ResponseStatus>("418").is_err());
    }

    #[test]
    fn error_classification() {
        assert!(!ResponseStatus::Accepted.is_error());
        assert!(ResponseStatus::BadRequest.is_error());
        assert_eq!(ResponseStatus::MethodNotAllowed.to_string(), "405 Method Not Allowed");
    }
}
