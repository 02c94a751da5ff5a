use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("user has no password set")]
    PasswordNotSet,

    #[error("missing bearer token")]
    MissingToken,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token expired")]
    TokenExpired,

    #[error("role {role} may not {action}")]
    Forbidden { role: String, action: String },

    #[error("malformed password digest")]
    MalformedDigest,

    #[error("failed to issue token: {0}")]
    Issue(String),
}
