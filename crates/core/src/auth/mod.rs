//! Password digests and credential validation.

mod error;
mod functions;
mod validation;

pub use error::AuthError;
pub use functions::{
    calculate_expiry, email_to_name, generate_salt, hash_password, hash_password_with_salt,
    verify_password,
};
pub use validation::{normalize_cpf, validate_email};
