use chrono::{DateTime, Duration, Utc};
use rand::{distr::Alphanumeric, Rng};
use sha2::{Digest, Sha256};

use super::AuthError;

const DIGEST_SCHEME: &str = "sha256";
const SALT_LEN: usize = 16;

/// Generate a random alphanumeric salt.
pub fn generate_salt() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SALT_LEN)
        .map(char::from)
        .collect()
}

fn digest_hex(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

/// Hash a password with the given salt into `sha256$<salt>$<hex digest>`.
pub fn hash_password_with_salt(password: &str, salt: &str) -> String {
    format!("{DIGEST_SCHEME}${salt}${}", digest_hex(salt, password))
}

/// Hash a password with a freshly generated salt.
pub fn hash_password(password: &str) -> String {
    hash_password_with_salt(password, &generate_salt())
}

/// Check a password against a stored digest.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, AuthError> {
    let mut parts = stored.splitn(3, '$');
    let (Some(scheme), Some(salt), Some(expected)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(AuthError::MalformedDigest);
    };
    if scheme != DIGEST_SCHEME || salt.is_empty() || expected.is_empty() {
        return Err(AuthError::MalformedDigest);
    }

    let actual = digest_hex(salt, password);
    // Constant-time comparison over equal-length hex strings.
    let matches = actual.len() == expected.len()
        && actual
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0;
    Ok(matches)
}

/// Calculate token expiry from issue time and TTL.
pub fn calculate_expiry(issued_at: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    issued_at + ttl
}

/// Extract a display name from an email when none was provided.
pub fn email_to_name(email: &str) -> String {
    match email.split('@').next() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => "User".to_string(),
    }
}
