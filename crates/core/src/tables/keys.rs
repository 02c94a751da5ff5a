//! Key generation functions for the single-table layout.
//!
//! Pure functions for building partition, sort and index keys. All functions
//! are sync and have no side effects.

use uuid::Uuid;

use super::{PrimaryKey, TableError};

// ============================================================================
// Key prefixes
// ============================================================================

pub const USER_PREFIX: &str = "USER#";
pub const PHOTO_PREFIX: &str = "PHOTO#";
pub const EMAIL_PREFIX: &str = "EMAIL#";

/// Sort keys of metadata rows start with this marker.
pub const META_PREFIX: &str = "_#";

// ============================================================================
// User keys
// ============================================================================

/// Generate partition key for a User.
///
/// Pattern: `USER#<user_id>`
pub fn user_pk(user_id: Uuid) -> String {
    format!("{USER_PREFIX}{user_id}")
}

/// Generate sort key for a User profile row.
///
/// Pattern: `USER#<user_id>` (same as PK for single-item queries)
pub fn user_sk(user_id: Uuid) -> String {
    format!("{USER_PREFIX}{user_id}")
}

pub fn user_key(user_id: Uuid) -> PrimaryKey {
    PrimaryKey::new(user_pk(user_id), user_sk(user_id))
}

/// Generate the sparse index value for username lookup.
///
/// Pattern: `EMAIL#<username>`, lowercased and trimmed.
pub fn user_si(username: &str) -> String {
    format!("{EMAIL_PREFIX}{}", normalize_username(username))
}

/// Usernames are e-mail addresses and compare case-insensitively.
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

/// Extract the user id from a `USER#<uuid>` partition key.
pub fn user_id_from_pk(pk: &str) -> Result<Uuid, TableError> {
    id_from_key(pk, USER_PREFIX)
}

// ============================================================================
// Photo keys
// ============================================================================

/// Generate partition key for a Photo.
///
/// Pattern: `PHOTO#<photo_id>`
pub fn photo_pk(photo_id: Uuid) -> String {
    format!("{PHOTO_PREFIX}{photo_id}")
}

/// Generate sort key for a Photo row.
///
/// Pattern: `PHOTO#<photo_id>`
pub fn photo_sk(photo_id: Uuid) -> String {
    format!("{PHOTO_PREFIX}{photo_id}")
}

pub fn photo_key(photo_id: Uuid) -> PrimaryKey {
    PrimaryKey::new(photo_pk(photo_id), photo_sk(photo_id))
}

/// Extract the photo id from a `PHOTO#<uuid>` partition key.
pub fn photo_id_from_pk(pk: &str) -> Result<Uuid, TableError> {
    id_from_key(pk, PHOTO_PREFIX)
}

// ============================================================================
// Metadata keys
// ============================================================================

/// Whether a sort key addresses a metadata row.
pub fn is_meta_sk(sk: &str) -> bool {
    sk.starts_with(META_PREFIX)
}

/// Sort key prefix shared by all metadata rows of one owner.
pub fn meta_sk_prefix() -> &'static str {
    META_PREFIX
}

fn id_from_key(key: &str, prefix: &'static str) -> Result<Uuid, TableError> {
    key.strip_prefix(prefix)
        .and_then(|id| Uuid::parse_str(id).ok())
        .ok_or_else(|| TableError::InvalidKey {
            key: key.to_string(),
            prefix,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uuid(s: &str) -> Uuid {
        Uuid::parse_str(s).unwrap()
    }

    #[test]
    fn test_user_pk() {
        let id = uuid("550e8400-e29b-41d4-a716-446655440001");
        assert_eq!(user_pk(id), "USER#550e8400-e29b-41d4-a716-446655440001");
        assert_eq!(user_sk(id), user_pk(id));
    }

    #[test]
    fn test_user_si_normalizes() {
        assert_eq!(user_si("  Maria@Example.COM "), "EMAIL#maria@example.com");
    }

    #[test]
    fn test_photo_key() {
        let id = uuid("550e8400-e29b-41d4-a716-446655440003");
        let key = photo_key(id);
        assert_eq!(key.pk(), "PHOTO#550e8400-e29b-41d4-a716-446655440003");
        assert_eq!(key.sk(), key.pk());
    }

    #[test]
    fn test_id_from_pk_round_trip() {
        let id = Uuid::new_v4();
        assert_eq!(user_id_from_pk(&user_pk(id)).unwrap(), id);
        assert_eq!(photo_id_from_pk(&photo_pk(id)).unwrap(), id);
    }

    #[test]
    fn test_id_from_pk_rejects_other_prefix() {
        let id = Uuid::new_v4();
        let err = user_id_from_pk(&photo_pk(id)).unwrap_err();
        assert!(matches!(err, TableError::InvalidKey { prefix: "USER#", .. }));
        assert!(photo_id_from_pk("PHOTO#not-a-uuid").is_err());
    }

    #[test]
    fn test_meta_sk() {
        assert!(is_meta_sk("_#userPhone"));
        assert!(!is_meta_sk("USER#1"));
        assert_eq!(meta_sk_prefix(), "_#");
    }
}
