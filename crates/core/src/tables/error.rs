use thiserror::Error;

use super::{DomainLabel, RecordKind};

/// Errors raised while parsing or validating single-table records.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("unknown domain label: {0}")]
    UnknownDomain(String),

    #[error("unknown record kind: {0}")]
    UnknownKind(String),

    #[error("unknown user role: {0}")]
    UnknownRole(String),

    #[error("unknown metadata key: {0}")]
    UnknownMetaKey(String),

    #[error("record kind mismatch: expected {expected}, found {found}")]
    KindMismatch {
        expected: RecordKind,
        found: RecordKind,
    },

    #[error("{kind} records belong to the {expected} domain, found {found}")]
    DomainMismatch {
        kind: RecordKind,
        expected: DomainLabel,
        found: DomainLabel,
    },

    #[error("invalid value for {attribute}: {value}")]
    InvalidAttribute {
        attribute: &'static str,
        value: String,
    },

    #[error("invalid key {key}: expected prefix {prefix}")]
    InvalidKey { key: String, prefix: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_mismatch_display() {
        let error = TableError::DomainMismatch {
            kind: RecordKind::Photo,
            expected: DomainLabel::Attachment,
            found: DomainLabel::User,
        };
        assert_eq!(
            error.to_string(),
            "Photo records belong to the Attachment domain, found User"
        );
    }

    #[test]
    fn test_invalid_key_display() {
        let error = TableError::InvalidKey {
            key: "CAL#1".to_string(),
            prefix: "USER#",
        };
        assert_eq!(error.to_string(), "invalid key CAL#1: expected prefix USER#");
    }
}
