use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::TableError;

/// Attribute names used by every item in the table.
pub const ATTR_PK: &str = "PK";
pub const ATTR_SK: &str = "SK";
pub const ATTR_PK1: &str = "PK1";
pub const ATTR_SK1: &str = "SK1";
pub const ATTR_SI: &str = "SI";
pub const ATTR_KIND: &str = "Kind";

/// Secondary index over `PK1`/`SK1`.
pub const GSI1_INDEX: &str = "GSI1";

/// Sparse index over `SI`.
pub const SPARSE_INDEX: &str = "SI";

/// Top-level category every record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DomainLabel {
    User,
    Article,
    Taxonomy,
    Attachment,
    Warehouse,
}

impl DomainLabel {
    pub const ALL: [DomainLabel; 5] = [
        DomainLabel::User,
        DomainLabel::Article,
        DomainLabel::Taxonomy,
        DomainLabel::Attachment,
        DomainLabel::Warehouse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Article => "Article",
            Self::Taxonomy => "Taxonomy",
            Self::Attachment => "Attachment",
            Self::Warehouse => "Warehouse",
        }
    }
}

impl fmt::Display for DomainLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DomainLabel {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| TableError::UnknownDomain(s.to_string()))
    }
}

/// Discriminant identifying the concrete shape of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    User,
    UserMetadata,
    Photo,
    PhotoMetadata,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [
        RecordKind::User,
        RecordKind::UserMetadata,
        RecordKind::Photo,
        RecordKind::PhotoMetadata,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::UserMetadata => "UserMetadata",
            Self::Photo => "Photo",
            Self::PhotoMetadata => "PhotoMetadata",
        }
    }

    /// The domain label records of this kind are stored under.
    pub fn domain(&self) -> DomainLabel {
        match self {
            Self::User | Self::UserMetadata => DomainLabel::User,
            Self::Photo | Self::PhotoMetadata => DomainLabel::Attachment,
        }
    }

    /// Returns an error unless `found` is this kind's domain.
    pub fn check_domain(&self, found: DomainLabel) -> Result<(), TableError> {
        let expected = self.domain();
        if expected == found {
            Ok(())
        } else {
            Err(TableError::DomainMismatch {
                kind: *self,
                expected,
                found,
            })
        }
    }

    /// Returns an error unless `found` equals this kind.
    pub fn check_kind(&self, found: RecordKind) -> Result<(), TableError> {
        if *self == found {
            Ok(())
        } else {
            Err(TableError::KindMismatch {
                expected: *self,
                found,
            })
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| TableError::UnknownKind(s.to_string()))
    }
}

/// Composite primary key shared by every record.
///
/// The partition key is fixed at construction; only the sort key can change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrimaryKey {
    #[serde(rename = "PK")]
    pk: String,
    #[serde(rename = "SK")]
    sk: String,
}

impl PrimaryKey {
    pub fn new(pk: impl Into<String>, sk: impl Into<String>) -> Self {
        Self {
            pk: pk.into(),
            sk: sk.into(),
        }
    }

    pub fn pk(&self) -> &str {
        &self.pk
    }

    pub fn sk(&self) -> &str {
        &self.sk
    }

    pub fn set_sk(&mut self, sk: impl Into<String>) {
        self.sk = sk.into();
    }

    pub fn with_sk(mut self, sk: impl Into<String>) -> Self {
        self.set_sk(sk);
        self
    }
}

/// Alternate index attributes (`GSI1`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryKeys<S> {
    #[serde(rename = "PK1")]
    pub pk1: DomainLabel,
    #[serde(rename = "SK1")]
    pub sk1: S,
}

/// Attribute populated only on records that take part in the sparse index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SparseIndexKey {
    #[serde(rename = "SI")]
    pub si: String,
}

impl SparseIndexKey {
    pub fn new(si: impl Into<String>) -> Self {
        Self { si: si.into() }
    }
}

/// A page of entities plus the cursor to continue from, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityPage<T> {
    pub items: Vec<T>,
    pub last_evaluated: Option<String>,
}

impl<T> EntityPage<T> {
    pub fn new(items: Vec<T>, last_evaluated: Option<String>) -> Self {
        Self {
            items,
            last_evaluated,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), None)
    }

    pub fn has_more(&self) -> bool {
        self.last_evaluated.is_some()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> EntityPage<U> {
        EntityPage {
            items: self.items.into_iter().map(f).collect(),
            last_evaluated: self.last_evaluated,
        }
    }

    /// Splits into the `(items, cursor)` pair.
    pub fn into_parts(self) -> (Vec<T>, Option<String>) {
        (self.items, self.last_evaluated)
    }
}
