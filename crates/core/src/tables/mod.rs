//! Single-table data model.
//!
//! Every record lives in one table keyed by `PK`/`SK`, carries a domain label
//! in `PK1` and a kind-specific value in `SK1` for the `GSI1` index, and a
//! subset of records populate `SI` for the sparse index.

mod entities;
mod error;
pub mod keys;
mod types;

pub use entities::{
    Photo, PhotoMeta, PhotoMetaKey, Record, User, UserMeta, UserMetaKey, UserRole,
};
pub use error::TableError;
pub use types::{
    DomainLabel, EntityPage, PrimaryKey, RecordKind, SecondaryKeys, SparseIndexKey, ATTR_KIND,
    ATTR_PK, ATTR_PK1, ATTR_SI, ATTR_SK, ATTR_SK1, GSI1_INDEX, SPARSE_INDEX,
};
