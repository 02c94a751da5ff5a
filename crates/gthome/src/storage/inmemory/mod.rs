//! In-memory storage backend.
//!
//! Emulates the single table: items are stored as flat attribute maps keyed
//! by `(PK, SK)`, and the `GSI1` and `SI` indexes are answered by scanning
//! those attributes. Data is not persisted and is lost when the repository
//! is dropped.
//!
//! # Example
//!
//! ```rust,ignore
//! use gthome::storage::inmemory::InMemoryRepository;
//!
//! let repo = InMemoryRepository::new();
//! repo.create_user(&user).await?;
//! ```

mod repository;

pub use repository::InMemoryRepository;
