//! Storage backend implementations.
//!
//! This module provides concrete implementations of the repository traits
//! defined in `gthome_core::storage`. The backend used by the application
//! state is selected at compile time via feature flags.
//!
//! # Feature Flags
//!
//! - `inmemory` (default): in-process single-table emulation
//! - `dynamodb`: AWS DynamoDB storage backend using `aws-sdk-dynamodb`
//!
//! These features are mutually exclusive - only one storage backend can be
//! enabled at a time. The in-memory repository is always compiled so tests
//! can run against it.
//!
//! # Examples
//!
//! Build with DynamoDB:
//! ```bash
//! cargo build -p gthome --no-default-features --features dynamodb
//! ```

// Compile-time checks for mutual exclusivity
#[cfg(all(feature = "inmemory", feature = "dynamodb"))]
compile_error!(
    "Features 'inmemory' and 'dynamodb' are mutually exclusive. \
    Enable only one storage backend at a time."
);

#[cfg(not(any(feature = "inmemory", feature = "dynamodb")))]
compile_error!(
    "No storage backend selected. Enable 'inmemory' or 'dynamodb' feature. \
    Example: cargo build -p gthome --no-default-features --features dynamodb"
);

pub mod inmemory;

#[cfg(feature = "dynamodb")]
pub mod dynamodb;

pub use inmemory::InMemoryRepository;

#[cfg(feature = "dynamodb")]
pub use dynamodb::DynamoDbRepository;
