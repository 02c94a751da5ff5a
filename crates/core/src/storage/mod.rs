//! Repository contracts over the single table.

mod error;
mod http_mapping;
mod traits;
mod types;

pub use error::{RepositoryError, Result};
pub use http_mapping::repository_error_to_status;
pub use traits::{PhotoRepository, UserRepository};
pub use types::{Cursor, PageRequest, MAX_PAGE_SIZE};
