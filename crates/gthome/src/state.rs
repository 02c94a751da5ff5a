//! Application state shared by every route handler.
//!
//! Repositories and the event publisher are trait objects so the same
//! handlers run against the in-memory store in tests and the development
//! server, and against DynamoDB when built with the `dynamodb` feature.

use std::sync::Arc;

use gthome_core::events::EventPublisher;
use gthome_core::storage::{PhotoRepository, UserRepository};

use crate::config::Config;
use crate::events::LogOnlyPublisher;
use crate::storage::InMemoryRepository;
use crate::token::TokenService;

/// Shared application state.
///
/// Cloning is cheap; every field is reference counted.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub photos: Arc<dyn PhotoRepository>,
    /// Destination for lifecycle events raised by handlers.
    pub publisher: Arc<dyn EventPublisher>,
    pub tokens: Arc<TokenService>,
    pub config: Arc<Config>,
}

impl AppState {
    fn build(
        users: Arc<dyn UserRepository>,
        photos: Arc<dyn PhotoRepository>,
        config: Config,
    ) -> Self {
        Self {
            users,
            photos,
            publisher: Arc::new(LogOnlyPublisher),
            tokens: Arc::new(TokenService::from_config(&config)),
            config: Arc::new(config),
        }
    }

    /// State backed by a fresh in-memory table.
    pub fn in_memory(config: Config) -> Self {
        let repo = Arc::new(InMemoryRepository::new());
        Self::build(repo.clone(), repo, config)
    }

    /// State backed by the storage selected at compile time.
    #[cfg(feature = "inmemory")]
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        tracing::info!("using in-memory storage");
        Ok(Self::in_memory(config))
    }

    /// State backed by the storage selected at compile time.
    #[cfg(feature = "dynamodb")]
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        use crate::storage::DynamoDbRepository;

        let repo = Arc::new(DynamoDbRepository::from_config(&config).await);
        tracing::info!(table = %repo.table_name(), "using DynamoDB storage");
        Ok(Self::build(repo.clone(), repo, config))
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publisher = publisher;
        self
    }
}
