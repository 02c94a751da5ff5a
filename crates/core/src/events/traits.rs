use async_trait::async_trait;

use super::{EmailContent, Event, Result};

/// Publishes lifecycle events to their topic.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &Event) -> Result<()>;
}

/// Delivers rendered e-mails.
#[async_trait]
pub trait EmailDispatcher: Send + Sync {
    async fn dispatch(&self, email: &EmailContent) -> Result<()>;
}
