//! In-process event topic.
//!
//! Provides a pub/sub mechanism for lifecycle events using a tokio broadcast
//! channel, for the development server and tests.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use gthome_core::events::{Event, EventPublisher, Result};

use super::EventProcessor;

/// Channel capacity for published events.
const CHANNEL_CAPACITY: usize = 100;

/// In-memory topic backed by a broadcast channel.
#[derive(Debug, Clone)]
pub struct MemoryTopic {
    sender: broadcast::Sender<Event>,
}

impl MemoryTopic {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }
}

impl Default for MemoryTopic {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for MemoryTopic {
    async fn publish(&self, event: &Event) -> Result<()> {
        // No receivers just means nothing is listening yet.
        if self.sender.send(event.clone()).is_err() {
            tracing::debug!(event = %event.name(), "event published with no listener");
        }
        Ok(())
    }
}

/// Publisher used when no event destination is configured.
#[derive(Debug, Clone, Default)]
pub struct LogOnlyPublisher;

#[async_trait]
impl EventPublisher for LogOnlyPublisher {
    async fn publish(&self, event: &Event) -> Result<()> {
        tracing::warn!(event = %event.name(), "no event destination configured, dropping event");
        Ok(())
    }
}

/// Run `processor` over every event published on `topic` until the topic
/// closes or `shutdown` fires.
pub fn spawn_event_listener(
    topic: &MemoryTopic,
    processor: Arc<EventProcessor>,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    let mut receiver = topic.subscribe();

    tokio::spawn(async move {
        tracing::debug!("event listener started");

        loop {
            tokio::select! {
                result = receiver.recv() => {
                    match result {
                        Ok(event) => {
                            let name = event.name();
                            if let Err(err) = processor.process(event).await {
                                tracing::error!(event = %name, error = %err, "event handling failed");
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            tracing::warn!(lagged = n, "event listener lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            tracing::info!("event topic closed");
                            break;
                        }
                    }
                }
                _ = shutdown.recv() => {
                    tracing::debug!("event listener shutting down");
                    break;
                }
            }
        }
    })
}
