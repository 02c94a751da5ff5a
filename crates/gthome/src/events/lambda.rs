//! Event publishing through an asynchronous Lambda invocation.

use async_trait::async_trait;
use aws_sdk_lambda::types::InvocationType;

use gthome_core::events::{Event, EventError, EventPublisher, Result, SnsPayload};

use crate::config::Config;

/// Publishes each event as a one-record notification payload to the events
/// function.
#[derive(Debug, Clone)]
pub struct LambdaEventPublisher {
    client: aws_sdk_lambda::Client,
    function_name: String,
}

impl LambdaEventPublisher {
    pub fn new(client: aws_sdk_lambda::Client, function_name: impl Into<String>) -> Self {
        Self {
            client,
            function_name: function_name.into(),
        }
    }

    /// Build a publisher from the ambient AWS configuration. Returns `None`
    /// when no events function is configured.
    pub async fn from_config(config: &Config) -> Option<Self> {
        let function_name = config.events_function_name.clone()?;
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Some(Self::new(aws_sdk_lambda::Client::new(&aws_config), function_name))
    }
}

#[async_trait]
impl EventPublisher for LambdaEventPublisher {
    async fn publish(&self, event: &Event) -> Result<()> {
        let payload = SnsPayload::from_events(std::slice::from_ref(event))?;
        let bytes =
            serde_json::to_vec(&payload).map_err(|e| EventError::Publish(e.to_string()))?;

        self.client
            .invoke()
            .function_name(&self.function_name)
            .invocation_type(InvocationType::Event)
            .set_payload(Some(bytes.into()))
            .send()
            .await
            .map_err(|e| EventError::Publish(format!("failed to invoke {}: {e}", self.function_name)))?;

        tracing::debug!(event = %event.name(), function = %self.function_name, "event published");
        Ok(())
    }
}
