use std::sync::Arc;

use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gthome::{
    config::Config,
    events::{BatchReport, EventProcessor, LambdaEventPublisher, LoggingEmailDispatcher},
};
use gthome_core::events::{EventName, SnsPayload};

async fn handle_event(
    processor: &EventProcessor,
    fallback: Option<EventName>,
    event: LambdaEvent<Value>,
) -> Result<BatchReport, Error> {
    let payload: SnsPayload = serde_json::from_value(event.payload)
        .map_err(|error| Error::from(format!("invalid notification payload: {error}")))?;

    let report = processor.process_payload(&payload, fallback).await;
    tracing::info!(
        processed = report.processed,
        failed = report.failures.len(),
        "notification payload handled"
    );
    Ok(report)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gthome=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().json().without_time())
        .init();

    let config = Config::from_env()?;

    // Payloads invoked directly carry no topic; EVENT_NAME names the event.
    let fallback = std::env::var("EVENT_NAME")
        .ok()
        .map(|name| name.parse::<EventName>())
        .transpose()?;

    let mut processor =
        EventProcessor::new(Arc::new(LoggingEmailDispatcher), config.staff_email.clone());
    if let Some(publisher) = LambdaEventPublisher::from_config(&config).await {
        processor = processor.with_publisher(Arc::new(publisher));
    }
    let processor = &processor;

    lambda_runtime::run(service_fn(move |event| handle_event(processor, fallback, event))).await
}
