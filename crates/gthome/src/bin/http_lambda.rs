use std::sync::Arc;

use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gthome::{
    config::Config,
    events::{LambdaEventPublisher, LogOnlyPublisher},
    router::handle_gateway_event,
    state::AppState,
};
use gthome_core::events::EventPublisher;
use gthome_core::http::GatewayResponse;

async fn handle_request(state: &AppState, event: LambdaEvent<Value>) -> Result<GatewayResponse, Error> {
    Ok(handle_gateway_event(state, event.payload).await)
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
    let publisher: Arc<dyn EventPublisher> = match LambdaEventPublisher::from_config(&config).await {
        Some(publisher) => Arc::new(publisher),
        None => Arc::new(LogOnlyPublisher),
    };
    let state = AppState::new(config).await?.with_publisher(publisher);
    let state = &state;

    lambda_runtime::run(service_fn(move |event| handle_request(state, event))).await
}
