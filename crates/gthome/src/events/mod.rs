//! Lifecycle event publishing and handling.
//!
//! Route handlers publish events through an [`EventPublisher`]; the
//! [`EventProcessor`] consumes them, either from the in-process topic of the
//! development server or from notification payloads delivered to the events
//! Lambda.
//!
//! [`EventPublisher`]: gthome_core::events::EventPublisher

mod dispatcher;
#[cfg(feature = "lambda")]
mod lambda;
mod processor;
mod topic;

pub use dispatcher::LoggingEmailDispatcher;
#[cfg(feature = "lambda")]
pub use lambda::LambdaEventPublisher;
pub use processor::{BatchReport, EventProcessor, RecordFailure};
pub use topic::{spawn_event_listener, LogOnlyPublisher, MemoryTopic};
