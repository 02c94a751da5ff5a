//! Lifecycle events and their notification envelope.

mod email;
mod error;
mod traits;
mod types;

pub use email::{render_email, EmailContent};
pub use error::{EventError, Result};
pub use traits::{EmailDispatcher, EventPublisher};
pub use types::{
    DispatchEmailMessage, DispatchEmailType, Event, EventName, OnUserCreateMessage, SnsMessage,
    SnsPayload, SnsRecord, UserLifecycleMessage,
};
