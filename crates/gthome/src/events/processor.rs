use std::collections::VecDeque;
use std::sync::Arc;

use serde::Serialize;
use serde_json::json;

use gthome_core::events::{
    render_email, DispatchEmailMessage, DispatchEmailType, EmailDispatcher, Event, EventName,
    EventPublisher, Result, SnsPayload, UserLifecycleMessage,
};
use gthome_core::tables::UserRole;

/// Outcome of one notification payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub processed: usize,
    pub failures: Vec<RecordFailure>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFailure {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    pub error: String,
}

/// Handles lifecycle events.
///
/// Follow-up events (the e-mails a new user triggers) go to `publisher` when
/// one is set, and are handled in place otherwise.
pub struct EventProcessor {
    dispatcher: Arc<dyn EmailDispatcher>,
    publisher: Option<Arc<dyn EventPublisher>>,
    staff_email: Option<String>,
}

impl EventProcessor {
    pub fn new(dispatcher: Arc<dyn EmailDispatcher>, staff_email: Option<String>) -> Self {
        Self {
            dispatcher,
            publisher: None,
            staff_email,
        }
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Handle one event and everything it triggers.
    pub async fn process(&self, event: Event) -> Result<()> {
        let mut queue = VecDeque::from([event]);

        while let Some(event) = queue.pop_front() {
            for follow_up in self.handle(&event).await? {
                match &self.publisher {
                    Some(publisher) => publisher.publish(&follow_up).await?,
                    None => queue.push_back(follow_up),
                }
            }
        }
        Ok(())
    }

    /// Decode and process every record. A failing record is reported and
    /// does not stop the rest.
    pub async fn process_payload(
        &self,
        payload: &SnsPayload,
        fallback: Option<EventName>,
    ) -> BatchReport {
        let mut report = BatchReport::default();

        for (index, decoded) in payload.decode_events(fallback).into_iter().enumerate() {
            let message_id = payload
                .records
                .get(index)
                .and_then(|record| record.sns.message_id.clone());

            let outcome = match decoded {
                Ok(event) => self.process(event).await,
                Err(err) => Err(err),
            };

            match outcome {
                Ok(()) => report.processed += 1,
                Err(err) => {
                    tracing::error!(index, message_id = ?message_id, error = %err, "event record failed");
                    report.failures.push(RecordFailure {
                        index,
                        message_id,
                        error: err.to_string(),
                    });
                }
            }
        }

        report
    }

    /// Handle a single event, returning the events it triggers.
    pub async fn handle(&self, event: &Event) -> Result<Vec<Event>> {
        match event {
            Event::OnUserCreate(message) => Ok(self.on_user_create(message)),
            Event::OnUserUpdate(message) => {
                tracing::info!(email = %message.email, role = %message.role, "user updated");
                Ok(Vec::new())
            }
            Event::OnUserDelete(message) => {
                tracing::info!(email = %message.email, role = %message.role, "user deleted");
                Ok(Vec::new())
            }
            Event::DispatchEmail(message) => {
                let email = render_email(message);
                tracing::debug!(kind = %message.email_type, to = %email.to, "rendered e-mail");
                self.dispatcher.dispatch(&email).await?;
                Ok(Vec::new())
            }
        }
    }

    fn on_user_create(&self, message: &UserLifecycleMessage) -> Vec<Event> {
        tracing::info!(email = %message.email, role = %message.role, "user created");
        let data = json!({ "email": message.email, "role": message.role });

        match message.role {
            UserRole::Dealer => vec![Event::DispatchEmail(
                DispatchEmailMessage::new(DispatchEmailType::WelcomeDealer, &message.email)
                    .with_data(data),
            )],
            UserRole::Customer | UserRole::Guest => match &self.staff_email {
                Some(staff) => vec![Event::DispatchEmail(
                    DispatchEmailMessage::new(DispatchEmailType::DealerRequest, staff)
                        .with_data(data),
                )],
                None => {
                    tracing::info!(email = %message.email, "no staff mailbox configured, skipping dealer request");
                    Vec::new()
                }
            },
            _ => Vec::new(),
        }
    }
}
