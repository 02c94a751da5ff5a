use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::tables::UserRole;

use super::{EventError, Result};

// ============================================================================
// SNS envelope
// ============================================================================

/// Event received by a notification-triggered function as its first argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnsPayload {
    #[serde(rename = "Records")]
    pub records: Vec<SnsRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnsRecord {
    #[serde(rename = "Sns")]
    pub sns: SnsMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnsMessage {
    /// JSON-encoded event message.
    #[serde(rename = "Message")]
    pub message: String,
    #[serde(rename = "TopicArn", default, skip_serializing_if = "Option::is_none")]
    pub topic_arn: Option<String>,
    #[serde(rename = "MessageId", default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(rename = "Subject", default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

impl SnsPayload {
    /// Wraps typed events, one record each, with the event name as topic.
    pub fn from_events(events: &[Event]) -> Result<Self> {
        let records = events
            .iter()
            .map(|event| {
                Ok(SnsRecord {
                    sns: SnsMessage {
                        message: event.encode_message()?,
                        topic_arn: Some(event.name().to_string()),
                        message_id: None,
                        subject: None,
                    },
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { records })
    }

    /// Raw JSON messages, in record order.
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|record| record.sns.message.as_str())
    }

    /// Decodes every record's message into a typed value.
    pub fn decode_messages<T: DeserializeOwned>(&self, event: EventName) -> Vec<Result<T>> {
        self.messages()
            .map(|message| decode_message(event, message))
            .collect()
    }

    /// Decodes every record into an [`Event`].
    ///
    /// The name comes from the record's topic; `fallback` is used when the
    /// record has none. One bad record does not affect the others.
    pub fn decode_events(&self, fallback: Option<EventName>) -> Vec<Result<Event>> {
        self.records
            .iter()
            .map(|record| {
                let name = match record.sns.topic_arn.as_deref() {
                    Some(arn) => EventName::from_topic_arn(arn)?,
                    None => fallback.ok_or(EventError::MissingEventName)?,
                };
                Event::decode(name, &record.sns.message)
            })
            .collect()
    }
}

fn decode_message<T: DeserializeOwned>(event: EventName, message: &str) -> Result<T> {
    serde_json::from_str(message).map_err(|e| EventError::InvalidMessage {
        event,
        reason: e.to_string(),
    })
}

// ============================================================================
// Event names
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventName {
    OnUserCreate,
    OnUserUpdate,
    OnUserDelete,
    DispatchEmail,
}

impl EventName {
    pub const ALL: [EventName; 4] = [
        EventName::OnUserCreate,
        EventName::OnUserUpdate,
        EventName::OnUserDelete,
        EventName::DispatchEmail,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnUserCreate => "on-user-create",
            Self::OnUserUpdate => "on-user-update",
            Self::OnUserDelete => "on-user-delete",
            Self::DispatchEmail => "dispatch-email",
        }
    }

    /// Resolves the event from a topic ARN or bare topic name.
    ///
    /// Only the last `:`-separated segment is considered, and deployment
    /// prefixes such as `gthome-production-` before the event name are
    /// tolerated.
    pub fn from_topic_arn(arn: &str) -> Result<Self> {
        let topic = arn.rsplit(':').next().unwrap_or(arn);
        Self::ALL
            .into_iter()
            .find(|name| topic == name.as_str() || topic.ends_with(&format!("-{}", name.as_str())))
            .ok_or_else(|| EventError::UnknownEvent(topic.to_string()))
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventName {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| EventError::UnknownEvent(s.to_string()))
    }
}

// ============================================================================
// Messages
// ============================================================================

/// Message published after a user record is created, updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLifecycleMessage {
    pub email: String,
    pub role: UserRole,
}

pub type OnUserCreateMessage = UserLifecycleMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchEmailType {
    DealerRequest,
    WelcomeDealer,
}

impl DispatchEmailType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DealerRequest => "dealer_request",
            Self::WelcomeDealer => "welcome_dealer",
        }
    }
}

impl fmt::Display for DispatchEmailType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request to send one templated e-mail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchEmailMessage {
    #[serde(rename = "type")]
    pub email_type: DispatchEmailType,
    pub target: String,
    /// Template data; its shape depends on `email_type`.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl DispatchEmailMessage {
    pub fn new(email_type: DispatchEmailType, target: impl Into<String>) -> Self {
        Self {
            email_type,
            target: target.into(),
            data: serde_json::Value::Null,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    /// Decodes `data` into a typed template model.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.data.clone()).map_err(|e| EventError::InvalidMessage {
            event: EventName::DispatchEmail,
            reason: e.to_string(),
        })
    }
}

// ============================================================================
// Typed events
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    OnUserCreate(UserLifecycleMessage),
    OnUserUpdate(UserLifecycleMessage),
    OnUserDelete(UserLifecycleMessage),
    DispatchEmail(DispatchEmailMessage),
}

impl Event {
    pub fn name(&self) -> EventName {
        match self {
            Self::OnUserCreate(_) => EventName::OnUserCreate,
            Self::OnUserUpdate(_) => EventName::OnUserUpdate,
            Self::OnUserDelete(_) => EventName::OnUserDelete,
            Self::DispatchEmail(_) => EventName::DispatchEmail,
        }
    }

    /// Encodes the message as the JSON string carried in the envelope.
    pub fn encode_message(&self) -> Result<String> {
        let encoded = match self {
            Self::OnUserCreate(message)
            | Self::OnUserUpdate(message)
            | Self::OnUserDelete(message) => serde_json::to_string(message),
            Self::DispatchEmail(message) => serde_json::to_string(message),
        };
        encoded.map_err(|e| EventError::Encode {
            event: self.name(),
            reason: e.to_string(),
        })
    }

    pub fn decode(name: EventName, message: &str) -> Result<Self> {
        Ok(match name {
            EventName::OnUserCreate => Self::OnUserCreate(decode_message(name, message)?),
            EventName::OnUserUpdate => Self::OnUserUpdate(decode_message(name, message)?),
            EventName::OnUserDelete => Self::OnUserDelete(decode_message(name, message)?),
            EventName::DispatchEmail => Self::DispatchEmail(decode_message(name, message)?),
        })
    }
}
