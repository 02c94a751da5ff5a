use async_trait::async_trait;

use gthome_core::events::{EmailContent, EmailDispatcher, Result};

/// Hands e-mails to the log instead of a mail service.
#[derive(Debug, Clone, Default)]
pub struct LoggingEmailDispatcher;

#[async_trait]
impl EmailDispatcher for LoggingEmailDispatcher {
    async fn dispatch(&self, email: &EmailContent) -> Result<()> {
        tracing::info!(to = %email.to, subject = %email.subject, "dispatching e-mail");
        tracing::debug!(to = %email.to, body = %email.body, "e-mail body");
        Ok(())
    }
}
