//! Rendering of dispatch-email messages into concrete e-mails.

use serde::{Deserialize, Serialize};

use super::{DispatchEmailMessage, DispatchEmailType};

/// A rendered e-mail ready to hand to a delivery backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailContent {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Template data understood by the dealer e-mails. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DealerTemplate {
    display_name: Option<String>,
    email: Option<String>,
    role: Option<String>,
}

/// Render a dispatch message. Unknown or malformed template data falls back
/// to the generic wording instead of failing the dispatch.
pub fn render_email(message: &DispatchEmailMessage) -> EmailContent {
    let data: DealerTemplate = message.data_as().unwrap_or_default();

    let (subject, body) = match message.email_type {
        DispatchEmailType::WelcomeDealer => {
            let greeting = match &data.display_name {
                Some(name) => format!("Olá, {name}!"),
                None => "Olá!".to_string(),
            };
            (
                "Bem-vindo à rede de revendedores Geisa Thome".to_string(),
                format!(
                    "{greeting}\n\nSeu cadastro de revendedor foi criado. \
                     Acesse o site com o e-mail {} para começar.",
                    message.target
                ),
            )
        }
        DispatchEmailType::DealerRequest => {
            let requester = data.email.as_deref().unwrap_or("um visitante");
            let role = data.role.as_deref().unwrap_or("Guest");
            (
                "Nova solicitação de revendedor".to_string(),
                format!("{requester} ({role}) pediu para se tornar revendedor."),
            )
        }
    };

    EmailContent {
        to: message.target.clone(),
        subject,
        body,
    }
}
