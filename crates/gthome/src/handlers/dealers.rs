use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use gthome_core::auth::{normalize_cpf, validate_email};
use gthome_core::events::{Event, UserLifecycleMessage};
use gthome_core::http::{Request, ResourceAction, Response};
use gthome_core::serde::deserialize_optional_string;
use gthome_core::tables::{User, UserMeta, UserMetaKey, UserRole};

use super::{require_role, AppError, RequestError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateDealerBody {
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    email: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    cpf: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    rg: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    display_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    phone: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    whatsapp: Option<String>,
}

/// Register a dealer account (POST /dealers).
///
/// Dealers are created without a password and sign in passwordless until
/// they set one.
pub async fn create_dealer(state: &AppState, request: &Request) -> Result<Response, AppError> {
    require_role(request, ResourceAction::CreateDealer, UserRole::can_manage_dealers)?;

    let body: CreateDealerBody = request.json_body()?;
    let email = body.email.ok_or(RequestError::MissingField("email"))?;
    if !validate_email(&email) {
        return Err(RequestError::invalid("email", "not a valid e-mail address").into());
    }
    let cpf = body.cpf.ok_or(RequestError::MissingField("cpf"))?;
    let cpf = normalize_cpf(&cpf).ok_or_else(|| RequestError::invalid("cpf", "check digits do not match"))?;
    let rg = body.rg.ok_or(RequestError::MissingField("rg"))?;

    let user = User::new(&email, cpf, rg.trim(), UserRole::Dealer);
    let id = user.id();
    let mut meta = vec![
        UserMeta::new(id, UserMetaKey::Role, user.role.as_str()),
        UserMeta::timestamp(id, UserMetaKey::CreatedAt, Utc::now()),
        UserMeta::flag(id, UserMetaKey::HasPassword, false),
        UserMeta::flag(id, UserMetaKey::PasswordlessEnabled, true),
    ];
    let optional = [
        (UserMetaKey::DisplayName, body.display_name),
        (UserMetaKey::Phone, body.phone),
        (UserMetaKey::Whatsapp, body.whatsapp),
    ];
    meta.extend(
        optional
            .into_iter()
            .filter_map(|(key, value)| value.map(|value| UserMeta::new(id, key, value.trim()))),
    );
    state.users.create_user_with_meta(&user, &meta).await?;

    tracing::info!(user_id = %id, created_by = ?request.subject, "dealer created");

    // The account exists at this point; a lost notification must not undo it.
    let event = Event::OnUserCreate(UserLifecycleMessage {
        email: user.username.clone(),
        role: user.role,
    });
    if let Err(err) = state.publisher.publish(&event).await {
        tracing::error!(user_id = %id, error = %err, "failed to publish user creation");
    }

    Ok(Response::created(
        json!({
            "id": id,
            "email": user.username,
            "role": user.role,
        }),
        format!("/dealers/{id}"),
    ))
}
