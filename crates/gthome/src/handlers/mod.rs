//! Route handlers, one per [`ResourceAction`].
//!
//! Handlers take the shared state and the decoded request envelope and
//! return a [`Response`]; the router has already attached the caller's
//! identity from the bearer token.

pub mod auth;
pub mod dealers;
mod error;
pub mod photos;

use gthome_core::auth::AuthError;
use gthome_core::http::{Request, ResourceAction, Response};
use gthome_core::tables::UserRole;

use crate::state::AppState;

pub use auth::authenticate_user;
pub use dealers::create_dealer;
pub use error::{AppError, RequestError};
pub use photos::{create_photo_attachment, list_photo_attachments};

/// Run the handler for `action`.
pub async fn handle(
    action: ResourceAction,
    state: &AppState,
    request: &Request,
) -> Result<Response, AppError> {
    match action {
        ResourceAction::AuthenticateUser => authenticate_user(state, request).await,
        ResourceAction::CreateDealer => create_dealer(state, request).await,
        ResourceAction::CreatePhotoAttachment => create_photo_attachment(state, request).await,
        ResourceAction::ListPhotoAttachments => list_photo_attachments(state, request).await,
    }
}

/// Check that the caller is authenticated with a role `allowed` accepts.
pub(crate) fn require_role(
    request: &Request,
    action: ResourceAction,
    allowed: impl Fn(&UserRole) -> bool,
) -> Result<UserRole, AuthError> {
    let role = request.role.ok_or(AuthError::MissingToken)?;
    if !allowed(&role) {
        return Err(AuthError::Forbidden {
            role: role.to_string(),
            action: action.to_string(),
        });
    }
    Ok(role)
}
