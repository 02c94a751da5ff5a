use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use gthome_core::auth::{verify_password, AuthError};
use gthome_core::http::{Request, Response, ResponseStatus};
use gthome_core::tables::{UserMeta, UserMetaKey};

use super::{AppError, RequestError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct Credentials {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

/// Exchange e-mail and password for an access token (POST /auth).
pub async fn authenticate_user(state: &AppState, request: &Request) -> Result<Response, AppError> {
    let credentials: Credentials = request.json_body()?;
    if credentials.email.trim().is_empty() {
        return Err(RequestError::MissingField("email").into());
    }
    if credentials.password.is_empty() {
        return Err(RequestError::MissingField("password").into());
    }

    let user = state
        .users
        .get_user_by_username(&credentials.email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let digest = user.password.as_deref().ok_or(AuthError::PasswordNotSet)?;
    if !verify_password(&credentials.password, digest)? {
        return Err(AuthError::InvalidCredentials.into());
    }

    let issued = state.tokens.issue(&user)?;
    state
        .users
        .put_user_meta(&UserMeta::timestamp(
            user.id(),
            UserMetaKey::LastAccessAt,
            Utc::now(),
        ))
        .await?;

    tracing::info!(user_id = %user.id(), role = %user.role, "user authenticated");

    let mut response = Response::json(
        ResponseStatus::Ok,
        &json!({
            "token": issued.token,
            "role": user.role,
            "expiresIn": issued.expires_in,
        }),
    )?;
    response.headers_mut().x_refresh_token = Some(issued.token);
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gthome_core::auth::hash_password;
    use gthome_core::http::{Method, ResponseBody};
    use gthome_core::tables::{User, UserRole};

    use crate::config::Config;

    async fn state_with_user(password: Option<&str>) -> (AppState, User) {
        let state = AppState::in_memory(Config::default());
        let mut user = User::new("maria@example.com", "52998224725", "123456", UserRole::Admin);
        if let Some(password) = password {
            user = user.with_password(hash_password(password));
        }
        state.users.create_user(&user).await.unwrap();
        (state, user)
    }

    fn login(email: &str, password: &str) -> Request {
        Request::new(Method::Post, "/auth")
            .with_json_body(json!({"email": email, "password": password}))
    }

    #[tokio::test]
    async fn test_authenticate_issues_token() {
        let (state, user) = state_with_user(Some("s3cret")).await;

        let response = authenticate_user(&state, &login("Maria@Example.com", "s3cret"))
            .await
            .unwrap_or_else(|_| panic!("authentication should succeed"));

        assert_eq!(response.status(), ResponseStatus::Ok);
        let Some(ResponseBody::Json(body)) = &response.body else {
            panic!("expected a JSON body");
        };
        assert_eq!(body["role"], "Admin");
        assert_eq!(body["expiresIn"], 3600);

        let token = body["token"].as_str().unwrap();
        let refresh = response.headers.as_ref().unwrap().x_refresh_token.as_deref();
        assert_eq!(refresh, Some(token));

        let claims = state.tokens.verify(token).unwrap();
        assert_eq!(claims.sub, Some(user.id().to_string()));

        let last_access = state
            .users
            .get_user_meta(user.id(), UserMetaKey::LastAccessAt)
            .await
            .unwrap();
        assert!(last_access.and_then(|meta| meta.as_datetime()).is_some());
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let (state, _) = state_with_user(Some("s3cret")).await;

        let response = match authenticate_user(&state, &login("maria@example.com", "nope")).await {
            Ok(_) => panic!("authentication should fail"),
            Err(err) => err.into_response(),
        };

        assert_eq!(response.status(), ResponseStatus::Unauthorized);
    }

    #[tokio::test]
    async fn test_unknown_user_is_unauthorized() {
        let (state, _) = state_with_user(Some("s3cret")).await;

        let response = match authenticate_user(&state, &login("joao@example.com", "s3cret")).await {
            Ok(_) => panic!("authentication should fail"),
            Err(err) => err.into_response(),
        };

        assert_eq!(response.status(), ResponseStatus::Unauthorized);
    }

    #[tokio::test]
    async fn test_user_without_password_is_forbidden() {
        let (state, _) = state_with_user(None).await;

        let response = match authenticate_user(&state, &login("maria@example.com", "s3cret")).await {
            Ok(_) => panic!("authentication should fail"),
            Err(err) => err.into_response(),
        };

        assert_eq!(response.status(), ResponseStatus::Forbidden);
    }

    #[tokio::test]
    async fn test_missing_body_is_bad_request() {
        let (state, _) = state_with_user(Some("s3cret")).await;

        let response = match authenticate_user(&state, &Request::new(Method::Post, "/auth")).await {
            Ok(_) => panic!("authentication should fail"),
            Err(err) => err.into_response(),
        };

        assert_eq!(response.status(), ResponseStatus::BadRequest);
    }
}
