//! Route table and request dispatch.
//!
//! Both entry points (the HTTP Lambda and the axum development server) turn
//! their input into a [`Request`] envelope and hand it to [`dispatch`], so
//! routing, authentication and error mapping behave the same everywhere.

use serde_json::Value;
use tracing::Instrument;
use uuid::Uuid;

use gthome_core::auth::AuthError;
use gthome_core::http::{
    headers::{CONTENT_TYPE, GEISA_THOME_ID, JSON_CONTENT_TYPE},
    GatewayResponse, Method, Request, ResourceAction, Response, ResponseStatus,
};

use crate::handlers::{self, AppError};
use crate::state::AppState;

struct Route {
    method: Method,
    path: &'static str,
    action: ResourceAction,
}

const ROUTES: [Route; 4] = [
    Route {
        method: Method::Post,
        path: "/auth",
        action: ResourceAction::AuthenticateUser,
    },
    Route {
        method: Method::Post,
        path: "/dealers",
        action: ResourceAction::CreateDealer,
    },
    Route {
        method: Method::Post,
        path: "/photos",
        action: ResourceAction::CreatePhotoAttachment,
    },
    Route {
        method: Method::Get,
        path: "/photos",
        action: ResourceAction::ListPhotoAttachments,
    },
];

fn normalize_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

/// Whether any route serves `path`, whatever the method.
pub fn is_known_path(path: &str) -> bool {
    let path = normalize_path(path);
    ROUTES.iter().any(|route| route.path == path)
}

/// Resolve a method and path to an action, or to the 404/405 status
/// the caller should answer with.
pub fn route(method: Method, path: &str) -> Result<ResourceAction, ResponseStatus> {
    let path = normalize_path(path);
    let mut known_path = false;

    for route in &ROUTES {
        if route.path == path {
            if route.method == method {
                return Ok(route.action);
            }
            known_path = true;
        }
    }

    Err(if known_path {
        ResponseStatus::MethodNotAllowed
    } else {
        ResponseStatus::NotFound
    })
}

/// Answer for a method the envelope cannot carry (`HEAD`, `TRACE`, ...).
pub fn unsupported_method(path: &str) -> Response {
    if is_known_path(path) {
        Response::error(ResponseStatus::MethodNotAllowed, "Method not allowed")
    } else {
        Response::error(ResponseStatus::NotFound, "Not found")
    }
}

/// CORS preflight. The CORS headers themselves are added on conversion.
pub fn preflight(path: &str) -> Response {
    if is_known_path(path) {
        Response::no_content()
    } else {
        Response::error(ResponseStatus::NotFound, "Not found")
    }
}

/// Replace any client-supplied identity with the one in the bearer token.
fn authenticate(state: &AppState, request: &mut Request) -> Result<(), AuthError> {
    request.role = None;
    request.email = None;
    request.subject = None;

    let claims = match request.bearer_token() {
        Some(token) => state.tokens.verify(token)?,
        None => return Ok(()),
    };

    request.email = Some(claims.email);
    request.role = claims.role;
    request.subject = claims.sub;
    Ok(())
}

async fn resolve(state: &AppState, mut request: Request) -> Response {
    let action = match route(request.effective_method(), &request.path) {
        Ok(action) => action,
        Err(status) => {
            tracing::debug!(status = %status, "no route");
            return Response::error(status, status.reason());
        }
    };

    if let Err(err) = authenticate(state, &mut request) {
        return AppError::from(err).into_response();
    }

    let route_key = format!("{} {}", request.effective_method(), normalize_path(&request.path));
    request.route_key = Some(route_key);
    tracing::debug!(action = %action, role = ?request.role, "dispatching");

    handlers::handle(action, state, &request)
        .await
        .unwrap_or_else(AppError::into_response)
}

/// Route and run one request.
///
/// Every response carries `Geisa-Thome-Id`: the caller's request id, or a
/// fresh one.
pub async fn dispatch(state: &AppState, request: Request) -> Response {
    let request_id = request
        .request_id()
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let span = tracing::info_span!(
        "request",
        id = %request_id,
        method = %request.effective_method(),
        path = %request.path,
    );

    async move {
        let mut response = resolve(state, request).await;
        tracing::info!(status = %response.status(), "request completed");
        response.headers_mut().geisa_thome_id = Some(request_id);
        response
    }
    .instrument(span)
    .await
}

/// Convert into a gateway response, falling back to a bare 500 if the body
/// cannot be encoded.
pub fn to_gateway(state: &AppState, response: Response) -> GatewayResponse {
    let cors = state.config.cors_policy();
    response.into_gateway(&cors).unwrap_or_else(|err| {
        tracing::error!(error = %err, "failed to encode response");
        let mut headers = cors.headers().into_map();
        headers.insert(CONTENT_TYPE.to_string(), JSON_CONTENT_TYPE.to_string());
        GatewayResponse {
            status_code: ResponseStatus::InternalServerError.as_u16(),
            headers,
            body: r#"{"message":"Internal server error"}"#.to_string(),
            is_base64_encoded: false,
        }
    })
}

fn event_str<'a>(event: &'a Value, field: &str) -> Option<&'a str> {
    event.get(field).and_then(Value::as_str)
}

/// Request id taken from a raw event's headers, or a fresh one.
fn event_request_id(event: &Value) -> String {
    event
        .get("headers")
        .and_then(Value::as_object)
        .and_then(|headers| {
            headers
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(GEISA_THOME_ID))
                .and_then(|(_, value)| value.as_str())
        })
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Handle a raw API Gateway proxy event.
///
/// The method is checked before the envelope is decoded: `OPTIONS` is a
/// preflight, and methods the envelope cannot carry answer like any other
/// wrong method on the path.
pub async fn handle_gateway_event(state: &AppState, event: Value) -> GatewayResponse {
    let method = event_str(&event, "method").or_else(|| event_str(&event, "httpMethod"));
    let path = event_str(&event, "path").unwrap_or("/");

    let early = match method {
        Some(method) if method.eq_ignore_ascii_case("OPTIONS") => Some(preflight(path)),
        Some(method) if method.parse::<Method>().is_err() => {
            tracing::debug!(method, path, "unsupported method");
            Some(unsupported_method(path))
        }
        _ => None,
    };

    let response = match early {
        Some(mut response) => {
            response.headers_mut().geisa_thome_id = Some(event_request_id(&event));
            response
        }
        None => {
            let request_id = event_request_id(&event);
            match serde_json::from_value::<Request>(event) {
                Ok(request) => dispatch(state, request).await,
                Err(err) => {
                    tracing::warn!(error = %err, "invalid gateway event");
                    let mut response = Response::error(
                        ResponseStatus::BadRequest,
                        format!("invalid request: {err}"),
                    );
                    response.headers_mut().geisa_thome_id = Some(request_id);
                    response
                }
            }
        }
    };

    to_gateway(state, response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use gthome_core::auth::hash_password;
    use gthome_core::tables::{User, UserRole};

    use std::time::Duration;

    use crate::config::Config;
    use crate::token::TokenService;

    async fn state_with_admin() -> AppState {
        let state = AppState::in_memory(Config::default());
        let admin = User::new("admin@gthome.com.br", "52998224725", "1", UserRole::Admin)
            .with_password(hash_password("s3cret"));
        state.users.create_user(&admin).await.unwrap();
        state
    }

    fn token_for(state: &AppState, role: UserRole) -> String {
        let user = User::new("someone@gthome.com.br", "52998224725", "1", role);
        state.tokens.issue(&user).unwrap().token
    }

    #[test]
    fn test_route_table() {
        assert_eq!(route(Method::Post, "/auth"), Ok(ResourceAction::AuthenticateUser));
        assert_eq!(route(Method::Post, "/dealers/"), Ok(ResourceAction::CreateDealer));
        assert_eq!(route(Method::Get, "/photos"), Ok(ResourceAction::ListPhotoAttachments));
        assert_eq!(route(Method::Post, "/photos"), Ok(ResourceAction::CreatePhotoAttachment));
        assert_eq!(route(Method::Delete, "/photos"), Err(ResponseStatus::MethodNotAllowed));
        assert_eq!(route(Method::Get, "/articles"), Err(ResponseStatus::NotFound));
    }

    #[test]
    fn test_preflight() {
        assert_eq!(preflight("/photos").status(), ResponseStatus::NoContent);
        assert_eq!(preflight("/nope").status(), ResponseStatus::NotFound);
    }

    #[tokio::test]
    async fn test_dispatch_echoes_request_id() {
        let state = state_with_admin().await;
        let request = Request::new(Method::Get, "/photos").with_header("geisa-thome-id", "req-42");

        let response = dispatch(&state, request).await;

        assert_eq!(response.status(), ResponseStatus::Ok);
        assert_eq!(
            response.headers.unwrap().geisa_thome_id.as_deref(),
            Some("req-42")
        );
    }

    #[tokio::test]
    async fn test_dispatch_generates_request_id() {
        let state = state_with_admin().await;

        let response = dispatch(&state, Request::new(Method::Get, "/missing")).await;

        assert_eq!(response.status(), ResponseStatus::NotFound);
        let id = response.headers.unwrap().geisa_thome_id.unwrap();
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[tokio::test]
    async fn test_identity_comes_from_token_only() {
        let state = state_with_admin().await;
        let mut request = Request::new(Method::Post, "/dealers").with_json_body(json!({
            "email": "maria@example.com", "cpf": "529.982.247-25", "rg": "1"
        }));
        request.role = Some(UserRole::Super);

        let response = dispatch(&state, request).await;

        assert_eq!(response.status(), ResponseStatus::Unauthorized);
    }

    #[tokio::test]
    async fn test_invalid_token_is_unauthorized_on_any_route() {
        let state = state_with_admin().await;
        let request = Request::new(Method::Get, "/photos").with_header("Authorization", "Bearer nope");

        let response = dispatch(&state, request).await;

        assert_eq!(response.status(), ResponseStatus::Unauthorized);
        assert_eq!(
            response.headers.unwrap().www_authenticate.as_deref(),
            Some("Bearer")
        );
    }

    #[tokio::test]
    async fn test_dealer_creation_with_token() {
        let state = state_with_admin().await;
        let token = token_for(&state, UserRole::Admin);
        let request = Request::new(Method::Post, "/dealers")
            .with_header("Authorization", format!("Bearer {token}"))
            .with_json_body(json!({
                "email": "maria@example.com", "cpf": "529.982.247-25", "rg": "1"
            }));

        let response = dispatch(&state, request).await;

        assert_eq!(response.status(), ResponseStatus::Created);
    }

    #[tokio::test]
    async fn test_gateway_event_round_trip() {
        let state = state_with_admin().await;

        let gateway = handle_gateway_event(
            &state,
            json!({
                "httpMethod": "POST",
                "path": "/auth",
                "headers": {"Content-Type": "application/json"},
                "isBase64Encoded": false,
                "body": "{\"email\":\"admin@gthome.com.br\",\"password\":\"s3cret\"}"
            }),
        )
        .await;

        assert_eq!(gateway.status_code, 200);
        assert!(gateway.headers.contains_key("X-Refresh-Token"));
        assert!(gateway.headers.contains_key("Geisa-Thome-Id"));
        assert_eq!(gateway.headers["Access-Control-Allow-Origin"], "*");
        let body: Value = serde_json::from_str(&gateway.body).unwrap();
        assert_eq!(body["role"], "Admin");
    }

    #[tokio::test]
    async fn test_gateway_preflight_and_bad_events() {
        let state = state_with_admin().await;

        let options = handle_gateway_event(
            &state,
            json!({"httpMethod": "OPTIONS", "path": "/photos", "headers": {"Geisa-Thome-Id": "p-1"}}),
        )
        .await;
        assert_eq!(options.status_code, 204);
        assert_eq!(options.body, "");
        assert_eq!(options.headers["Geisa-Thome-Id"], "p-1");
        assert!(options.headers.contains_key("Access-Control-Allow-Methods"));

        let wrong_method =
            handle_gateway_event(&state, json!({"httpMethod": "DELETE", "path": "/auth"})).await;
        assert_eq!(wrong_method.status_code, 405);

        let malformed = handle_gateway_event(&state, json!({"path": "/photos"})).await;
        assert_eq!(malformed.status_code, 400);
        assert!(malformed.headers.contains_key("Geisa-Thome-Id"));
    }

    #[tokio::test]
    async fn test_gateway_methods_outside_envelope_match_dev_server() {
        let state = state_with_admin().await;

        for method in ["HEAD", "TRACE", "CONNECT"] {
            let known = handle_gateway_event(
                &state,
                json!({"httpMethod": method, "path": "/photos", "headers": {"Geisa-Thome-Id": "m-1"}}),
            )
            .await;
            assert_eq!(known.status_code, 405, "{method}");
            assert_eq!(known.status_code, unsupported_method("/photos").status().as_u16());
            assert_eq!(known.headers["Geisa-Thome-Id"], "m-1");
            assert_eq!(known.headers["Access-Control-Allow-Origin"], "*");

            let unknown =
                handle_gateway_event(&state, json!({"httpMethod": method, "path": "/articles"})).await;
            assert_eq!(unknown.status_code, 404, "{method}");
        }
    }

    #[tokio::test]
    async fn test_envelope_id_is_the_request_id() {
        let state = state_with_admin().await;
        let mut request = Request::new(Method::Get, "/photos").with_header("Geisa-Thome-Id", "hdr-1");
        request.id = Some("env-1".to_string());

        let response = dispatch(&state, request).await;

        assert_eq!(response.headers.unwrap().geisa_thome_id.as_deref(), Some("env-1"));
    }

    #[tokio::test]
    async fn test_token_signed_with_development_secret_is_rejected() {
        let config = Config::from_lookup(|key| {
            (key == "JWT_SECRET").then(|| "deployed-secret".to_string())
        })
        .unwrap();
        let state = AppState::in_memory(config);
        let forger = TokenService::new(&Config::default().jwt_secret, Duration::from_secs(3600));
        let intruder = User::new("intruder@example.com", "52998224725", "1", UserRole::Super);
        let token = forger.issue(&intruder).unwrap().token;

        let request = Request::new(Method::Post, "/dealers")
            .with_header("Authorization", format!("Bearer {token}"))
            .with_json_body(json!({
                "email": "maria@example.com", "cpf": "529.982.247-25", "rg": "1"
            }));

        let response = dispatch(&state, request).await;

        assert_eq!(response.status(), ResponseStatus::Unauthorized);
        assert!(state.users.get_user_by_username("maria@example.com").await.unwrap().is_none());
    }
}
