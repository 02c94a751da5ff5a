//! Development HTTP server.
//!
//! Every request is converted into the same envelope API Gateway delivers
//! to the HTTP Lambda and run through the shared router, so the local server
//! answers exactly like the deployed one, CORS headers included.

use std::{collections::BTreeMap, future::Future, time::Duration};

use axum::{
    body::{Body, Bytes},
    extract::{Query, State},
    http::{HeaderMap, Method as HttpMethod, StatusCode, Uri},
    response::{IntoResponse, Response as AxumResponse},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use gthome_core::http::{
    headers::GEISA_THOME_ID, GatewayResponse, Method, Request, Response, ResponseStatus,
};

use crate::router::{dispatch, preflight, to_gateway, unsupported_method};
use crate::state::AppState;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Create the application router with the gateway adapter and middleware.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .fallback(gateway)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn gateway(
    State(state): State<AppState>,
    method: HttpMethod,
    uri: Uri,
    Query(query): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> AxumResponse {
    let path = uri.path().to_string();
    let request_id = request_id(&headers);

    let response = if method == HttpMethod::OPTIONS {
        with_request_id(preflight(&path), request_id)
    } else {
        match method.as_str().parse::<Method>() {
            Ok(method) => {
                let mut request = envelope(method, path, query, &headers, body);
                request.id = Some(request_id.clone());
                within_deadline(REQUEST_TIMEOUT, request_id, dispatch(&state, request)).await
            }
            Err(_) => with_request_id(unsupported_method(&path), request_id),
        }
    };

    into_axum(to_gateway(&state, response))
}

/// Run `work`, answering 500 if it outlives `deadline`. The timeout answer
/// still goes through the gateway conversion, so it keeps the CORS headers
/// and the request id.
async fn within_deadline(
    deadline: Duration,
    request_id: String,
    work: impl Future<Output = Response>,
) -> Response {
    match tokio::time::timeout(deadline, work).await {
        Ok(response) => response,
        Err(_) => {
            tracing::error!(request_id = %request_id, timeout = ?deadline, "request timed out");
            let response =
                Response::error(ResponseStatus::InternalServerError, "Request timed out");
            with_request_id(response, request_id)
        }
    }
}

/// Build the gateway envelope for an incoming request. Bodies that are not
/// UTF-8 travel base64-encoded, as API Gateway sends binary payloads.
fn envelope(
    method: Method,
    path: String,
    query: BTreeMap<String, String>,
    headers: &HeaderMap,
    body: Bytes,
) -> Request {
    let mut request = Request::new(method, path);
    request.query_string_parameters = query;
    request.headers = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();

    if !body.is_empty() {
        request = match std::str::from_utf8(&body) {
            Ok(text) => request.with_raw_body(text, false),
            Err(_) => request.with_raw_body(STANDARD.encode(&body), true),
        };
    }
    request
}

fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(GEISA_THOME_ID)
        .and_then(|value| value.to_str().ok())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn with_request_id(mut response: Response, id: String) -> Response {
    response.headers_mut().geisa_thome_id = Some(id);
    response
}

fn into_axum(gateway: GatewayResponse) -> AxumResponse {
    let status = StatusCode::from_u16(gateway.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut builder = axum::http::Response::builder().status(status);
    for (name, value) in &gateway.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    builder.body(Body::from(gateway.body)).unwrap_or_else(|err| {
        tracing::error!(error = %err, "invalid gateway response");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request as HttpRequest;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use gthome_core::auth::hash_password;
    use gthome_core::tables::{Photo, User, UserRole};

    use crate::config::Config;

    async fn test_state() -> AppState {
        let state = AppState::in_memory(Config::default());
        let admin = User::new("admin@gthome.com.br", "52998224725", "1", UserRole::Admin)
            .with_password(hash_password("s3cret"));
        state.users.create_user(&admin).await.unwrap();
        state
    }

    fn bearer(state: &AppState, role: UserRole) -> String {
        let user = User::new("someone@gthome.com.br", "52998224725", "1", role);
        format!("Bearer {}", state.tokens.issue(&user).unwrap().token)
    }

    async fn json_body(response: AxumResponse) -> Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let app = create_app(test_state().await);

        let response = app
            .oneshot(HttpRequest::builder().uri("/articles").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert!(response.headers().contains_key("geisa-thome-id"));
    }

    #[tokio::test]
    async fn test_wrong_method_is_not_allowed() {
        let app = create_app(test_state().await);

        for method in ["DELETE", "HEAD"] {
            let response = app
                .clone()
                .oneshot(
                    HttpRequest::builder()
                        .method(method)
                        .uri("/auth")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{method}");
        }
    }

    #[tokio::test]
    async fn test_preflight() {
        let app = create_app(test_state().await);

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .method("OPTIONS")
                    .uri("/photos/")
                    .header("Geisa-Thome-Id", "pre-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers()["geisa-thome-id"], "pre-1");
        assert!(response.headers().contains_key("access-control-allow-methods"));
    }

    #[tokio::test]
    async fn test_login_then_create_photo() {
        let app = create_app(test_state().await);

        let response = app
            .clone()
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/auth")
                    .header("Content-Type", "application/json")
                    .body(Body::from(
                        json!({"email": "admin@gthome.com.br", "password": "s3cret"}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-refresh-token"));
        let token = json_body(response).await["token"].as_str().unwrap().to_string();

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/photos")
                    .header("Authorization", format!("Bearer {token}"))
                    .body(Body::from(r#"{"uri":"https://cdn.example.com/sala.jpg"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let location = response.headers()["content-location"].to_str().unwrap().to_string();
        let body = json_body(response).await;
        assert_eq!(location, format!("/photos/{}", body["id"].as_str().unwrap()));
    }

    #[tokio::test]
    async fn test_auth_failures() {
        let state = test_state().await;
        let dealer = bearer(&state, UserRole::Dealer);
        let app = create_app(state);
        let body = r#"{"email":"maria@example.com","cpf":"529.982.247-25","rg":"1"}"#;

        let anonymous = app
            .clone()
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/dealers")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(anonymous.headers()["www-authenticate"], "Bearer");

        let forbidden = app
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/dealers")
                    .header("Authorization", dealer)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
        let error = json_body(forbidden).await;
        assert!(error["message"].as_str().unwrap().contains("create_dealer"));
    }

    #[tokio::test]
    async fn test_timed_out_request_keeps_gateway_headers() {
        let state = test_state().await;

        let response = within_deadline(
            Duration::from_millis(10),
            "slow-1".to_string(),
            std::future::pending::<Response>(),
        )
        .await;
        assert_eq!(response.status(), ResponseStatus::InternalServerError);

        let gateway = to_gateway(&state, response);
        assert_eq!(gateway.status_code, 500);
        assert_eq!(gateway.headers["Geisa-Thome-Id"], "slow-1");
        assert_eq!(gateway.headers["Access-Control-Allow-Origin"], "*");
    }

    #[tokio::test]
    async fn test_generated_request_id_is_echoed() {
        let app = create_app(test_state().await);

        let response = app
            .oneshot(HttpRequest::builder().uri("/photos").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let id = response.headers()["geisa-thome-id"].to_str().unwrap();
        assert!(Uuid::parse_str(id).is_ok());
    }

    #[tokio::test]
    async fn test_list_photos_sets_last_evaluated() {
        let state = test_state().await;
        for n in 0..3 {
            state
                .photos
                .create_photo(&Photo::new(format!("https://cdn.example.com/{n}.jpg")))
                .await
                .unwrap();
        }
        let app = create_app(state);

        let response = app
            .clone()
            .oneshot(
                HttpRequest::builder()
                    .uri("/photos?limit=2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cursor = response.headers()["last-evaluated"].to_str().unwrap().to_string();
        assert_eq!(json_body(response).await["items"].as_array().unwrap().len(), 2);

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri(format!("/photos?limit=2&cursor={cursor}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.headers().contains_key("last-evaluated"));
        assert_eq!(json_body(response).await["items"].as_array().unwrap().len(), 1);
    }
}
