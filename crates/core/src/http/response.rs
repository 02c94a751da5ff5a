use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::headers::{CorsPolicy, Headers, JSON_CONTENT_TYPE, TEXT_CONTENT_TYPE};
use super::{HttpError, ResponseStatus};

/// A response body: either a raw string or a JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Text(String),
    Json(Value),
}

/// What a route handler returns. Every field is optional; the gateway
/// conversion fills in the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ResponseStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<ResponseBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Headers>,
}

impl Response {
    pub fn new(status: ResponseStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(ResponseStatus::Ok).with_body(ResponseBody::Json(body))
    }

    pub fn created(body: Value, location: impl Into<String>) -> Self {
        let mut response = Self::new(ResponseStatus::Created).with_body(ResponseBody::Json(body));
        response.headers_mut().content_location = Some(location.into());
        response
    }

    pub fn no_content() -> Self {
        Self::new(ResponseStatus::NoContent)
    }

    /// An error response whose body is `{ "message": ... }`.
    pub fn error(status: ResponseStatus, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            body: Some(ResponseBody::Json(json!({ "message": message.into() }))),
            error: Some(true),
            headers: None,
        }
    }

    /// Serialize any value as the JSON body.
    pub fn json<T: Serialize>(status: ResponseStatus, value: &T) -> Result<Self, HttpError> {
        let body = serde_json::to_value(value).map_err(|e| HttpError::Encode(e.to_string()))?;
        Ok(Self::new(status).with_body(ResponseBody::Json(body)))
    }

    pub fn with_body(mut self, body: ResponseBody) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Result<Self, HttpError> {
        self.headers_mut().set(name, value)?;
        Ok(self)
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        self.headers.get_or_insert_with(Headers::default)
    }

    pub fn status(&self) -> ResponseStatus {
        self.status.unwrap_or(ResponseStatus::Ok)
    }

    pub fn is_error(&self) -> bool {
        self.error.unwrap_or(false) || self.status().is_error()
    }

    /// Convert into the shape API Gateway expects from a proxy integration.
    pub fn into_gateway(self, cors: &CorsPolicy) -> Result<GatewayResponse, HttpError> {
        let status = self.status();
        let mut headers = cors.headers().merge(self.headers.unwrap_or_default());

        let body = match (status, self.body) {
            (ResponseStatus::NoContent, _) | (_, None) => String::new(),
            (_, Some(ResponseBody::Text(text))) => {
                headers
                    .content_type
                    .get_or_insert_with(|| TEXT_CONTENT_TYPE.to_string());
                text
            }
            (_, Some(ResponseBody::Json(value))) => {
                headers
                    .content_type
                    .get_or_insert_with(|| JSON_CONTENT_TYPE.to_string());
                serde_json::to_string(&value).map_err(|e| HttpError::Encode(e.to_string()))?
            }
        };

        Ok(GatewayResponse {
            status_code: status.as_u16(),
            headers: headers.into_map(),
            body,
            is_base64_encoded: false,
        })
    }
}

/// API Gateway proxy integration response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::headers::{
        ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_LOCATION, CONTENT_TYPE, LAST_EVALUATED,
    };

    #[test]
    fn empty_response_defaults_to_ok() {
        let gateway = Response::default()
            .into_gateway(&CorsPolicy::default())
            .unwrap();

        assert_eq!(gateway.status_code, 200);
        assert_eq!(gateway.body, "");
        assert_eq!(gateway.headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert!(!gateway.headers.contains_key(CONTENT_TYPE));
    }

    #[test]
    fn json_body_is_encoded() {
        let gateway = Response::ok(json!({"items": []}))
            .into_gateway(&CorsPolicy::default())
            .unwrap();

        assert_eq!(gateway.body, r#"{"items":[]}"#);
        assert_eq!(gateway.headers[CONTENT_TYPE], JSON_CONTENT_TYPE);
    }

    #[test]
    fn text_body_keeps_explicit_content_type() {
        let gateway = Response::new(ResponseStatus::Ok)
            .with_body(ResponseBody::Text("<p>ok</p>".to_string()))
            .with_header("Content-Type", "text/html")
            .unwrap()
            .into_gateway(&CorsPolicy::default())
            .unwrap();

        assert_eq!(gateway.body, "<p>ok</p>");
        assert_eq!(gateway.headers[CONTENT_TYPE], "text/html");
    }

    #[test]
    fn text_body_defaults_to_plain() {
        let gateway = Response::new(ResponseStatus::Accepted)
            .with_body(ResponseBody::Text("queued".to_string()))
            .into_gateway(&CorsPolicy::default())
            .unwrap();

        assert_eq!(gateway.status_code, 202);
        assert_eq!(gateway.headers[CONTENT_TYPE], TEXT_CONTENT_TYPE);
    }

    #[test]
    fn no_content_drops_body() {
        let gateway = Response::no_content()
            .with_body(ResponseBody::Json(json!({"ignored": true})))
            .into_gateway(&CorsPolicy::default())
            .unwrap();

        assert_eq!(gateway.status_code, 204);
        assert_eq!(gateway.body, "");
    }

    #[test]
    fn created_sets_location() {
        let gateway = Response::created(json!({"id": "1"}), "/photos/1")
            .with_header(LAST_EVALUATED, "abc")
            .unwrap()
            .into_gateway(&CorsPolicy::with_origin("https://gthome.com.br"))
            .unwrap();

        assert_eq!(gateway.status_code, 201);
        assert_eq!(gateway.headers[CONTENT_LOCATION], "/photos/1");
        assert_eq!(gateway.headers[LAST_EVALUATED], "abc");
        assert_eq!(
            gateway.headers[ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://gthome.com.br"
        );
    }

    #[test]
    fn error_response_shape() {
        let response = Response::error(ResponseStatus::Conflict, "user exists");
        assert!(response.is_error());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            json!({"status": 409, "body": {"message": "user exists"}, "error": true})
        );
    }

    #[test]
    fn body_deserializes_string_or_object() {
        let text: Response = serde_json::from_value(json!({"body": "hi"})).unwrap();
        let object: Response = serde_json::from_value(json!({"body": {"a": 1}})).unwrap();

        assert_eq!(text.body, Some(ResponseBody::Text("hi".to_string())));
        assert_eq!(object.body, Some(ResponseBody::Json(json!({"a": 1}))));
    }

    #[test]
    fn gateway_uses_camel_case() {
        let gateway = Response::no_content()
            .into_gateway(&CorsPolicy::default())
            .unwrap();
        let json = serde_json::to_value(&gateway).unwrap();
        assert_eq!(json["statusCode"], 204);
        assert_eq!(json["isBase64Encoded"], false);
    }
}
