use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::headers::{AUTHORIZATION, GEISA_THOME_ID};
use super::HttpError;
use crate::serde::null_as_default;
use crate::tables::UserRole;

/// HTTP methods routed by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Patch,
    Put,
    Delete,
}

impl Method {
    pub const ALL: [Method; 5] = [
        Method::Get,
        Method::Post,
        Method::Patch,
        Method::Put,
        Method::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = HttpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| HttpError::UnknownMethod(s.to_string()))
    }
}

/// Route handlers the gateway can dispatch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceAction {
    AuthenticateUser,
    CreateDealer,
    CreatePhotoAttachment,
    ListPhotoAttachments,
}

impl ResourceAction {
    pub const ALL: [ResourceAction; 4] = [
        ResourceAction::AuthenticateUser,
        ResourceAction::CreateDealer,
        ResourceAction::CreatePhotoAttachment,
        ResourceAction::ListPhotoAttachments,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceAction::AuthenticateUser => "authenticate_user",
            ResourceAction::CreateDealer => "create_dealer",
            ResourceAction::CreatePhotoAttachment => "create_photo_attachment",
            ResourceAction::ListPhotoAttachments => "list_photo_attachments",
        }
    }
}

impl fmt::Display for ResourceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceAction {
    type Err = HttpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| HttpError::UnknownAction(s.to_string()))
    }
}

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtPayload {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub iat: i64,
    #[serde(default)]
    pub exp: i64,
}

/// An API Gateway proxy request, plus the identity fields the authorizer
/// attaches after validating the caller's token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub http_method: Method,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<Method>,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub resource: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub path_parameters: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub query_string_parameters: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
    #[serde(default)]
    pub body: Value,
    #[serde(rename = "Id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "Role", default, skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(rename = "Email", default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "Subject", default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_key: Option<String>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            http_method: method,
            method: None,
            resource: path.clone(),
            path,
            path_parameters: BTreeMap::new(),
            query_string_parameters: BTreeMap::new(),
            headers: BTreeMap::new(),
            is_base64_encoded: false,
            body: Value::Null,
            id: None,
            role: None,
            email: None,
            subject: None,
            route_key: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_string_parameters.insert(name.into(), value.into());
        self
    }

    pub fn with_json_body(mut self, body: Value) -> Self {
        self.body = body;
        self.is_base64_encoded = false;
        self
    }

    pub fn with_raw_body(mut self, body: impl Into<String>, is_base64_encoded: bool) -> Self {
        self.body = Value::String(body.into());
        self.is_base64_encoded = is_base64_encoded;
        self
    }

    /// The method override wins over the gateway's `httpMethod`.
    pub fn effective_method(&self) -> Method {
        self.method.unwrap_or(self.http_method)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn bearer_token(&self) -> Option<&str> {
        let value = self.header(AUTHORIZATION)?.trim();
        let (scheme, token) = value.split_once(' ')?;
        let token = token.trim();
        (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
    }

    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_parameters.get(name).map(String::as_str)
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_string_parameters
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// The caller-supplied request id, if any.
    pub fn request_id(&self) -> Option<&str> {
        self.id
            .as_deref()
            .or_else(|| self.header(GEISA_THOME_ID))
            .filter(|id| !id.is_empty())
    }

    /// Decode the body as JSON. String bodies are parsed, base64-decoding
    /// first when flagged; object bodies are used as they are.
    pub fn json_body<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        match &self.body {
            Value::Null => Err(HttpError::EmptyBody),
            Value::String(raw) if raw.trim().is_empty() => Err(HttpError::EmptyBody),
            Value::String(raw) if self.is_base64_encoded => {
                let bytes = STANDARD
                    .decode(raw.trim())
                    .map_err(|e| HttpError::InvalidBody(e.to_string()))?;
                serde_json::from_slice(&bytes).map_err(|e| HttpError::InvalidBody(e.to_string()))
            }
            Value::String(raw) => {
                serde_json::from_str(raw).map_err(|e| HttpError::InvalidBody(e.to_string()))
            }
            other => serde_json::from_value(other.clone())
                .map_err(|e| HttpError::InvalidBody(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Credentials {
        email: String,
        password: String,
    }

    #[test]
    fn decodes_gateway_event_with_null_maps() {
        let request: Request = serde_json::from_value(json!({
            "httpMethod": "GET",
            "path": "/photos",
            "resource": "/photos",
            "pathParameters": null,
            "queryStringParameters": null,
            "headers": {"Geisa-Thome-Id": "req-1"},
            "isBase64Encoded": false,
            "body": null
        }))
        .unwrap();

        assert_eq!(request.effective_method(), Method::Get);
        assert!(request.query_string_parameters.is_empty());
        assert_eq!(request.request_id(), Some("req-1"));
    }

    #[test]
    fn rejects_unknown_method() {
        let result = serde_json::from_value::<Request>(json!({"httpMethod": "TRACE"}));
        assert!(result.is_err());
        assert_eq!(
            "trace".parse::<Method>(),
            Err(HttpError::UnknownMethod("trace".to_string()))
        );
    }

    #[test]
    fn method_override_wins() {
        let mut request = Request::new(Method::Post, "/photos");
        request.method = Some(Method::Put);
        assert_eq!(request.effective_method(), Method::Put);
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let request = Request::new(Method::Get, "/").with_header("authorization", "Bearer abc.def");
        assert_eq!(request.header("Authorization"), Some("Bearer abc.def"));
        assert_eq!(request.bearer_token(), Some("abc.def"));
    }

    #[test]
    fn bearer_token_requires_scheme() {
        let basic = Request::new(Method::Get, "/").with_header("Authorization", "Basic abc");
        let empty = Request::new(Method::Get, "/").with_header("Authorization", "Bearer ");
        assert_eq!(basic.bearer_token(), None);
        assert_eq!(empty.bearer_token(), None);
    }

    #[test]
    fn json_body_from_string() {
        let request = Request::new(Method::Post, "/auth")
            .with_raw_body(r#"{"email":"a@b.com","password":"x"}"#, false);
        let credentials: Credentials = request.json_body().unwrap();
        assert_eq!(credentials.email, "a@b.com");
    }

    #[test]
    fn json_body_from_base64() {
        let encoded = STANDARD.encode(r#"{"email":"a@b.com","password":"x"}"#);
        let request = Request::new(Method::Post, "/auth").with_raw_body(encoded, true);
        let credentials: Credentials = request.json_body().unwrap();
        assert_eq!(credentials.password, "x");
    }

    #[test]
    fn json_body_from_object() {
        let request = Request::new(Method::Post, "/auth")
            .with_json_body(json!({"email": "a@b.com", "password": "x"}));
        let credentials: Credentials = request.json_body().unwrap();
        assert_eq!(
            credentials,
            Credentials {
                email: "a@b.com".to_string(),
                password: "x".to_string()
            }
        );
    }

    #[test]
    fn json_body_errors() {
        let empty = Request::new(Method::Post, "/auth");
        assert_eq!(empty.json_body::<Credentials>(), Err(HttpError::EmptyBody));

        let broken = Request::new(Method::Post, "/auth").with_raw_body("{not json", false);
        assert!(matches!(
            broken.json_body::<Credentials>(),
            Err(HttpError::InvalidBody(_))
        ));
    }

    #[test]
    fn identity_fields_use_pascal_case() {
        let mut request = Request::new(Method::Get, "/photos");
        request.email = Some("a@b.com".to_string());
        request.role = Some(UserRole::Admin);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["Email"], "a@b.com");
        assert_eq!(json["Role"], "Admin");
        assert_eq!(json["httpMethod"], "GET");
    }

    #[test]
    fn resource_actions_round_trip() {
        for action in ResourceAction::ALL {
            assert_eq!(action.as_str().parse::<ResourceAction>(), Ok(action));
            assert_eq!(
                serde_json::to_value(action).unwrap(),
                Value::String(action.as_str().to_string())
            );
        }
        assert!("delete_photo".parse::<ResourceAction>().is_err());
    }
}
