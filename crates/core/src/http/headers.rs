use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::HttpError;

pub const GEISA_THOME_ID: &str = "Geisa-Thome-Id";
pub const ACCESS_CONTROL_ALLOW_ORIGIN: &str = "Access-Control-Allow-Origin";
pub const ACCESS_CONTROL_ALLOW_METHODS: &str = "Access-Control-Allow-Methods";
pub const ACCESS_CONTROL_ALLOW_HEADERS: &str = "Access-Control-Allow-Headers";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const WWW_AUTHENTICATE: &str = "WWW-Authenticate";
pub const LAST_EVALUATED: &str = "Last-Evaluated";
pub const CONTENT_LOCATION: &str = "Content-Location";
pub const X_REFRESH_TOKEN: &str = "X-Refresh-Token";
pub const AUTHORIZATION: &str = "Authorization";

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// A partial set of the response headers the gateway knows about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headers {
    #[serde(rename = "Geisa-Thome-Id", default, skip_serializing_if = "Option::is_none")]
    pub geisa_thome_id: Option<String>,
    #[serde(
        rename = "Access-Control-Allow-Origin",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub access_control_allow_origin: Option<String>,
    #[serde(
        rename = "Access-Control-Allow-Methods",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub access_control_allow_methods: Option<String>,
    #[serde(
        rename = "Access-Control-Allow-Headers",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub access_control_allow_headers: Option<String>,
    #[serde(rename = "Content-Type", default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(rename = "WWW-Authenticate", default, skip_serializing_if = "Option::is_none")]
    pub www_authenticate: Option<String>,
    #[serde(rename = "Last-Evaluated", default, skip_serializing_if = "Option::is_none")]
    pub last_evaluated: Option<String>,
    #[serde(rename = "Content-Location", default, skip_serializing_if = "Option::is_none")]
    pub content_location: Option<String>,
    #[serde(rename = "X-Refresh-Token", default, skip_serializing_if = "Option::is_none")]
    pub x_refresh_token: Option<String>,
}

impl Headers {
    fn slot(&mut self, name: &str) -> Option<&mut Option<String>> {
        let slot = match name.to_ascii_lowercase().as_str() {
            "geisa-thome-id" => &mut self.geisa_thome_id,
            "access-control-allow-origin" => &mut self.access_control_allow_origin,
            "access-control-allow-methods" => &mut self.access_control_allow_methods,
            "access-control-allow-headers" => &mut self.access_control_allow_headers,
            "content-type" => &mut self.content_type,
            "www-authenticate" => &mut self.www_authenticate,
            "last-evaluated" => &mut self.last_evaluated,
            "content-location" => &mut self.content_location,
            "x-refresh-token" => &mut self.x_refresh_token,
            _ => return None,
        };
        Some(slot)
    }

    /// Set a header by name, matched case-insensitively against the known set.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Result<(), HttpError> {
        let slot = self
            .slot(name)
            .ok_or_else(|| HttpError::UnknownHeader(name.to_string()))?;
        *slot = Some(value.into());
        Ok(())
    }

    /// Present headers as `(canonical name, value)` pairs.
    pub fn to_pairs(&self) -> Vec<(&'static str, &str)> {
        [
            (GEISA_THOME_ID, &self.geisa_thome_id),
            (ACCESS_CONTROL_ALLOW_ORIGIN, &self.access_control_allow_origin),
            (ACCESS_CONTROL_ALLOW_METHODS, &self.access_control_allow_methods),
            (ACCESS_CONTROL_ALLOW_HEADERS, &self.access_control_allow_headers),
            (CONTENT_TYPE, &self.content_type),
            (WWW_AUTHENTICATE, &self.www_authenticate),
            (LAST_EVALUATED, &self.last_evaluated),
            (CONTENT_LOCATION, &self.content_location),
            (X_REFRESH_TOKEN, &self.x_refresh_token),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|v| (name, v)))
        .collect()
    }

    /// Overlay every header present in `other` on top of `self`.
    pub fn merge(mut self, other: Headers) -> Self {
        for (name, value) in other.to_pairs() {
            if let Some(slot) = self.slot(name) {
                *slot = Some(value.to_string());
            }
        }
        self
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.to_pairs()
            .into_iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }
}

/// CORS headers attached to every gateway response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    pub allow_origin: String,
    pub allow_methods: String,
    pub allow_headers: String,
}

impl CorsPolicy {
    pub fn with_origin(origin: impl Into<String>) -> Self {
        Self {
            allow_origin: origin.into(),
            ..Self::default()
        }
    }

    pub fn headers(&self) -> Headers {
        Headers {
            access_control_allow_origin: Some(self.allow_origin.clone()),
            access_control_allow_methods: Some(self.allow_methods.clone()),
            access_control_allow_headers: Some(self.allow_headers.clone()),
            ..Headers::default()
        }
    }
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self {
            allow_origin: "*".to_string(),
            allow_methods: "GET,POST,PATCH,PUT,DELETE,OPTIONS".to_string(),
            allow_headers: [CONTENT_TYPE, AUTHORIZATION, GEISA_THOME_ID, X_REFRESH_TOKEN].join(","),
        }
    }
}
