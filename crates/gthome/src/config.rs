use std::{env, time::Duration};

use anyhow::bail;
use gthome_core::http::CorsPolicy;

const DEV_JWT_SECRET: &str = "gthome-dev-secret";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// DynamoDB table holding every record (default: "gthome")
    pub table_name: String,
    /// HS256 signing secret for access tokens
    pub jwt_secret: String,
    /// Access token lifetime in seconds (default: 3600)
    pub token_ttl_seconds: u64,
    /// Value of `Access-Control-Allow-Origin` (default: "*")
    pub cors_allow_origin: String,
    /// Default page size for listings (default: 20)
    pub page_size: usize,
    /// Mailbox that receives dealer requests, if any
    pub staff_email: Option<String>,
    /// Lambda function that receives published events, if any
    pub events_function_name: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `TABLE_NAME` - DynamoDB table name (default: "gthome")
    /// - `JWT_SECRET` - token signing secret (required)
    /// - `TOKEN_TTL_SECONDS` - token lifetime (default: 3600)
    /// - `CORS_ALLOW_ORIGIN` - allowed origin (default: "*")
    /// - `PAGE_SIZE` - default listing page size (default: 20)
    /// - `STAFF_EMAIL` - dealer request mailbox (default: unset)
    /// - `EVENTS_FUNCTION_NAME` - events Lambda name or ARN (default: unset)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`Config::from_env`], but a missing `JWT_SECRET` falls back to
    /// the development secret. Only the local server uses this.
    pub fn for_development() -> Self {
        let lookup = |key: &str| env::var(key).ok();
        let secret = non_empty(&lookup, "JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET is not set, using the development secret");
            DEV_JWT_SECRET.to_string()
        });
        Self::build(&lookup, secret)
    }

    /// Build the configuration from any key lookup. `JWT_SECRET` is required.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let Some(secret) = non_empty(&lookup, "JWT_SECRET") else {
            bail!("JWT_SECRET must be set");
        };
        Ok(Self::build(&lookup, secret))
    }

    fn build(lookup: &impl Fn(&str) -> Option<String>, jwt_secret: String) -> Self {
        Self {
            table_name: non_empty(lookup, "TABLE_NAME").unwrap_or_else(|| "gthome".to_string()),
            jwt_secret,
            token_ttl_seconds: non_empty(lookup, "TOKEN_TTL_SECONDS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(3600),
            cors_allow_origin: non_empty(lookup, "CORS_ALLOW_ORIGIN")
                .unwrap_or_else(|| "*".to_string()),
            page_size: non_empty(lookup, "PAGE_SIZE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(20),
            staff_email: non_empty(lookup, "STAFF_EMAIL"),
            events_function_name: non_empty(lookup, "EVENTS_FUNCTION_NAME"),
        }
    }

    /// Get token lifetime as a Duration.
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_seconds)
    }

    pub fn cors_policy(&self) -> CorsPolicy {
        CorsPolicy::with_origin(self.cors_allow_origin.clone())
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|v| !v.trim().is_empty())
}

/// Development defaults, signed with the development secret.
impl Default for Config {
    fn default() -> Self {
        Self::build(&|_: &str| None, DEV_JWT_SECRET.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_values() {
        let config = Config::default();

        assert_eq!(config.table_name, "gthome");
        assert_eq!(config.jwt_secret, DEV_JWT_SECRET);
        assert_eq!(config.token_ttl_seconds, 3600);
        assert_eq!(config.cors_allow_origin, "*");
        assert_eq!(config.page_size, 20);
        assert_eq!(config.staff_email, None);
        assert_eq!(config.events_function_name, None);
    }

    #[test]
    fn test_missing_secret_is_rejected() {
        assert!(Config::from_lookup(|_| None).is_err());

        let blank: HashMap<&str, &str> = HashMap::from([("JWT_SECRET", "  ")]);
        let err = Config::from_lookup(|key| blank.get(key).map(|v| v.to_string())).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn test_values_from_lookup() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("JWT_SECRET", "prod-secret"),
            ("TABLE_NAME", "gthome-prod"),
            ("TOKEN_TTL_SECONDS", "600"),
            ("PAGE_SIZE", "not-a-number"),
            ("STAFF_EMAIL", "equipe@gthome.com.br"),
            ("EVENTS_FUNCTION_NAME", " "),
        ]);
        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(config.jwt_secret, "prod-secret");
        assert_eq!(config.table_name, "gthome-prod");
        assert_eq!(config.token_ttl(), Duration::from_secs(600));
        assert_eq!(config.page_size, 20);
        assert_eq!(config.staff_email.as_deref(), Some("equipe@gthome.com.br"));
        assert_eq!(config.events_function_name, None);
    }

    #[test]
    fn test_cors_policy_uses_origin() {
        let config = Config {
            cors_allow_origin: "https://gthome.com.br".to_string(),
            ..Config::default()
        };
        assert_eq!(config.cors_policy().allow_origin, "https://gthome.com.br");
    }
}
