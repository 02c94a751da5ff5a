//! Access tokens signed with HS256.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;

use gthome_core::auth::{calculate_expiry, AuthError};
use gthome_core::http::JwtPayload;
use gthome_core::tables::User;

use crate::config::Config;

/// A freshly issued token and its lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: u64,
    #[serde(skip)]
    pub claims: JwtPayload,
}

#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.jwt_secret, config.token_ttl())
    }

    pub fn issue(&self, user: &User) -> Result<IssuedToken, AuthError> {
        self.issue_at(user, Utc::now())
    }

    pub fn issue_at(&self, user: &User, now: DateTime<Utc>) -> Result<IssuedToken, AuthError> {
        let ttl = chrono::Duration::from_std(self.ttl).map_err(|e| AuthError::Issue(e.to_string()))?;
        let claims = JwtPayload {
            email: user.username.clone(),
            sub: Some(user.id().to_string()),
            role: Some(user.role),
            iat: now.timestamp(),
            exp: calculate_expiry(now, ttl).timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Issue(e.to_string()))?;

        Ok(IssuedToken {
            token,
            expires_in: self.ttl.as_secs(),
            claims,
        })
    }

    pub fn verify(&self, token: &str) -> Result<JwtPayload, AuthError> {
        decode::<JwtPayload>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            })
    }
}
