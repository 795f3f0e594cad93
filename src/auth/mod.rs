//! Caller identity: who sent this request, according to the identity provider.
//!
//! Two transports carry an access token: an `Authorization: Bearer` header
//! and the session cookie set by the hosted auth client. Both end up at an
//! `IdentityProvider`, which turns a token into an `Identity` or rejects it.

pub mod jwt;
pub mod remote;

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use jwt::JwtIdentityProvider;
pub use remote::RemoteIdentityProvider;

/// An authenticated subject as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Identity provider not configured: {0}")]
    Misconfigured(&'static str),

    #[error("Identity provider error: {0}")]
    Provider(String),

    #[error("Identity provider request failed: {0}")]
    Request(#[from] reqwest::Error),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `Ok(None)` means the token was looked at and not accepted.
    async fn user_from_token(&self, token: &str) -> Result<Option<Identity>, IdentityError>;
}

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Extract the access token stored in the session cookie `cookie_name`.
///
/// The auth client has stored the session as a bare token, as a JSON object
/// with `access_token`, and as a JSON array whose first item is the token.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let raw = cookie_value(headers, cookie_name)?;
    let decoded = percent_decode(&raw);

    let token = match serde_json::from_str::<Value>(&decoded) {
        Ok(Value::Object(map)) => map.get("access_token")?.as_str()?.to_string(),
        Ok(Value::Array(items)) => items.first()?.as_str()?.to_string(),
        Ok(Value::String(s)) => s,
        _ => decoded,
    };

    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
}

/// Cookie values written by browsers are URL-encoded JSON.
fn percent_decode(raw: &str) -> String {
    url::form_urlencoded::parse(format!("v={}", raw.replace('+', "%2B")).as_bytes())
        .next()
        .map(|(_, v)| v.into_owned())
        .unwrap_or_else(|| raw.to_string())
}

/// Resolve the caller from a bearer token, then from the session cookie.
///
/// A bearer token the provider does not accept falls through to the
/// session. Only a failure while checking the session is an error.
pub async fn resolve_caller(
    provider: &dyn IdentityProvider,
    headers: &HeaderMap,
    cookie_name: &str,
) -> Result<Option<Identity>, IdentityError> {
    if let Some(token) = bearer_token(headers) {
        match provider.user_from_token(token).await {
            Ok(Some(identity)) => return Ok(Some(identity)),
            Ok(None) => tracing::debug!("Bearer token not accepted, trying session cookie"),
            Err(e) => tracing::warn!("Bearer token resolution failed: {}", e),
        }
    }

    match session_token(headers, cookie_name) {
        Some(token) => provider.user_from_token(&token).await,
        None => Ok(None),
    }
}
