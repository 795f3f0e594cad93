use std::time::Duration;

use anyhow::{anyhow, Context};
use reqwest::{Method, RequestBuilder};
use serde_json::Value;

use crate::middleware::BYPASS_HEADER;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    None,
    Bearer(String),
    Bypass(String),
}

/// Thin HTTP client for the portal's JSON endpoints.
pub struct PortalClient {
    http: reqwest::Client,
    base: url::Url,
    credentials: Credentials,
}

impl PortalClient {
    pub fn new(base_url: &str, credentials: Credentials) -> anyhow::Result<Self> {
        let base = url::Url::parse(base_url).with_context(|| format!("invalid portal URL '{}'", base_url))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { http, base, credentials })
    }

    pub fn endpoint(&self, path: &str) -> anyhow::Result<url::Url> {
        self.base
            .join(path)
            .with_context(|| format!("invalid endpoint path '{}'", path))
    }

    fn request(&self, method: Method, url: url::Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.credentials {
            Credentials::None => builder,
            Credentials::Bearer(token) => builder.bearer_auth(token),
            Credentials::Bypass(token) => builder.header(BYPASS_HEADER, token),
        }
    }

    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> anyhow::Result<Value> {
        let url = self.endpoint(path)?;
        self.send(self.request(Method::GET, url).query(query)).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> anyhow::Result<Value> {
        let url = self.endpoint(path)?;
        self.send(self.request(Method::POST, url).json(body)).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> anyhow::Result<Value> {
        let url = self.endpoint(path)?;
        self.send(self.request(Method::PUT, url).json(body)).await
    }

    pub async fn delete(&self, path: &str) -> anyhow::Result<Value> {
        let url = self.endpoint(path)?;
        self.send(self.request(Method::DELETE, url)).await
    }

    /// Error bodies are `{ "error": message }`; the message becomes the error.
    async fn send(&self, request: RequestBuilder) -> anyhow::Result<Value> {
        let response = request.send().await.context("request to portal failed")?;
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if status.is_success() {
            return Ok(body);
        }
        let message = body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("request failed");
        Err(anyhow!("{} ({})", message, status))
    }
}

/// Path segment escaping for table names and ids.
pub fn segment(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '_' | '.' | '~' => c.to_string(),
            other => {
                let mut buf = [0u8; 4];
                other
                    .encode_utf8(&mut buf)
                    .bytes()
                    .map(|b| format!("%{:02X}", b))
                    .collect()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_join_onto_base() {
        let client = PortalClient::new("http://localhost:3000", Credentials::None).unwrap();
        assert_eq!(
            client.endpoint("/admin/tables").unwrap().as_str(),
            "http://localhost:3000/admin/tables"
        );
    }

    #[test]
    fn segments_are_escaped() {
        assert_eq!(segment("widgets"), "widgets");
        assert_eq!(segment("a b/c"), "a%20b%2Fc");
    }

    #[test]
    fn bad_base_url_is_rejected() {
        assert!(PortalClient::new("not a url", Credentials::None).is_err());
    }
}
