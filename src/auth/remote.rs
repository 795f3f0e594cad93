use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use super::{Identity, IdentityError, IdentityProvider};

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

/// Token introspection against the hosted auth service (`GET /auth/v1/user`).
pub struct RemoteIdentityProvider {
    client: reqwest::Client,
    user_url: url::Url,
    api_key: String,
}

impl RemoteIdentityProvider {
    pub fn new(auth_url: &str, api_key: &str) -> Result<Self, IdentityError> {
        let base = url::Url::parse(auth_url).map_err(|_| IdentityError::Misconfigured("SUPABASE_URL"))?;
        let user_url = base
            .join("/auth/v1/user")
            .map_err(|_| IdentityError::Misconfigured("SUPABASE_URL"))?;
        if api_key.is_empty() {
            return Err(IdentityError::Misconfigured("SUPABASE_ANON_KEY"));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            user_url,
            api_key: api_key.to_string(),
        })
    }

    pub fn user_url(&self) -> &str {
        self.user_url.as_str()
    }
}

#[async_trait]
impl IdentityProvider for RemoteIdentityProvider {
    async fn user_from_token(&self, token: &str) -> Result<Option<Identity>, IdentityError> {
        let res = self
            .client
            .get(self.user_url.clone())
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await?;

        match res.status() {
            status if status.is_success() => {
                let user = res.json::<UserResponse>().await?;
                Ok(Some(Identity {
                    id: user.id,
                    email: user.email,
                }))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status => {
                let body = res.text().await.unwrap_or_default();
                Err(IdentityError::Provider(format!("{} {}", status, body.trim())))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_user_endpoint_from_project_url() {
        let provider = RemoteIdentityProvider::new("https://abc.supabase.co", "anon").unwrap();
        assert_eq!(provider.user_url(), "https://abc.supabase.co/auth/v1/user");
    }

    #[test]
    fn rejects_bad_settings() {
        assert!(RemoteIdentityProvider::new("not a url", "anon").is_err());
        assert!(RemoteIdentityProvider::new("https://abc.supabase.co", "").is_err());
    }
}
