use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use super::{Identity, IdentityError, IdentityProvider};

/// Access token claims issued by the hosted auth service.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub aud: Option<String>,
}

/// Verifies HS256 access tokens with the project's shared JWT secret.
pub struct JwtIdentityProvider {
    key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityProvider {
    pub fn new(secret: &str, audience: Option<&str>) -> Result<Self, IdentityError> {
        if secret.is_empty() {
            return Err(IdentityError::Misconfigured("SUPABASE_JWT_SECRET"));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        match audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }

        Ok(Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn user_from_token(&self, token: &str) -> Result<Option<Identity>, IdentityError> {
        match decode::<Claims>(token, &self.key, &self.validation) {
            Ok(data) if !data.claims.sub.is_empty() => Ok(Some(Identity {
                id: data.claims.sub,
                email: data.claims.email,
            })),
            Ok(_) => Ok(None),
            Err(e) => {
                tracing::debug!("Rejected access token: {}", e);
                Ok(None)
            }
        }
    }
}
