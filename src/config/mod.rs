use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

use crate::database::identifier::is_valid_identifier;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub identity: IdentityConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    /// Schema whose tables are exposed through the admin table endpoints
    pub schema: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityMode {
    /// Ask the identity provider who owns the token (`/auth/v1/user`)
    Remote,
    /// Verify HS256 access tokens locally with the shared JWT secret
    Jwt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub mode: IdentityMode,
    pub auth_url: Option<String>,
    pub api_key: Option<String>,
    pub jwt_secret: Option<String>,
    pub jwt_audience: Option<String>,
    pub session_cookie: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Shared secret accepted in the `x-dev-bypass` header. Empty means disabled.
    pub dev_bypass_token: Option<String>,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid database schema name: {0}")]
    InvalidSchema(String),

    #[error("Missing configuration: {0}")]
    Missing(&'static str),
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(port) = env::var("PORTAL_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|v| v.parse().ok())
        {
            self.server.port = port;
        }
        if let Ok(v) = env::var("PORTAL_BIND_HOST") {
            self.server.bind_host = v;
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = non_empty(v);
        }
        if let Ok(v) = env::var("DATABASE_SCHEMA") {
            self.database.schema = v.trim().to_string();
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Identity overrides
        match env::var("IDENTITY_MODE").as_deref() {
            Ok("jwt") => self.identity.mode = IdentityMode::Jwt,
            Ok("remote") => self.identity.mode = IdentityMode::Remote,
            _ => {}
        }
        if let Ok(v) = env::var("SUPABASE_URL") {
            self.identity.auth_url = non_empty(v);
        }
        if let Ok(v) = env::var("SUPABASE_ANON_KEY") {
            self.identity.api_key = non_empty(v);
        }
        if let Ok(v) = env::var("SUPABASE_JWT_SECRET") {
            self.identity.jwt_secret = non_empty(v);
        }
        if let Ok(v) = env::var("SUPABASE_JWT_AUDIENCE") {
            self.identity.jwt_audience = non_empty(v);
        }
        if let Ok(v) = env::var("SESSION_COOKIE_NAME") {
            if !v.trim().is_empty() {
                self.identity.session_cookie = v.trim().to_string();
            }
        }

        // Security overrides
        if let Ok(v) = env::var("API_DEV_BYPASS_TOKEN") {
            self.security.dev_bypass_token = non_empty(v);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        self
    }

    /// Checks settings that would otherwise only fail on the first request.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_identifier(&self.database.schema) {
            return Err(ConfigError::InvalidSchema(self.database.schema.clone()));
        }
        match self.identity.mode {
            IdentityMode::Jwt if self.identity.jwt_secret.is_none() => {
                Err(ConfigError::Missing("SUPABASE_JWT_SECRET"))
            }
            IdentityMode::Remote if self.identity.auth_url.is_none() => {
                Err(ConfigError::Missing("SUPABASE_URL"))
            }
            IdentityMode::Remote if self.identity.api_key.is_none() => {
                Err(ConfigError::Missing("SUPABASE_ANON_KEY"))
            }
            _ => Ok(()),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.bind_host, self.server.port)
    }

    /// The bypass header is meant for local development only.
    pub fn bypass_is_risky(&self) -> bool {
        self.security.dev_bypass_token.is_some() && self.environment != Environment::Development
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                bind_host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: None,
                schema: "public".to_string(),
                max_connections: 5,
                connection_timeout: 30,
            },
            identity: IdentityConfig {
                mode: IdentityMode::Remote,
                auth_url: None,
                api_key: None,
                jwt_secret: None,
                jwt_audience: Some("authenticated".to_string()),
                session_cookie: "sb-access-token".to_string(),
            },
            security: SecurityConfig {
                dev_bypass_token: None,
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string()],
            },
        }
    }

    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.database.max_connections = 10;
        config.database.connection_timeout = 10;
        config.security.cors_origins = vec!["https://staging.geohistory.example".to_string()];
        config
    }

    fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.database.max_connections = 20;
        config.database.connection_timeout = 5;
        config.security.cors_origins = vec!["https://geohistory.example".to_string()];
        config
    }
}

fn non_empty(v: String) -> Option<String> {
    let v = v.trim();
    if v.is_empty() {
        None
    } else {
        Some(v.to_string())
    }
}
