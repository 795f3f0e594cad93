use std::sync::Arc;

use crate::auth::{IdentityError, IdentityProvider, JwtIdentityProvider, RemoteIdentityProvider};
use crate::config::{AppConfig, IdentityMode};
use crate::database::{PgStore, ProfileStore, TableStore};
use crate::services::{LandingResolver, ProfileService, TableService};

/// Everything a handler needs, cloned cheaply into each request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tables: Arc<dyn TableStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        tables: Arc<dyn TableStore>,
        profiles: Arc<dyn ProfileStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            tables,
            profiles,
            identity,
        }
    }

    /// Both store seams backed by the same Postgres store.
    pub fn with_postgres(config: AppConfig, store: PgStore) -> Result<Self, IdentityError> {
        let store = Arc::new(store);
        let identity = identity_provider(&config)?;
        Ok(Self::new(config, store.clone(), store, identity))
    }

    pub fn table_service(&self) -> TableService {
        TableService::new(self.tables.clone())
    }

    pub fn profile_service(&self) -> ProfileService {
        ProfileService::new(self.profiles.clone())
    }

    pub fn landing_resolver(&self) -> LandingResolver {
        LandingResolver::new(self.profiles.clone())
    }

    pub fn session_cookie(&self) -> &str {
        &self.config.identity.session_cookie
    }
}

/// Provider selected by `IDENTITY_MODE`.
pub fn identity_provider(config: &AppConfig) -> Result<Arc<dyn IdentityProvider>, IdentityError> {
    let identity = &config.identity;
    let provider: Arc<dyn IdentityProvider> = match identity.mode {
        IdentityMode::Jwt => Arc::new(JwtIdentityProvider::new(
            identity.jwt_secret.as_deref().unwrap_or_default(),
            identity.jwt_audience.as_deref(),
        )?),
        IdentityMode::Remote => Arc::new(RemoteIdentityProvider::new(
            identity.auth_url.as_deref().unwrap_or_default(),
            identity.api_key.as_deref().unwrap_or_default(),
        )?),
    };
    Ok(provider)
}
