use anyhow::Context;

use geohistory_portal::config::AppConfig;
use geohistory_portal::database::{DatabaseManager, PgStore};
use geohistory_portal::{app, init_tracing, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SUPABASE_URL, etc.
    let _ = dotenvy::dotenv();

    init_tracing();

    let config = AppConfig::from_env();
    config.validate().context("invalid configuration")?;
    tracing::info!("Starting GeoHistory portal in {:?} mode", config.environment);

    if config.bypass_is_risky() {
        tracing::warn!(
            "API_DEV_BYPASS_TOKEN is set in {:?}; anyone holding it has full table access",
            config.environment
        );
    }

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to the database")?;
    let store = PgStore::new(pool, config.database.schema.clone());

    let bind_addr = config.bind_addr();
    let state = AppState::with_postgres(config, store).context("failed to set up identity provider")?;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("GeoHistory portal listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await.context("server error")?;
    Ok(())
}
