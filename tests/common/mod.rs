#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::json;

use geohistory_portal::config::AppConfig;
use geohistory_portal::testing::{MemoryStore, StaticIdentityProvider};
use geohistory_portal::{app, AppState};

pub const ADMIN_TOKEN: &str = "admin-token";
pub const STUDENT_TOKEN: &str = "student-token";
pub const READER_TOKEN: &str = "reader-token";
/// Resolves to a user without a profile row.
pub const GHOST_TOKEN: &str = "ghost-token";
pub const BROKEN_TOKEN: &str = "broken-token";
pub const BYPASS_TOKEN: &str = "dev-secret";

/// The real router over in-memory stores, served on a free local port.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub store: Arc<MemoryStore>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if let Ok(resp) = client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK || resp.status() == StatusCode::SERVICE_UNAVAILABLE {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

/// Personas, profiles and a `widgets` table shared by the HTTP tests.
pub fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new().with_table("widgets", &["id", "title"]));
    store.seed("widgets", json!({"id": 2, "title": "Astrolabe"}));
    store.seed("widgets", json!({"id": 1, "title": "Sextant"}));

    store.add_persona("p-admin", "ADMIN", None);
    store.add_persona("p-mod", "MODERATOR", None);
    store.add_persona("p-stud", "STUDENT", Some("/student/primary"));
    store.add_persona("p-res", "RESEARCHER", None);
    store.add_persona("p-fan", "ENTHUSIAST", Some("enthusiast/home"));

    store.add_profile("admin", Some("p-admin"), true);
    store.add_profile("student", Some("p-stud"), false);
    store.add_profile("reader", None, false);
    store
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.security.dev_bypass_token = Some(BYPASS_TOKEN.to_string());
    config
}

pub async fn spawn() -> Result<TestServer> {
    spawn_with(seeded_store(), test_config()).await
}

pub async fn spawn_with(store: Arc<MemoryStore>, config: AppConfig) -> Result<TestServer> {
    let identity = StaticIdentityProvider::new()
        .with_user(ADMIN_TOKEN, "admin")
        .with_user(STUDENT_TOKEN, "student")
        .with_user(READER_TOKEN, "reader")
        .with_user(GHOST_TOKEN, "ghost")
        .with_failure(BROKEN_TOKEN);
    let state = AppState::new(config, store.clone(), store.clone(), Arc::new(identity));

    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app(state)).await;
    });

    let server = TestServer {
        port,
        base_url: format!("http://127.0.0.1:{}", port),
        store,
    };
    server.wait_ready(Duration::from_secs(5)).await?;
    Ok(server)
}

/// Client that leaves redirects for the test to inspect.
pub fn client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()?)
}
