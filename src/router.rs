use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{AppConfig, Environment};
use crate::handlers::{elevated, protected, public};
use crate::middleware::require_admin;
use crate::state::AppState;

/// The full HTTP surface. Tests serve this same router over in-memory stores.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    let router = Router::new()
        .merge(public_routes())
        .merge(protected_routes())
        .merge(elevated_routes(state.clone()))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    match cors {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(public::root_get))
        .route("/health", get(public::health_get))
        .route("/api/public/personas", get(public::personas_get))
}

fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/landing", get(protected::landing_redirect))
        .route("/post-auth", get(protected::landing_redirect))
        .route("/api/landing", get(protected::landing_api_get))
        .route("/api/profile/update", post(protected::profile_update))
}

fn elevated_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/tables", get(elevated::tables_list))
        .route("/admin/tables/:table/meta", get(elevated::table_meta))
        .route(
            "/admin/tables/:table",
            get(elevated::table_rows).post(elevated::table_insert),
        )
        .route(
            "/admin/tables/:table/rows/:id",
            put(elevated::table_update_row).delete(elevated::table_delete_row),
        )
        .route_layer(middleware::from_fn_with_state(state, require_admin))
}

/// Permissive in development; an explicit origin list elsewhere.
fn cors_layer(config: &AppConfig) -> Option<CorsLayer> {
    if !config.security.enable_cors {
        return None;
    }
    if config.environment == Environment::Development {
        return Some(CorsLayer::permissive());
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;

    use crate::testing::{MemoryStore, StaticIdentityProvider};

    fn router(config: AppConfig) -> Router {
        let store = Arc::new(MemoryStore::new());
        app(AppState::new(config, store.clone(), store, Arc::new(StaticIdentityProvider::new())))
    }

    #[tokio::test]
    async fn every_admin_route_is_guarded() {
        let requests = [
            ("GET", "/admin/tables"),
            ("GET", "/admin/tables/widgets/meta"),
            ("GET", "/admin/tables/widgets"),
            ("POST", "/admin/tables/widgets"),
            ("PUT", "/admin/tables/widgets/rows/1"),
            ("DELETE", "/admin/tables/widgets/rows/1"),
        ];
        for (method, uri) in requests {
            let request = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
            let response = router(AppConfig::development()).oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        }
    }

    #[tokio::test]
    async fn cors_follows_environment() {
        let preflight = || {
            Request::builder()
                .method("OPTIONS")
                .uri("/health")
                .header(header::ORIGIN, "https://elsewhere.example")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .body(Body::empty())
                .unwrap()
        };

        let response = router(AppConfig::development()).oneshot(preflight()).await.unwrap();
        assert!(response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));

        let mut config = AppConfig::development();
        config.environment = Environment::Production;
        config.security.cors_origins = vec!["https://geohistory.example".to_string()];
        let response = router(config).oneshot(preflight()).await.unwrap();
        assert!(!response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }
}
