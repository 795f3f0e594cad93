// handlers/public/health.rs - GET /health

use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// Reports whether the backing store answers. Never requires auth.
pub async fn get(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let now = chrono::Utc::now();

    match state.tables.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "ok": true,
                "status": "ok",
                "database": "ok",
                "timestamp": now,
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": "database unavailable",
                    "status": "degraded",
                    "database_error": e.to_string(),
                    "timestamp": now,
                })),
            )
        }
    }
}
