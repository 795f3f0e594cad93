// handlers/public/root.rs - GET / service banner

use axum::response::Json;
use serde_json::{json, Value};

pub async fn get() -> Json<Value> {
    Json(json!({
        "ok": true,
        "name": "GeoHistory Journey Portal",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/health (public)",
            "personas": "/api/public/personas (public)",
            "landing": "/landing, /post-auth, /api/landing (session)",
            "profile": "/api/profile/update (session)",
            "admin": "/admin/tables[/:table[/meta | /rows/:id]] (administrators)",
        }
    }))
}
