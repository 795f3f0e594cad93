// handlers/protected/landing.rs - landing redirect and its JSON form

use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;

use super::current_caller;
use crate::auth::Identity;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::landing::LOGIN_PATH;
use crate::state::AppState;

/// A broken session is treated like no session: the visitor is sent to
/// sign in again instead of seeing an error page.
async fn caller_or_anonymous(state: &AppState, headers: &HeaderMap) -> Option<Identity> {
    match current_caller(state, headers).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!("Treating caller as anonymous: {}", e);
            None
        }
    }
}

/// GET /landing, /post-auth - 307 to the caller's landing target
pub async fn redirect(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(identity) = caller_or_anonymous(&state, &headers).await else {
        return Redirect::temporary(LOGIN_PATH).into_response();
    };

    let path = state.landing_resolver().resolve(Some(&identity)).await;
    Redirect::temporary(&path).into_response()
}

#[derive(Serialize)]
pub struct LandingTarget {
    pub path: String,
    pub authenticated: bool,
}

/// GET /api/landing - the same resolution as JSON; anonymous gets the public entry
pub async fn api_get(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<LandingTarget> {
    let identity = caller_or_anonymous(&state, &headers).await;
    let path = state.landing_resolver().resolve(identity.as_ref()).await;

    Ok(ApiResponse::success(LandingTarget {
        path,
        authenticated: identity.is_some(),
    }))
}
