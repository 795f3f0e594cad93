// handlers/protected/profile.rs - POST /api/profile/update

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use serde::Serialize;

use super::current_caller;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::profile_service::{ProfileUpdateRequest, UpdateOutcome};
use crate::state::AppState;

#[derive(Serialize)]
pub struct UpdateMessage {
    pub message: &'static str,
}

/// Update the caller's own language and persona.
pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ProfileUpdateRequest>, JsonRejection>,
) -> ApiResult<UpdateMessage> {
    let identity = current_caller(&state, &headers)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;
    let Json(request) = payload?;

    let message = match state.profile_service().update_own_profile(&identity.id, request).await? {
        UpdateOutcome::NothingToUpdate => "Nothing to update",
        UpdateOutcome::Saved => "Settings saved",
    };
    Ok(ApiResponse::success(UpdateMessage { message }))
}
