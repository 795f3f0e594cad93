// handlers/public/personas.rs - GET /api/public/personas

use axum::extract::State;
use serde::Serialize;

use crate::database::models::Persona;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Serialize)]
pub struct PersonaList {
    pub personas: Vec<Persona>,
}

/// Personas a visitor may pick for themselves, ordered by code.
pub async fn get(State(state): State<AppState>) -> ApiResult<PersonaList> {
    let personas = state.profile_service().public_personas().await?;
    Ok(ApiResponse::success(PersonaList { personas }))
}
