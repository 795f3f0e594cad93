// handlers/protected/mod.rs - handlers acting on behalf of the signed-in caller
//
// Security Level: caller identity (bearer token or session cookie)
// Routes: /landing, /post-auth, /api/landing, /api/profile/*
//
// There is no blanket middleware here: the landing routes also serve
// anonymous visitors, so each handler resolves the caller itself.

pub mod landing;
pub mod profile;

use axum::http::HeaderMap;

use crate::auth::{resolve_caller, Identity, IdentityError};
use crate::state::AppState;

pub use landing::{api_get as landing_api_get, redirect as landing_redirect};
pub use profile::update as profile_update;

pub(crate) async fn current_caller(state: &AppState, headers: &HeaderMap) -> Result<Option<Identity>, IdentityError> {
    resolve_caller(state.identity.as_ref(), headers, state.session_cookie()).await
}
