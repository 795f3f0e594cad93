//! Landing target resolution: which page a user lands on after sign-in.
//!
//! A persona's configured `default_landing_path` always wins. Configured
//! paths that predate a route reorganisation are rewritten through
//! `LEGACY_PATHS`; personas without a configured path fall back to
//! `PATHS_BY_CODE`, then to `DEFAULT_LANDING_PATH`.

use std::sync::Arc;

use axum::http::HeaderValue;

use crate::auth::Identity;
use crate::database::models::PersonaInfo;
use crate::database::{ProfileStore, StoreError};

/// Where anonymous visitors start.
pub const PUBLIC_ENTRY_PATH: &str = "/";

/// Where routes that need a session send anonymous visitors.
pub const LOGIN_PATH: &str = "/login";

/// Generic landing for unrecognised personas.
pub const DEFAULT_LANDING_PATH: &str = "/explorer";

/// Old route -> current route, matched exactly after trailing slashes are stripped.
pub const LEGACY_PATHS: &[(&str, &str)] = &[
    ("/student", "/student/home"),
    ("/students", "/student/home"),
    ("/student/primary", "/student/home"),
    ("/students/primary", "/student/home"),
    ("/student-elementary", "/student/home"),
];

/// Lower-cased persona code -> landing path.
pub const PATHS_BY_CODE: &[(&str, &str)] = &[
    ("student_elementary", "/student/home"),
    ("student_middle", "/student/home"),
    ("student_high", "/student/home"),
    ("student", "/student/home"),
    ("researcher", "/researcher/home"),
    ("enthusiast", "/enthusiast/home"),
    ("moderator", "/moderator/home"),
    ("admin", "/admin/home"),
];

/// Trim and ensure exactly one leading `/`, so a configured `//host` can
/// never become a protocol-relative redirect.
pub fn normalize_path(path: &str) -> String {
    format!("/{}", path.trim().trim_start_matches(['/', '\\']))
}

/// `path` if it can be sent as a `Location` header, the generic landing otherwise.
fn usable_location(path: String) -> String {
    if HeaderValue::from_str(&path).is_ok() {
        return path;
    }
    tracing::warn!("Configured landing path {:?} is not a valid location, using {}", path, DEFAULT_LANDING_PATH);
    DEFAULT_LANDING_PATH.to_string()
}

/// Current equivalent of a legacy route, if `path` is one.
pub fn migrate_legacy_path(path: &str) -> Option<&'static str> {
    let key = path.trim().trim_end_matches('/');
    LEGACY_PATHS
        .iter()
        .find(|(legacy, _)| *legacy == key)
        .map(|(_, current)| *current)
}

/// Landing path for a persona code, case-insensitive.
pub fn path_for_code(code: &str) -> Option<&'static str> {
    let code = code.trim().to_lowercase();
    PATHS_BY_CODE
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, path)| *path)
}

/// Landing path for a persona. Pure: no I/O, safe to call anywhere.
pub fn compute_landing_path(persona: Option<&PersonaInfo>) -> String {
    let configured = persona
        .and_then(|p| p.default_landing_path.as_deref())
        .map(str::trim)
        .unwrap_or_default();

    if !configured.is_empty() {
        let normalized = normalize_path(configured);
        return match migrate_legacy_path(&normalized) {
            Some(current) => current.to_string(),
            None => usable_location(normalized),
        };
    }

    let code = persona.and_then(|p| p.code.as_deref()).unwrap_or_default();
    normalize_path(path_for_code(code).unwrap_or(DEFAULT_LANDING_PATH))
}

/// Looks up a caller's persona and computes their landing path.
#[derive(Clone)]
pub struct LandingResolver {
    profiles: Arc<dyn ProfileStore>,
}

impl LandingResolver {
    pub fn new(profiles: Arc<dyn ProfileStore>) -> Self {
        Self { profiles }
    }

    /// Anonymous callers get the public entry. Store failures are logged
    /// and resolve to the generic landing rather than failing the redirect.
    pub async fn resolve(&self, identity: Option<&Identity>) -> String {
        let Some(identity) = identity else {
            return PUBLIC_ENTRY_PATH.to_string();
        };

        let persona = match self.persona_for(&identity.id).await {
            Ok(persona) => persona,
            Err(e) => {
                tracing::warn!("Landing lookup failed for {}: {}", identity.id, e);
                return DEFAULT_LANDING_PATH.to_string();
            }
        };

        let path = compute_landing_path(persona.as_ref());
        tracing::debug!("Resolved landing for {}: {}", identity.id, path);
        path
    }

    async fn persona_for(&self, user_id: &str) -> Result<Option<PersonaInfo>, StoreError> {
        let Some(profile) = self.profiles.profile(user_id).await? else {
            return Ok(None);
        };
        let Some(persona_id) = profile.persona_id.as_deref() else {
            return Ok(None);
        };
        let persona = self.profiles.persona_by_id(persona_id).await?;
        Ok(persona.map(|p| p.landing_info()))
    }
}
