use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::resolve_caller;
use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the development bypass secret.
pub const BYPASS_HEADER: &str = "x-dev-bypass";

/// Caller id recorded when the bypass header was accepted.
pub const BYPASS_CALLER_ID: &str = "dev-bypass";

/// Administrator that passed the guard, inserted into request extensions
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminCaller {
    pub caller_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Authorized { caller_id: String },
    Rejected { status: StatusCode, message: String },
}

impl GuardDecision {
    fn reject(status: StatusCode, message: impl Into<String>) -> Self {
        GuardDecision::Rejected {
            status,
            message: message.into(),
        }
    }

    pub fn is_authorized(&self) -> bool {
        matches!(self, GuardDecision::Authorized { .. })
    }
}

/// Decides whether a request may run an administrative operation.
///
/// Order: bypass header, then bearer token, then session cookie. A resolved
/// identity must have a profile with the admin flag set. The guard only
/// reads; it is safe to run on every privileged request.
pub struct AdminGuard<'a> {
    state: &'a AppState,
}

impl<'a> AdminGuard<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    pub async fn evaluate(&self, headers: &HeaderMap) -> GuardDecision {
        if self.bypass_accepted(headers) {
            tracing::debug!("Admin guard: bypass header accepted");
            return GuardDecision::Authorized {
                caller_id: BYPASS_CALLER_ID.to_string(),
            };
        }

        let identity = match resolve_caller(self.state.identity.as_ref(), headers, self.state.session_cookie()).await {
            Ok(Some(identity)) => identity,
            Ok(None) => return GuardDecision::reject(StatusCode::UNAUTHORIZED, "Unauthorized"),
            Err(e) => return GuardDecision::reject(StatusCode::UNAUTHORIZED, e.to_string()),
        };

        match self.state.profiles.profile(&identity.id).await {
            Ok(Some(profile)) if profile.is_admin => {
                tracing::debug!("Admin guard: {} authorized", identity.id);
                GuardDecision::Authorized { caller_id: identity.id }
            }
            Ok(_) => {
                tracing::warn!("Admin guard: {} is not an administrator", identity.id);
                GuardDecision::reject(StatusCode::FORBIDDEN, "Forbidden")
            }
            Err(e) => {
                tracing::error!("Admin guard: profile lookup for {} failed: {}", identity.id, e);
                GuardDecision::reject(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        }
    }

    fn bypass_accepted(&self, headers: &HeaderMap) -> bool {
        let Some(expected) = self.state.config.security.dev_bypass_token.as_deref() else {
            return false;
        };
        headers
            .get(BYPASS_HEADER)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|given| !expected.is_empty() && given == expected)
    }
}

/// Middleware for the elevated tier: runs the guard and short-circuits with
/// its rejection, or records the `AdminCaller` for the handler.
pub async fn require_admin(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    match AdminGuard::new(&state).evaluate(request.headers()).await {
        GuardDecision::Authorized { caller_id } => {
            request.extensions_mut().insert(AdminCaller { caller_id });
            next.run(request).await
        }
        GuardDecision::Rejected { status, message } => ApiError::from_status(status, message).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::http::{header, HeaderValue};

    use crate::config::AppConfig;
    use crate::testing::{MemoryStore, StaticIdentityProvider};

    fn app_state(store: Arc<MemoryStore>, bypass: Option<&str>) -> AppState {
        let mut config = AppConfig::development();
        config.security.dev_bypass_token = bypass.map(str::to_string);
        let identity = StaticIdentityProvider::new()
            .with_user("admin-token", "admin")
            .with_user("user-token", "user")
            .with_user("ghost-token", "ghost")
            .with_failure("broken-token");
        AppState::new(config, store.clone(), store, Arc::new(identity))
    }

    fn store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.add_profile("admin", None, true);
        store.add_profile("user", None, false);
        store
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    fn rejected(status: StatusCode, message: &str) -> GuardDecision {
        GuardDecision::reject(status, message)
    }

    #[tokio::test]
    async fn anonymous_is_unauthorized() {
        let state = app_state(store(), None);
        let decision = AdminGuard::new(&state).evaluate(&HeaderMap::new()).await;
        assert_eq!(decision, rejected(StatusCode::UNAUTHORIZED, "Unauthorized"));
    }

    #[tokio::test]
    async fn admin_flag_decides() {
        let state = app_state(store(), None);
        let guard = AdminGuard::new(&state);

        assert_eq!(
            guard.evaluate(&bearer("admin-token")).await,
            GuardDecision::Authorized {
                caller_id: "admin".to_string()
            }
        );
        assert_eq!(
            guard.evaluate(&bearer("user-token")).await,
            rejected(StatusCode::FORBIDDEN, "Forbidden")
        );
        // no profile row is "not admin", not a server fault
        assert_eq!(
            guard.evaluate(&bearer("ghost-token")).await,
            rejected(StatusCode::FORBIDDEN, "Forbidden")
        );
    }

    #[tokio::test]
    async fn bypass_requires_exact_configured_token() {
        let state = app_state(store(), Some("letmein"));
        let guard = AdminGuard::new(&state);

        let mut headers = HeaderMap::new();
        headers.insert(BYPASS_HEADER, HeaderValue::from_static("letmein"));
        assert_eq!(
            guard.evaluate(&headers).await,
            GuardDecision::Authorized {
                caller_id: BYPASS_CALLER_ID.to_string()
            }
        );

        headers.insert(BYPASS_HEADER, HeaderValue::from_static("letmein "));
        assert!(!guard.evaluate(&headers).await.is_authorized());

        let disabled = app_state(store(), None);
        headers.insert(BYPASS_HEADER, HeaderValue::from_static("letmein"));
        assert!(!AdminGuard::new(&disabled).evaluate(&headers).await.is_authorized());
    }

    #[tokio::test]
    async fn rejected_bearer_falls_back_to_session_cookie() {
        let state = app_state(store(), None);
        let mut headers = bearer("unknown");
        headers.insert(header::COOKIE, HeaderValue::from_static("sb-access-token=admin-token"));

        assert!(AdminGuard::new(&state).evaluate(&headers).await.is_authorized());
    }

    #[tokio::test]
    async fn session_failure_is_unauthorized_with_message() {
        let state = app_state(store(), None);
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("sb-access-token=broken-token"));

        match AdminGuard::new(&state).evaluate(&headers).await {
            GuardDecision::Rejected { status, message } => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert!(message.contains("invalid JWT"));
            }
            other => panic!("unexpected decision: {:?}", other),
        }
    }

    #[tokio::test]
    async fn profile_lookup_failure_is_server_error() {
        let store = store();
        store.fail_profile_lookups("connection reset by peer");
        let state = app_state(store, None);

        assert_eq!(
            AdminGuard::new(&state).evaluate(&bearer("admin-token")).await,
            rejected(StatusCode::INTERNAL_SERVER_ERROR, "connection reset by peer")
        );
    }
}
