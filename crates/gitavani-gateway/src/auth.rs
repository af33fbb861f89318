use axum::http::HeaderMap;

use crate::app::AppState;

/// Returns true if the request carries the configured bearer token.
/// Auth is disabled entirely when no token is configured (local dev).
pub fn check_auth(state: &AppState, headers: &HeaderMap) -> bool {
    let Some(ref expected) = state.config.gateway.auth_token else {
        return true;
    };
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| token == expected)
}
