//! Dispatch endpoints.
//!
//! POST /users/{id}/send    — immediate send for one user (test send);
//!                            bypasses the delivery window, keeps the
//!                            enabled/token/once-per-day guards
//! POST /admin/run-batch    — trigger one batch tick by hand
//! POST /admin/retry-failed — run the failed-record reconciliation pass

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::warn;

use crate::app::AppState;
use crate::auth::check_auth;
use crate::http::{err, unauthorized, ErrorReply};
use gitavani_notify::batch::RetrySummary;
use gitavani_notify::{BatchSummary, NotifyError, UserOutcome};
use gitavani_users::UserError;

pub async fn send_now(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Result<Json<UserOutcome>, ErrorReply> {
    if !check_auth(&state, &headers) {
        return Err(unauthorized());
    }
    match state.runner.send_now(&user_id, Utc::now()).await {
        Ok(outcome) => Ok(Json(outcome)),
        Err(NotifyError::Users(UserError::NotFound(id))) => {
            Err(err(StatusCode::NOT_FOUND, format!("user not found: {id}")))
        }
        Err(NotifyError::NotEligible(reason)) => Err(err(StatusCode::CONFLICT, reason)),
        Err(e) => Err(internal(e)),
    }
}

pub async fn run_batch(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<BatchSummary>, ErrorReply> {
    if !check_auth(&state, &headers) {
        return Err(unauthorized());
    }
    let summary = state.runner.run_once(Utc::now()).await.map_err(internal)?;
    Ok(Json(summary))
}

pub async fn retry_failed(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<RetrySummary>, ErrorReply> {
    if !check_auth(&state, &headers) {
        return Err(unauthorized());
    }
    let summary = state
        .runner
        .retry_failed(Utc::now())
        .await
        .map_err(internal)?;
    Ok(Json(summary))
}

fn internal(e: impl std::fmt::Display) -> ErrorReply {
    warn!(error = %e, "send endpoint failed");
    err(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
