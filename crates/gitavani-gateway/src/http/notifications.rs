//! Notification record endpoints.
//!
//! GET   /users/{id}/notifications          — recent records, newest first
//! POST  /users/{id}/notifications/read-all — mark everything read
//! PATCH /notifications/{id}/read           — mark one record read

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::app::AppState;
use crate::auth::check_auth;
use crate::http::{err, unauthorized, ErrorReply};
use gitavani_notify::{NotificationRecord, NotifyError};

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

#[derive(Serialize)]
pub struct ListReply {
    pub notifications: Vec<NotificationRecord>,
}

pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListReply>, ErrorReply> {
    if !check_auth(&state, &headers) {
        return Err(unauthorized());
    }
    let notifications = state
        .records
        .list_for_user(&user_id, query.limit.min(200))
        .map_err(internal)?;
    Ok(Json(ListReply { notifications }))
}

pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, ErrorReply> {
    if !check_auth(&state, &headers) {
        return Err(unauthorized());
    }
    match state.records.mark_read(&id) {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(NotifyError::RecordNotFound { id }) => Err(err(
            StatusCode::NOT_FOUND,
            format!("notification not found: {id}"),
        )),
        Err(e) => Err(internal(e)),
    }
}

#[derive(Serialize)]
pub struct ReadAllReply {
    pub marked: usize,
}

pub async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Result<Json<ReadAllReply>, ErrorReply> {
    if !check_auth(&state, &headers) {
        return Err(unauthorized());
    }
    let marked = state.records.mark_all_read(&user_id).map_err(internal)?;
    Ok(Json(ReadAllReply { marked }))
}

fn internal(e: impl std::fmt::Display) -> ErrorReply {
    warn!(error = %e, "notifications endpoint failed");
    err(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
