//! Notification preference endpoints.
//!
//! GET  /users/{id}/preferences — current profile and reading progress
//! POST /users/{id}/preferences — partial update (unset fields keep
//!                                their stored value)
//! POST /users/{id}/token       — store or clear the FCM device token

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::app::AppState;
use crate::auth::check_auth;
use crate::http::{err, unauthorized, ErrorReply};
use gitavani_users::{NotificationProfile, PreferencesPatch, UserError};

#[derive(Serialize)]
pub struct PreferencesReply {
    pub user_id: String,
    pub profile: NotificationProfile,
    pub progress: ProgressReply,
}

#[derive(Serialize)]
pub struct ProgressReply {
    pub position: String,
    pub completed_chapters: Vec<u32>,
    pub total_read: u64,
}

pub async fn get_preferences(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Result<Json<PreferencesReply>, ErrorReply> {
    if !check_auth(&state, &headers) {
        return Err(unauthorized());
    }
    let user = state
        .users
        .get(&user_id)
        .map_err(internal)?
        .ok_or_else(|| err(StatusCode::NOT_FOUND, format!("user not found: {user_id}")))?;

    Ok(Json(PreferencesReply {
        user_id: user.id,
        progress: ProgressReply {
            position: user.progress.position().to_string(),
            completed_chapters: user.progress.completed_chapters.clone(),
            total_read: user.progress.total_read,
        },
        profile: user.profile,
    }))
}

pub async fn update_preferences(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    Json(patch): Json<PreferencesPatch>,
) -> Result<Json<PreferencesReply>, ErrorReply> {
    if !check_auth(&state, &headers) {
        return Err(unauthorized());
    }

    // Catch a bad zone at the edge; the engine would otherwise silently
    // skip this user on every tick.
    if let Some(ref tz) = patch.time_zone {
        if tz.parse::<chrono_tz::Tz>().is_err() {
            return Err(err(
                StatusCode::BAD_REQUEST,
                format!("unknown time zone: {tz}"),
            ));
        }
    }

    let user = state
        .users
        .update_preferences(&user_id, &patch)
        .map_err(user_error)?;

    Ok(Json(PreferencesReply {
        user_id: user.id,
        progress: ProgressReply {
            position: user.progress.position().to_string(),
            completed_chapters: user.progress.completed_chapters.clone(),
            total_read: user.progress.total_read,
        },
        profile: user.profile,
    }))
}

#[derive(Deserialize)]
pub struct TokenRequest {
    /// `null` clears the token (device logged out).
    pub token: Option<String>,
}

pub async fn save_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    Json(req): Json<TokenRequest>,
) -> Result<StatusCode, ErrorReply> {
    if !check_auth(&state, &headers) {
        return Err(unauthorized());
    }
    state
        .users
        .save_token(&user_id, req.token.as_deref())
        .map_err(user_error)?;
    Ok(StatusCode::NO_CONTENT)
}

fn user_error(e: UserError) -> ErrorReply {
    match e {
        UserError::NotFound(id) => err(StatusCode::NOT_FOUND, format!("user not found: {id}")),
        UserError::InvalidPreference(msg) => err(StatusCode::BAD_REQUEST, msg),
        other => internal(other),
    }
}

fn internal(e: impl std::fmt::Display) -> ErrorReply {
    warn!(error = %e, "preferences endpoint failed");
    err(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
