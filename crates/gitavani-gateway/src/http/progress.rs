//! Sequential reading progress endpoint.
//!
//! POST /users/{id}/progress/reset — reinitialise the cursor. Explicit
//! user action only; the engine never resets progress on its own.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::app::AppState;
use crate::auth::check_auth;
use crate::http::{err, unauthorized, ErrorReply};
use gitavani_users::UserError;

#[derive(Deserialize, Default)]
pub struct ResetRequest {
    #[serde(default = "one")]
    pub chapter: u32,
    #[serde(default = "one")]
    pub verse: u32,
}

fn one() -> u32 {
    1
}

#[derive(Serialize)]
pub struct ResetReply {
    pub position: String,
}

pub async fn reset_progress(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    Json(req): Json<ResetRequest>,
) -> Result<Json<ResetReply>, ErrorReply> {
    if !check_auth(&state, &headers) {
        return Err(unauthorized());
    }
    match state
        .users
        .reset_progress(&user_id, req.chapter, req.verse, Utc::now())
    {
        Ok(progress) => Ok(Json(ResetReply {
            position: progress.position().to_string(),
        })),
        Err(UserError::NotFound(id)) => {
            Err(err(StatusCode::NOT_FOUND, format!("user not found: {id}")))
        }
        Err(e) => {
            warn!(error = %e, "progress reset failed");
            Err(err(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}
