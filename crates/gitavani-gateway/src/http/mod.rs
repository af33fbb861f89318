pub mod health;
pub mod notifications;
pub mod preferences;
pub mod progress;
pub mod send;

use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct ApiError {
    pub error: String,
}

pub type ErrorReply = (StatusCode, Json<ApiError>);

pub fn err(status: StatusCode, message: impl Into<String>) -> ErrorReply {
    (
        status,
        Json(ApiError {
            error: message.into(),
        }),
    )
}

pub fn unauthorized() -> ErrorReply {
    err(
        StatusCode::UNAUTHORIZED,
        "Unauthorized. Set 'Authorization: Bearer <your-token>' header.",
    )
}
