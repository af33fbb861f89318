use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("User store error: {0}")]
    Users(#[from] gitavani_users::UserError),

    #[error("Push gateway error: {0}")]
    Push(#[from] crate::gateway::PushError),

    #[error("Notification not found: {id}")]
    RecordNotFound { id: String },

    #[error("User not eligible: {0}")]
    NotEligible(String),
}

pub type Result<T> = std::result::Result<T, NotifyError>;
