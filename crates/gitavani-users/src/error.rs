use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Invalid preference: {0}")]
    InvalidPreference(String),
}

pub type Result<T> = std::result::Result<T, UserError>;
