use async_trait::async_trait;

/// Common interface for generative content providers.
///
/// One method: hand over a prompt, get raw text back. Everything about
/// formats and fallbacks lives above this trait, so a test double is a
/// few lines.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Provider name for logging and error messages.
    fn name(&self) -> &str;

    /// Generate raw text for `prompt`, waiting for the full response.
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}
