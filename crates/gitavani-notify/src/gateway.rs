use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

/// Transport-ready message for one device.
#[derive(Debug, Clone)]
pub struct PushMessage {
    pub token: String,
    pub title: String,
    /// Short display body — already truncated by the dispatcher.
    pub body: String,
    /// Structured payload (untruncated quote, language, references).
    pub data: serde_json::Value,
}

/// Common interface for push delivery gateways.
///
/// One attempt per call, no internal retry — failed records are
/// re-driven by the reconciliation pass, not here.
#[async_trait]
pub trait PushGateway: Send + Sync {
    /// Gateway name for logging and error messages.
    fn name(&self) -> &str;

    /// Hand the message to the gateway. Returns the gateway's message
    /// id on acknowledgment.
    async fn send(&self, message: &PushMessage) -> Result<String, PushError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Delivery rejected: {0}")]
    Rejected(String),

    #[error("Gateway unavailable: {0}")]
    Unavailable(String),
}

/// Firebase Cloud Messaging client (legacy HTTP API).
pub struct FcmGateway {
    client: reqwest::Client,
    server_key: String,
    endpoint: String,
}

impl FcmGateway {
    /// `timeout` caps the whole request — a hung gateway call must not
    /// hold the batch's overlap guard.
    pub fn new(server_key: String, endpoint: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            server_key,
            endpoint,
        }
    }
}

#[async_trait]
impl PushGateway for FcmGateway {
    fn name(&self) -> &str {
        "fcm"
    }

    async fn send(&self, message: &PushMessage) -> Result<String, PushError> {
        let body = serde_json::json!({
            "to": message.token,
            "notification": {
                "title": message.title,
                "body": message.body,
            },
            "data": message.data,
        });

        debug!(title = %message.title, "sending FCM message");

        let resp = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("key={}", self.server_key))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(status, body = %text, "FCM API error");
            return Err(PushError::Api {
                status,
                message: text,
            });
        }

        let api_resp: FcmResponse = resp
            .json()
            .await
            .map_err(|e| PushError::Unavailable(format!("unreadable FCM response: {e}")))?;

        // The legacy API answers 200 even for per-token failures; the
        // verdict is inside the results array.
        match api_resp.results.into_iter().next() {
            Some(FcmResult {
                message_id: Some(id),
                ..
            }) => Ok(id),
            Some(FcmResult {
                error: Some(err), ..
            }) => Err(PushError::Rejected(err)),
            _ => Err(PushError::Rejected("empty FCM result".to_string())),
        }
    }
}

// FCM response types (private — only used for deserialization)

#[derive(Deserialize)]
struct FcmResponse {
    #[serde(default)]
    results: Vec<FcmResult>,
}

#[derive(Deserialize)]
struct FcmResult {
    #[serde(default)]
    message_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}
