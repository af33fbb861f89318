use chrono::{DateTime, Utc};
use gitavani_core::{Language, QuoteStrategy};
use gitavani_quotes::QuoteSource;
use serde::{Deserialize, Serialize};

/// Category of a notification record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    #[default]
    DailyQuote,
    Reminder,
    System,
    Announcement,
    Personalized,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NotificationKind::DailyQuote => "daily_quote",
            NotificationKind::Reminder => "reminder",
            NotificationKind::System => "system",
            NotificationKind::Announcement => "announcement",
            NotificationKind::Personalized => "personalized",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "daily_quote" => Ok(NotificationKind::DailyQuote),
            "reminder" => Ok(NotificationKind::Reminder),
            "system" => Ok(NotificationKind::System),
            "announcement" => Ok(NotificationKind::Announcement),
            "personalized" => Ok(NotificationKind::Personalized),
            other => Err(format!("unknown notification kind: {other}")),
        }
    }
}

/// Gateway-observable lifecycle of one notification.
///
/// `Sent` means the gateway acknowledged the hand-off; true end-device
/// delivery (`Delivered`) is reported out of band, if ever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    #[default]
    Pending,
    Sent,
    Delivered,
    Failed,
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for DeliveryStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DeliveryStatus::Pending),
            "sent" => Ok(DeliveryStatus::Sent),
            "delivered" => Ok(DeliveryStatus::Delivered),
            "failed" => Ok(DeliveryStatus::Failed),
            other => Err(format!("unknown delivery status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "normal" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

/// Structured payload carried alongside the short notification body.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QuotePayload {
    /// The untruncated quote text.
    pub full_quote: String,
    /// "Chapter.Verse" reference, when the parser found one.
    pub verse_ref: Option<String>,
    pub language: Language,
    pub strategy: QuoteStrategy,
    pub action_url: Option<String>,
    /// Free-form extras (source, sequential position, sent date).
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// One delivery attempt/intent, persisted per dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// UUID v4 string — primary key.
    pub id: String,
    /// Owning user (reference only; records outlive nothing).
    pub user_id: String,
    pub title: String,
    /// Truncated display body.
    pub body: String,
    pub kind: NotificationKind,
    pub payload: QuotePayload,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub delivery_status: DeliveryStatus,
    pub error_message: Option<String>,
    pub delivery_attempts: u32,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub scheduled_for: Option<DateTime<Utc>>,
    /// Purged automatically after this instant regardless of status.
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Result of one dispatch for one user.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryOutcome {
    pub success: bool,
    pub notification_id: String,
    pub error: Option<String>,
}

/// How a user fared within one batch pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Sent,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserOutcome {
    pub user_id: String,
    pub email: String,
    pub kind: OutcomeKind,
    pub notification_id: Option<String>,
    pub quote_source: Option<QuoteSource>,
    pub error: Option<String>,
}

/// Administrative summary of one batch tick.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    /// Users matching the opted-in query.
    pub total_users: usize,
    /// Successful dispatches this pass.
    pub sent: usize,
    /// Users skipped (outside window, already sent, suppressed).
    pub skipped: usize,
    /// Attempted or errored users, in processing order.
    pub results: Vec<UserOutcome>,
}
