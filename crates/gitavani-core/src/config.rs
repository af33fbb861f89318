use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::types::SentDayRule;

pub const DEFAULT_PORT: u16 = 18920;
pub const DEFAULT_BIND: &str = "127.0.0.1";

/// Top-level config (gitavani.toml + GITAVANI_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitavaniConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub provider: ProviderConfig,
    pub push: PushConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Bearer token required on every endpoint except /health.
    /// `None` disables auth — use only for local development.
    pub auth_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            auth_token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Generative content provider (Gemini REST API).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,
    #[serde(default = "default_provider_model")]
    pub model: String,
    /// Per-request deadline. A slow provider must not wedge a batch.
    #[serde(default = "default_provider_timeout_secs")]
    pub timeout_secs: u64,
}

/// Push delivery gateway (FCM legacy HTTP API).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    pub server_key: String,
    #[serde(default = "default_push_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_push_timeout_secs")]
    pub timeout_secs: u64,
}

/// Knobs for the daily-quote engine itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Tolerance around the user's configured delivery time, in minutes.
    #[serde(default = "default_window_minutes")]
    pub window_minutes: i64,
    /// Which calendar the "already sent today" comparison uses.
    #[serde(default)]
    pub sent_day_rule: SentDayRule,
    /// Probability that a Random-strategy quote is served from the
    /// embedded corpus instead of the provider.
    #[serde(default = "default_corpus_probability")]
    pub corpus_probability: f64,
    /// Delay between consecutive dispatches within one batch.
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
    /// Display length the notification body is truncated to.
    #[serde(default = "default_body_chars")]
    pub body_chars: usize,
    /// Ceiling on delivery attempts per notification record.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Consecutive same-day failures after which a user is suppressed
    /// until the next day.
    #[serde(default = "default_poison_threshold")]
    pub poison_threshold: u32,
    /// Users whose last login is older than this are skipped.
    #[serde(default = "default_activity_window_days")]
    pub activity_window_days: i64,
    /// Notification records are purged this long after creation.
    #[serde(default = "default_expiry_days")]
    pub expiry_days: i64,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            window_minutes: default_window_minutes(),
            sent_day_rule: SentDayRule::default(),
            corpus_probability: default_corpus_probability(),
            pacing_ms: default_pacing_ms(),
            body_chars: default_body_chars(),
            max_attempts: default_max_attempts(),
            poison_threshold: default_poison_threshold(),
            activity_window_days: default_activity_window_days(),
            expiry_days: default_expiry_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Only the primary deployment instance runs the loop.
    #[serde(default = "bool_true")]
    pub enabled: bool,
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,
    /// Hard deadline on one batch pass, so a hung external call cannot
    /// hold the overlap guard forever.
    #[serde(default = "default_batch_deadline_secs")]
    pub batch_deadline_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_secs: default_tick_secs(),
            batch_deadline_secs: default_batch_deadline_secs(),
        }
    }
}

fn bool_true() -> bool {
    true
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.gitavani/gitavani.db", home)
}
fn default_provider_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}
fn default_provider_model() -> String {
    "gemini-2.0-flash".to_string()
}
fn default_provider_timeout_secs() -> u64 {
    30
}
fn default_push_endpoint() -> String {
    "https://fcm.googleapis.com/fcm/send".to_string()
}
fn default_push_timeout_secs() -> u64 {
    10
}
fn default_window_minutes() -> i64 {
    5
}
fn default_corpus_probability() -> f64 {
    0.3
}
fn default_pacing_ms() -> u64 {
    2000
}
fn default_body_chars() -> usize {
    100
}
fn default_max_attempts() -> u32 {
    3
}
fn default_poison_threshold() -> u32 {
    5
}
fn default_activity_window_days() -> i64 {
    7
}
fn default_expiry_days() -> i64 {
    30
}
fn default_tick_secs() -> u64 {
    60
}
fn default_batch_deadline_secs() -> u64 {
    300
}

impl GitavaniConfig {
    /// Load config from a TOML file with GITAVANI_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.gitavani/gitavani.toml
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: GitavaniConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("GITAVANI_").split("_"))
            .extract()
            .map_err(|e| crate::error::GitavaniError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.gitavani/gitavani.toml", home)
}
