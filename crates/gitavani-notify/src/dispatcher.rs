//! Builds the transport envelope for one user and records the outcome.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use gitavani_core::config::NotificationsConfig;
use gitavani_corpus::Advanced;
use gitavani_quotes::QuoteResult;
use gitavani_users::{User, UserStore};
use tracing::{info, warn};
use uuid::Uuid;

use crate::eligibility;
use crate::error::{NotifyError, Result};
use crate::gateway::{PushGateway, PushMessage};
use crate::records::NotificationStore;
use crate::types::{
    DeliveryOutcome, DeliveryStatus, NotificationKind, NotificationRecord, Priority, QuotePayload,
};

const TITLE: &str = "🕉️ Daily Bhagavad Gita Wisdom";

/// Sends one notification to one user and persists the bookkeeping.
pub struct Dispatcher {
    users: Arc<UserStore>,
    records: Arc<NotificationStore>,
    gateway: Arc<dyn PushGateway>,
    config: NotificationsConfig,
}

impl Dispatcher {
    pub fn new(
        users: Arc<UserStore>,
        records: Arc<NotificationStore>,
        gateway: Arc<dyn PushGateway>,
        config: NotificationsConfig,
    ) -> Self {
        Self {
            users,
            records,
            gateway,
            config,
        }
    }

    /// One delivery attempt for one user.
    ///
    /// The once-per-day slot is claimed (conditional update) *before*
    /// the gateway call, so two racing runners cannot both push; a
    /// gateway failure rolls the claim back, leaving `last_sent_at`
    /// unchanged and the user eligible for a later tick. The outcome is
    /// persisted as a notification record either way.
    pub async fn dispatch(
        &self,
        user: &User,
        quote: &QuoteResult,
        sequential: Option<&Advanced>,
        now: DateTime<Utc>,
    ) -> Result<DeliveryOutcome> {
        let token = user
            .profile
            .fcm_token
            .clone()
            .ok_or_else(|| NotifyError::NotEligible("no device token".to_string()))?;

        let tz: Tz = user.profile.time_zone.parse().unwrap_or(chrono_tz::UTC);
        let day_start = eligibility::day_start(now, self.config.sent_day_rule, tz);

        let prior = user.profile.last_sent_at;
        if !self.users.mark_sent(&user.id, now, day_start)? {
            return Err(NotifyError::NotEligible(
                "already sent today".to_string(),
            ));
        }

        let record_id = Uuid::new_v4().to_string();
        let message = self.build_message(user, quote, sequential, &record_id, &token, now);

        match self.gateway.send(&message).await {
            Ok(message_id) => {
                info!(
                    user_id = %user.id,
                    notification_id = %record_id,
                    gateway_id = %message_id,
                    "notification sent"
                );
                let record = self.build_record(
                    user,
                    quote,
                    sequential,
                    &record_id,
                    DeliveryStatus::Sent,
                    None,
                    Some(&message_id),
                    now,
                );
                self.records.insert(&record)?;
                Ok(DeliveryOutcome {
                    success: true,
                    notification_id: record_id,
                    error: None,
                })
            }
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "gateway delivery failed");
                // Release the day slot so a later tick can retry.
                self.users.revert_sent(&user.id, now, prior)?;
                let err_text = e.to_string();
                let record = self.build_record(
                    user,
                    quote,
                    sequential,
                    &record_id,
                    DeliveryStatus::Failed,
                    Some(&err_text),
                    None,
                    now,
                );
                self.records.insert(&record)?;
                Ok(DeliveryOutcome {
                    success: false,
                    notification_id: record_id,
                    error: Some(err_text),
                })
            }
        }
    }

    /// Re-drive a failed record through the gateway. Used by the
    /// reconciliation pass; attempts only ever increase.
    pub async fn redeliver(
        &self,
        record: &NotificationRecord,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let message = PushMessage {
            token: token.to_string(),
            title: record.title.clone(),
            body: record.body.clone(),
            data: serde_json::to_value(&record.payload).unwrap_or_default(),
        };
        match self.gateway.send(&message).await {
            Ok(_) => {
                self.records.record_attempt(&record.id, true, None, now)?;
                Ok(true)
            }
            Err(e) => {
                self.records
                    .record_attempt(&record.id, false, Some(&e.to_string()), now)?;
                Ok(false)
            }
        }
    }

    fn build_message(
        &self,
        user: &User,
        quote: &QuoteResult,
        sequential: Option<&Advanced>,
        record_id: &str,
        token: &str,
        now: DateTime<Utc>,
    ) -> PushMessage {
        let mut data = serde_json::json!({
            "type": NotificationKind::DailyQuote.to_string(),
            "notification_id": record_id,
            "full_quote": quote.text,
            "language": user.profile.language.to_string(),
            "strategy": user.profile.strategy.to_string(),
            "source": quote.source,
            "timestamp": now.to_rfc3339(),
        });
        if let Some(ref verse) = quote.parsed.verse {
            data["verse"] = serde_json::json!(verse);
        }
        if let Some(adv) = sequential {
            data["sequential_position"] = serde_json::json!(adv.presented.to_string());
            data["total_verses_read"] = serde_json::json!(adv.next.total_read);
        }

        PushMessage {
            token: token.to_string(),
            title: TITLE.to_string(),
            body: truncate_chars(&quote.text, self.config.body_chars),
            data,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn build_record(
        &self,
        user: &User,
        quote: &QuoteResult,
        sequential: Option<&Advanced>,
        record_id: &str,
        status: DeliveryStatus,
        error: Option<&str>,
        gateway_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> NotificationRecord {
        let metadata = serde_json::json!({
            "source": quote.source,
            "gateway_message_id": gateway_id,
            "sent_date": now.date_naive().to_string(),
            "sequential_position": sequential.map(|a| a.presented.to_string()),
        });

        NotificationRecord {
            id: record_id.to_string(),
            user_id: user.id.clone(),
            title: TITLE.to_string(),
            body: truncate_chars(&quote.text, self.config.body_chars),
            kind: NotificationKind::DailyQuote,
            payload: QuotePayload {
                full_quote: quote.text.clone(),
                verse_ref: quote.parsed.verse.clone(),
                language: user.profile.language,
                strategy: user.profile.strategy,
                action_url: None,
                metadata,
            },
            is_read: false,
            read_at: None,
            delivery_status: status,
            error_message: error.map(String::from),
            delivery_attempts: 1,
            last_attempt_at: Some(now),
            priority: Priority::Normal,
            scheduled_for: None,
            expires_at: now + Duration::days(self.config.expiry_days),
            created_at: now,
        }
    }
}

/// Character-boundary-safe truncation; Devanagari must never be cut
/// mid-codepoint.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}
