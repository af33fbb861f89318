use chrono::{DateTime, Utc};
use gitavani_core::{Language, QuoteStrategy};
use gitavani_corpus::ReadingProgress;
use serde::{Deserialize, Serialize};

/// Per-user daily-quote settings plus delivery bookkeeping.
///
/// `last_sent_at` is the engine's once-per-day guard; it is only moved
/// forward by a successful dispatch, never by a failed one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationProfile {
    pub enabled: bool,
    /// Local delivery time, "HH:MM".
    pub local_time: String,
    /// IANA zone name, e.g. "Asia/Kolkata".
    pub time_zone: String,
    pub last_sent_at: Option<DateTime<Utc>>,
    pub language: Language,
    pub strategy: QuoteStrategy,
    pub fcm_token: Option<String>,
}

impl NotificationProfile {
    /// Parse `local_time` into minutes since local midnight.
    pub fn scheduled_minutes(&self) -> Option<i64> {
        let (h, m) = self.local_time.split_once(':')?;
        let h: i64 = h.parse().ok()?;
        let m: i64 = m.parse().ok()?;
        if (0..24).contains(&h) && (0..60).contains(&m) {
            Some(h * 60 + m)
        } else {
            None
        }
    }
}

/// Full user record as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// UUID v4 string — primary key.
    pub id: String,
    pub name: String,
    pub email: String,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub profile: NotificationProfile,
    pub progress: ReadingProgress,
    /// ISO-8601 timestamps.
    pub created_at: String,
    pub updated_at: String,
}

/// Partial preference update from the HTTP surface. `None` leaves the
/// stored value unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferencesPatch {
    pub enabled: Option<bool>,
    pub local_time: Option<String>,
    pub time_zone: Option<String>,
    pub language: Option<Language>,
    pub strategy: Option<QuoteStrategy>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(local_time: &str) -> NotificationProfile {
        NotificationProfile {
            enabled: true,
            local_time: local_time.to_string(),
            time_zone: "UTC".to_string(),
            last_sent_at: None,
            language: Language::English,
            strategy: QuoteStrategy::Random,
            fcm_token: Some("tok".to_string()),
        }
    }

    #[test]
    fn scheduled_minutes_parses_valid_times() {
        assert_eq!(profile("09:00").scheduled_minutes(), Some(540));
        assert_eq!(profile("00:00").scheduled_minutes(), Some(0));
        assert_eq!(profile("23:59").scheduled_minutes(), Some(1439));
    }

    #[test]
    fn scheduled_minutes_rejects_garbage() {
        assert_eq!(profile("24:00").scheduled_minutes(), None);
        assert_eq!(profile("09:60").scheduled_minutes(), None);
        assert_eq!(profile("morning").scheduled_minutes(), None);
        assert_eq!(profile("").scheduled_minutes(), None);
    }
}
