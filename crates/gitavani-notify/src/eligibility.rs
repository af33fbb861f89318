//! Decides whether a user is due for their daily quote right now.
//!
//! The delivery window is evaluated on the user's own clock; the
//! "already sent today" guard compares calendar dates under the
//! configured [`SentDayRule`]. The legacy rule uses the server's date,
//! which disagrees with the user-zone window near large UTC offsets —
//! that is why the rule is a parameter and not a constant.

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use gitavani_core::SentDayRule;
use gitavani_users::NotificationProfile;
use tracing::warn;

/// True when `now` falls inside the user's delivery window and nothing
/// has been sent to them today.
///
/// Never panics and never errors: a malformed time zone or delivery
/// time logs a warning and resolves to not-eligible, so one broken
/// profile cannot take down a batch. The caller has already checked
/// `enabled` and the device token.
///
/// The window does not wrap across midnight: a target time within the
/// window of 00:00 is only matched after midnight, not before it.
pub fn is_eligible(
    profile: &NotificationProfile,
    now: DateTime<Utc>,
    window_minutes: i64,
    rule: SentDayRule,
) -> bool {
    let tz: Tz = match profile.time_zone.parse() {
        Ok(tz) => tz,
        Err(_) => {
            warn!(time_zone = %profile.time_zone, "malformed time zone; skipping user");
            return false;
        }
    };

    let scheduled = match profile.scheduled_minutes() {
        Some(m) => m,
        None => {
            warn!(local_time = %profile.local_time, "malformed delivery time; skipping user");
            return false;
        }
    };

    let local = now.with_timezone(&tz);
    let current = i64::from(local.hour()) * 60 + i64::from(local.minute());
    let diff = (current - scheduled).abs();

    diff <= window_minutes && !already_sent_today(profile.last_sent_at, now, rule, tz)
}

/// Calendar-date comparison of the last send against today.
pub fn already_sent_today(
    last_sent: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    rule: SentDayRule,
    tz: Tz,
) -> bool {
    let Some(last) = last_sent else {
        return false;
    };
    match rule {
        SentDayRule::ServerDate => last.date_naive() == now.date_naive(),
        SentDayRule::UserZone => {
            last.with_timezone(&tz).date_naive() == now.with_timezone(&tz).date_naive()
        }
    }
}

/// Start of "today" under `rule`, as a UTC instant. The conditional
/// `last_sent_at` update uses this as its guard boundary.
pub fn day_start(now: DateTime<Utc>, rule: SentDayRule, tz: Tz) -> DateTime<Utc> {
    match rule {
        SentDayRule::ServerDate => utc_midnight(now),
        SentDayRule::UserZone => {
            let local_date = now.with_timezone(&tz).date_naive();
            match tz
                .with_ymd_and_hms(local_date.year(), local_date.month(), local_date.day(), 0, 0, 0)
            {
                chrono::offset::LocalResult::Single(dt) => dt.with_timezone(&Utc),
                // DST gap/fold at midnight — fall back to the server day.
                _ => utc_midnight(now),
            }
        }
    }
}

fn utc_midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), now.day(), 0, 0, 0)
        .single()
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitavani_core::{Language, QuoteStrategy};

    fn profile(local_time: &str, time_zone: &str) -> NotificationProfile {
        NotificationProfile {
            enabled: true,
            local_time: local_time.to_string(),
            time_zone: time_zone.to_string(),
            last_sent_at: None,
            language: Language::English,
            strategy: QuoteStrategy::Random,
            fcm_token: Some("tok".to_string()),
        }
    }

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn window_edges_in_utc() {
        let p = profile("09:00", "UTC");
        let rule = SentDayRule::ServerDate;
        // 09:03 — inside the window.
        assert!(is_eligible(&p, utc("2025-06-10T09:03:00Z"), 5, rule));
        // 09:06 — one minute past.
        assert!(!is_eligible(&p, utc("2025-06-10T09:06:00Z"), 5, rule));
        // 08:54 — six minutes early.
        assert!(!is_eligible(&p, utc("2025-06-10T08:54:00Z"), 5, rule));
        // 08:55 — exactly on the early edge.
        assert!(is_eligible(&p, utc("2025-06-10T08:55:00Z"), 5, rule));
    }

    #[test]
    fn window_follows_the_users_zone() {
        // 09:03 in Kolkata is 03:33 UTC.
        let p = profile("09:00", "Asia/Kolkata");
        assert!(is_eligible(
            &p,
            utc("2025-06-10T03:33:00Z"),
            5,
            SentDayRule::ServerDate
        ));
        // 09:03 UTC is mid-afternoon in Kolkata.
        assert!(!is_eligible(
            &p,
            utc("2025-06-10T09:03:00Z"),
            5,
            SentDayRule::ServerDate
        ));
    }

    #[test]
    fn already_sent_today_blocks_a_second_send() {
        let mut p = profile("09:00", "UTC");
        p.last_sent_at = Some(utc("2025-06-10T09:01:00Z"));
        assert!(!is_eligible(
            &p,
            utc("2025-06-10T09:03:00Z"),
            5,
            SentDayRule::ServerDate
        ));
        // Yesterday's send does not block.
        p.last_sent_at = Some(utc("2025-06-09T09:01:00Z"));
        assert!(is_eligible(
            &p,
            utc("2025-06-10T09:03:00Z"),
            5,
            SentDayRule::ServerDate
        ));
    }

    #[test]
    fn malformed_configuration_is_never_eligible() {
        let p = profile("09:00", "Mars/Olympus_Mons");
        assert!(!is_eligible(
            &p,
            utc("2025-06-10T09:00:00Z"),
            5,
            SentDayRule::ServerDate
        ));
        let p = profile("9 o'clock", "UTC");
        assert!(!is_eligible(
            &p,
            utc("2025-06-10T09:00:00Z"),
            5,
            SentDayRule::ServerDate
        ));
    }

    #[test]
    fn window_does_not_wrap_across_midnight() {
        // Target 00:02, clock 23:58 — four minutes apart on a clock
        // face but 1436 apart in absolute minutes. Documented edge.
        let p = profile("00:02", "UTC");
        assert!(!is_eligible(
            &p,
            utc("2025-06-10T23:58:00Z"),
            5,
            SentDayRule::ServerDate
        ));
    }

    #[test]
    fn sent_day_rules_disagree_near_utc_offsets() {
        // Los Angeles evening, 23:00 local on Jan 1; UTC already Jan 2.
        let tz: Tz = "America/Los_Angeles".parse().unwrap();
        let now = utc("2025-01-02T07:00:00Z");
        let last = Some(utc("2025-01-01T20:00:00Z")); // noon local, Jan 1

        // Server calendar: Jan 1 != Jan 2 — looks unsent.
        assert!(!already_sent_today(last, now, SentDayRule::ServerDate, tz));
        // User calendar: both instants are Jan 1 locally — already sent.
        assert!(already_sent_today(last, now, SentDayRule::UserZone, tz));
    }

    #[test]
    fn day_start_matches_each_rule() {
        let tz: Tz = "Asia/Kolkata".parse().unwrap();
        let now = utc("2025-06-10T03:33:00Z"); // 09:03 local

        assert_eq!(
            day_start(now, SentDayRule::ServerDate, tz),
            utc("2025-06-10T00:00:00Z")
        );
        // Kolkata midnight is 18:30 UTC the previous day.
        assert_eq!(
            day_start(now, SentDayRule::UserZone, tz),
            utc("2025-06-09T18:30:00Z")
        );
    }
}
