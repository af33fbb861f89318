//! One pass over all opted-in users, plus the reconciliation passes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use gitavani_core::config::NotificationsConfig;
use gitavani_core::QuoteStrategy;
use gitavani_quotes::QuoteService;
use gitavani_users::{User, UserStore};
use tracing::{debug, info, warn};

use crate::dispatcher::Dispatcher;
use crate::eligibility;
use crate::error::{NotifyError, Result};
use crate::records::NotificationStore;
use crate::types::{BatchSummary, OutcomeKind, UserOutcome};

/// Outcome of one reconciliation pass over failed records.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RetrySummary {
    pub retried: usize,
    pub succeeded: usize,
}

/// Walks every opted-in user once per tick, applying eligibility,
/// content generation and dispatch with per-user failure isolation.
pub struct BatchRunner {
    users: Arc<UserStore>,
    records: Arc<NotificationStore>,
    quotes: Arc<QuoteService>,
    dispatcher: Dispatcher,
    config: NotificationsConfig,
}

impl BatchRunner {
    pub fn new(
        users: Arc<UserStore>,
        records: Arc<NotificationStore>,
        quotes: Arc<QuoteService>,
        dispatcher: Dispatcher,
        config: NotificationsConfig,
    ) -> Self {
        Self {
            users,
            records,
            quotes,
            dispatcher,
            config,
        }
    }

    /// One batch tick.
    ///
    /// Errors out only when the opted-in query itself fails — that
    /// aborts this tick and the next one retries from scratch. Every
    /// per-user failure is caught and recorded in the summary instead.
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<BatchSummary> {
        let users = self.users.opted_in(self.config.activity_window_days, now)?;
        debug!(count = users.len(), "opted-in users this tick");

        let mut summary = BatchSummary {
            total_users: users.len(),
            sent: 0,
            skipped: 0,
            results: Vec::new(),
        };

        for user in &users {
            match self.process_user(user, now).await {
                Ok(Some(outcome)) => {
                    if outcome.kind == OutcomeKind::Sent {
                        summary.sent += 1;
                    }
                    summary.results.push(outcome);
                    // Pace dispatches so the gateway rate limit holds.
                    tokio::time::sleep(std::time::Duration::from_millis(self.config.pacing_ms))
                        .await;
                }
                Ok(None) => summary.skipped += 1,
                Err(e) => {
                    warn!(user_id = %user.id, error = %e, "user processing failed");
                    summary.results.push(UserOutcome {
                        user_id: user.id.clone(),
                        email: user.email.clone(),
                        kind: OutcomeKind::Failed,
                        notification_id: None,
                        quote_source: None,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        info!(
            total = summary.total_users,
            sent = summary.sent,
            skipped = summary.skipped,
            "batch pass complete"
        );
        Ok(summary)
    }

    /// Immediate send for one user — the HTTP test-send entry point.
    ///
    /// Skips the delivery-window check but keeps every other guard:
    /// enabled, token present, and not already sent today.
    pub async fn send_now(&self, user_id: &str, now: DateTime<Utc>) -> Result<UserOutcome> {
        let user = self
            .users
            .get(user_id)?
            .ok_or_else(|| NotifyError::Users(gitavani_users::UserError::NotFound(
                user_id.to_string(),
            )))?;

        if !user.profile.enabled {
            return Err(NotifyError::NotEligible("daily quotes disabled".to_string()));
        }
        if user.profile.fcm_token.is_none() {
            return Err(NotifyError::NotEligible("no device token".to_string()));
        }
        let tz: Tz = user.profile.time_zone.parse().unwrap_or(chrono_tz::UTC);
        if eligibility::already_sent_today(
            user.profile.last_sent_at,
            now,
            self.config.sent_day_rule,
            tz,
        ) {
            return Err(NotifyError::NotEligible("already sent today".to_string()));
        }

        self.deliver(&user, now).await
    }

    /// Re-drive failed records still under the attempt ceiling.
    pub async fn retry_failed(&self, now: DateTime<Utc>) -> Result<RetrySummary> {
        let failed = self.records.failed_below(self.config.max_attempts)?;
        info!(count = failed.len(), "retrying failed notifications");

        let mut summary = RetrySummary {
            retried: 0,
            succeeded: 0,
        };

        for record in &failed {
            let token = match self.users.get(&record.user_id)? {
                Some(u) => u.profile.fcm_token,
                None => None,
            };
            let Some(token) = token else {
                self.records.record_attempt(
                    &record.id,
                    false,
                    Some("user or device token missing"),
                    now,
                )?;
                continue;
            };

            summary.retried += 1;
            if self.dispatcher.redeliver(record, &token, now).await? {
                summary.succeeded += 1;
            }
            tokio::time::sleep(std::time::Duration::from_millis(self.config.pacing_ms)).await;
        }

        Ok(summary)
    }

    /// Drop records past their expiry instant, independent of status.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        self.records.purge_expired(now)
    }

    /// Eligibility, suppression, content and dispatch for one user.
    /// `Ok(None)` means skipped; errors bubble to the caller where they
    /// become this user's failure entry.
    async fn process_user(&self, user: &User, now: DateTime<Utc>) -> Result<Option<UserOutcome>> {
        if !eligibility::is_eligible(
            &user.profile,
            now,
            self.config.window_minutes,
            self.config.sent_day_rule,
        ) {
            return Ok(None);
        }

        // Poison guard: a user whose dispatches keep failing is
        // suppressed for the rest of the day instead of being retried
        // every tick inside the window.
        let tz: Tz = user.profile.time_zone.parse().unwrap_or(chrono_tz::UTC);
        let day_start = eligibility::day_start(now, self.config.sent_day_rule, tz);
        let failures = self.records.failed_count_since(&user.id, day_start)?;
        if failures >= self.config.poison_threshold {
            warn!(
                user_id = %user.id,
                failures,
                "user suppressed until tomorrow after repeated delivery failures"
            );
            return Ok(None);
        }

        let outcome = self.deliver(user, now).await?;
        Ok(Some(outcome))
    }

    /// Shared tail of the batch and send-now paths: quote, cursor
    /// advance, dispatch.
    async fn deliver(&self, user: &User, now: DateTime<Utc>) -> Result<UserOutcome> {
        let position = (user.profile.strategy == QuoteStrategy::Sequential)
            .then(|| user.progress.position());

        let quote = self
            .quotes
            .daily_quote(user.profile.language, user.profile.strategy, position)
            .await;

        // The cursor only moves after a successful generation, so a
        // fallback day re-presents the same verse tomorrow.
        let sequential = if user.profile.strategy == QuoteStrategy::Sequential && quote.success {
            Some(self.users.advance_progress(&user.id, now)?)
        } else {
            None
        };

        let outcome = self
            .dispatcher
            .dispatch(user, &quote, sequential.as_ref(), now)
            .await?;

        Ok(UserOutcome {
            user_id: user.id.clone(),
            email: user.email.clone(),
            kind: if outcome.success {
                OutcomeKind::Sent
            } else {
                OutcomeKind::Failed
            },
            notification_id: Some(outcome.notification_id),
            quote_source: Some(quote.source),
            error: outcome.error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{PushError, PushGateway, PushMessage};
    use crate::types::DeliveryStatus;
    use async_trait::async_trait;
    use chrono::Timelike;
    use gitavani_core::{Language, QuoteStrategy};
    use gitavani_users::PreferencesPatch;
    use rusqlite::Connection;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubGateway {
        fail_tokens: Vec<String>,
        calls: AtomicUsize,
    }

    impl StubGateway {
        fn failing_for(tokens: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                fail_tokens: tokens.iter().map(|s| s.to_string()).collect(),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl PushGateway for StubGateway {
        fn name(&self) -> &str {
            "stub"
        }
        async fn send(&self, message: &PushMessage) -> std::result::Result<String, PushError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_tokens.contains(&message.token) {
                Err(PushError::Rejected("InvalidRegistration".to_string()))
            } else {
                Ok("fcm-msg-1".to_string())
            }
        }
    }

    struct StubProvider;

    #[async_trait]
    impl gitavani_quotes::QuoteProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }
        async fn generate(
            &self,
            _prompt: &str,
        ) -> std::result::Result<String, gitavani_quotes::ProviderError> {
            Ok("**Verse:** 1.1\n**Sanskrit:** धर्मक्षेत्रे कुरुक्षेत्रे\n\
**Translation:** On the field of dharma, assembled for battle.\n\
**Daily Reflection:** Every undertaking begins with an honest look at \
the field you stand on."
                .to_string())
        }
    }

    struct DownProvider;

    #[async_trait]
    impl gitavani_quotes::QuoteProvider for DownProvider {
        fn name(&self) -> &str {
            "down"
        }
        async fn generate(
            &self,
            _prompt: &str,
        ) -> std::result::Result<String, gitavani_quotes::ProviderError> {
            Err(gitavani_quotes::ProviderError::Unavailable(
                "provider outage".to_string(),
            ))
        }
    }

    struct Harness {
        users: Arc<UserStore>,
        records: Arc<NotificationStore>,
        runner: BatchRunner,
        gateway: Arc<StubGateway>,
    }

    fn harness(fail_tokens: &[&str]) -> Harness {
        harness_with(fail_tokens, Box::new(StubProvider))
    }

    fn harness_with(
        fail_tokens: &[&str],
        provider: Box<dyn gitavani_quotes::QuoteProvider>,
    ) -> Harness {
        let users_conn = Connection::open_in_memory().unwrap();
        gitavani_users::db::init_db(&users_conn).unwrap();
        let users = Arc::new(UserStore::new(users_conn));

        let records_conn = Connection::open_in_memory().unwrap();
        crate::db::init_db(&records_conn).unwrap();
        let records = Arc::new(NotificationStore::new(records_conn));

        let gateway = StubGateway::failing_for(fail_tokens);
        let config = NotificationsConfig {
            pacing_ms: 0,
            ..Default::default()
        };
        let dispatcher = Dispatcher::new(
            Arc::clone(&users),
            Arc::clone(&records),
            gateway.clone() as Arc<dyn PushGateway>,
            config.clone(),
        );
        // corpus_probability 0.0 keeps the stub provider in the loop for
        // every strategy, so replies stay deterministic.
        let quotes = Arc::new(QuoteService::new(provider, 0.0));
        let runner = BatchRunner::new(
            Arc::clone(&users),
            Arc::clone(&records),
            quotes,
            dispatcher,
            config,
        );
        Harness {
            users,
            records,
            runner,
            gateway,
        }
    }

    /// Mid-day pinned instant — keeps window math away from the UTC
    /// midnight boundary, where "today" flips between ticks.
    fn fixed_now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-06-10T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    /// A user whose delivery window contains `now` (UTC zone).
    fn due_user(h: &Harness, token: &str, strategy: QuoteStrategy, now: DateTime<Utc>) -> String {
        let user = h
            .users
            .create_user("U", &format!("{token}@x.com"))
            .unwrap();
        h.users
            .update_preferences(
                &user.id,
                &PreferencesPatch {
                    enabled: Some(true),
                    local_time: Some(format!("{:02}:{:02}", now.hour(), now.minute())),
                    time_zone: Some("UTC".to_string()),
                    language: Some(Language::English),
                    strategy: Some(strategy),
                },
            )
            .unwrap();
        h.users.save_token(&user.id, Some(token)).unwrap();
        user.id
    }

    #[tokio::test]
    async fn one_users_failure_does_not_abort_the_batch() {
        let h = harness(&["tok-2"]);
        let now = fixed_now();
        let u1 = due_user(&h, "tok-1", QuoteStrategy::Random, now);
        let u2 = due_user(&h, "tok-2", QuoteStrategy::Random, now);
        let u3 = due_user(&h, "tok-3", QuoteStrategy::Random, now);

        let summary = h.runner.run_once(now).await.unwrap();
        assert_eq!(summary.total_users, 3);
        assert_eq!(summary.sent, 2);
        assert_eq!(summary.results.len(), 3);

        let by_id = |id: &str| summary.results.iter().find(|r| r.user_id == id).unwrap();
        assert_eq!(by_id(&u1).kind, OutcomeKind::Sent);
        assert_eq!(by_id(&u2).kind, OutcomeKind::Failed);
        assert!(by_id(&u2).error.is_some());
        assert_eq!(by_id(&u3).kind, OutcomeKind::Sent);
    }

    #[tokio::test]
    async fn users_outside_their_window_are_skipped() {
        let h = harness(&[]);
        let now = fixed_now();
        // Window is centred 3 hours away from now.
        let shifted = now + chrono::Duration::hours(3);
        due_user(&h, "tok-1", QuoteStrategy::Random, shifted);

        let summary = h.runner.run_once(now).await.unwrap();
        assert_eq!(summary.total_users, 1);
        assert_eq!(summary.sent, 0);
        assert_eq!(summary.skipped, 1);
        assert!(summary.results.is_empty());
        assert_eq!(h.gateway.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn second_tick_same_day_sends_nothing() {
        let h = harness(&[]);
        let now = fixed_now();
        due_user(&h, "tok-1", QuoteStrategy::Random, now);

        let first = h.runner.run_once(now).await.unwrap();
        assert_eq!(first.sent, 1);

        let second = h.runner.run_once(now + chrono::Duration::minutes(1)).await.unwrap();
        assert_eq!(second.sent, 0);
        assert_eq!(second.skipped, 1);
    }

    #[tokio::test]
    async fn sequential_cursor_advances_after_successful_generation() {
        let h = harness(&[]);
        let now = fixed_now();
        let uid = due_user(&h, "tok-1", QuoteStrategy::Sequential, now);

        let summary = h.runner.run_once(now).await.unwrap();
        assert_eq!(summary.sent, 1);

        let user = h.users.get(&uid).unwrap().unwrap();
        assert_eq!(user.progress.current_verse, 2);
        assert_eq!(user.progress.total_read, 1);

        // The record carries the presented position.
        let recs = h.records.list_for_user(&uid, 10).unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(
            recs[0].payload.metadata["sequential_position"],
            serde_json::json!("1.1")
        );
    }

    #[tokio::test]
    async fn fallback_day_still_delivers_but_holds_the_cursor() {
        let h = harness_with(&[], Box::new(DownProvider));
        let now = fixed_now();
        let uid = due_user(&h, "tok-1", QuoteStrategy::Sequential, now);

        let summary = h.runner.run_once(now).await.unwrap();
        // The fallback verse is still dispatched...
        assert_eq!(summary.sent, 1);
        let recs = h.records.list_for_user(&uid, 10).unwrap();
        assert!(!recs[0].payload.full_quote.is_empty());

        // ...but the cursor stays put, so tomorrow re-presents the verse.
        let user = h.users.get(&uid).unwrap().unwrap();
        assert_eq!(user.progress.current_verse, 1);
        assert_eq!(user.progress.total_read, 0);
    }

    #[tokio::test]
    async fn malformed_time_zone_skips_without_aborting() {
        let h = harness(&[]);
        let now = fixed_now();
        let broken = due_user(&h, "tok-1", QuoteStrategy::Random, now);
        h.users
            .update_preferences(
                &broken,
                &PreferencesPatch {
                    time_zone: Some("Mars/Olympus_Mons".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        due_user(&h, "tok-2", QuoteStrategy::Random, now);

        let summary = h.runner.run_once(now).await.unwrap();
        assert_eq!(summary.sent, 1);
        assert_eq!(summary.skipped, 1);
    }

    #[tokio::test]
    async fn poisoned_user_is_suppressed_for_the_day() {
        let h = harness(&["tok-1"]);
        let now = fixed_now();
        due_user(&h, "tok-1", QuoteStrategy::Random, now);

        // Each tick fails and adds a failed record; after the threshold
        // the user stops being attempted at all.
        let threshold = NotificationsConfig::default().poison_threshold as usize;
        for i in 0..threshold {
            let summary = h.runner.run_once(now).await.unwrap();
            assert_eq!(summary.results.len(), 1, "attempt {i} should dispatch");
        }
        let summary = h.runner.run_once(now).await.unwrap();
        assert!(summary.results.is_empty());
        assert_eq!(summary.skipped, 1);
        assert_eq!(h.gateway.calls.load(Ordering::SeqCst), threshold);
    }

    #[tokio::test]
    async fn send_now_bypasses_the_window_but_not_the_day_guard() {
        let h = harness(&[]);
        let now = fixed_now();
        // Window centred far away — the batch would skip this user.
        let uid = due_user(
            &h,
            "tok-1",
            QuoteStrategy::Random,
            now + chrono::Duration::hours(6),
        );

        let outcome = h.runner.send_now(&uid, now).await.unwrap();
        assert_eq!(outcome.kind, OutcomeKind::Sent);

        // Second immediate send the same day is refused.
        let err = h.runner.send_now(&uid, now).await.unwrap_err();
        assert!(matches!(err, NotifyError::NotEligible(_)));
    }

    #[tokio::test]
    async fn send_now_requires_enabled_and_token() {
        let h = harness(&[]);
        let user = h.users.create_user("U", "u@x.com").unwrap();
        let err = h.runner.send_now(&user.id, fixed_now()).await.unwrap_err();
        assert!(matches!(err, NotifyError::NotEligible(_)));
    }

    #[tokio::test]
    async fn retry_pass_redelivers_failed_records() {
        let h = harness(&["tok-1"]);
        let now = fixed_now();
        let uid = due_user(&h, "tok-1", QuoteStrategy::Random, now);

        let summary = h.runner.run_once(now).await.unwrap();
        assert_eq!(summary.sent, 0);

        // Token replaced — the retry succeeds now.
        h.users.save_token(&uid, Some("tok-good")).unwrap();
        let retry = h.runner.retry_failed(now).await.unwrap();
        assert_eq!(retry.retried, 1);
        assert_eq!(retry.succeeded, 1);

        let recs = h.records.list_for_user(&uid, 10).unwrap();
        assert_eq!(recs[0].delivery_status, DeliveryStatus::Sent);
        assert_eq!(recs[0].delivery_attempts, 2);
    }
}
