use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gitavani_notify::BatchRunner;
use tracing::{error, info};

/// Work the scheduler drives on each tick.
///
/// A trait seam so the loop can be exercised with a test double that
/// blocks or counts invocations.
#[async_trait]
pub trait TickJob: Send + Sync {
    /// One batch pass. Runs at the tick cadence.
    async fn run_tick(&self, now: DateTime<Utc>);

    /// Housekeeping pass (retries, purge). Runs at a coarser cadence;
    /// default no-op.
    async fn run_reconcile(&self, _now: DateTime<Utc>) {}
}

/// Production job: one daily-quote batch per tick, retry and purge
/// passes on the reconcile cadence.
pub struct DailyQuoteJob {
    runner: Arc<BatchRunner>,
}

impl DailyQuoteJob {
    pub fn new(runner: Arc<BatchRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl TickJob for DailyQuoteJob {
    async fn run_tick(&self, now: DateTime<Utc>) {
        match self.runner.run_once(now).await {
            Ok(summary) => {
                if summary.sent > 0 || !summary.results.is_empty() {
                    info!(
                        total = summary.total_users,
                        sent = summary.sent,
                        "daily quote batch finished"
                    );
                }
            }
            // A store outage aborts this tick only; the next one
            // retries from scratch.
            Err(e) => error!("daily quote batch aborted: {e}"),
        }
    }

    async fn run_reconcile(&self, now: DateTime<Utc>) {
        match self.runner.retry_failed(now).await {
            Ok(summary) if summary.retried > 0 => {
                info!(
                    retried = summary.retried,
                    succeeded = summary.succeeded,
                    "failed notification retry pass finished"
                );
            }
            Ok(_) => {}
            Err(e) => error!("retry pass failed: {e}"),
        }
        if let Err(e) = self.runner.purge_expired(now) {
            error!("expired notification purge failed: {e}");
        }
    }
}
