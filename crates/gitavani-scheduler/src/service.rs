use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use gitavani_core::config::SchedulerConfig;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::job::TickJob;

/// Reconcile (retry + purge) once per this many ticks. At the default
/// one-minute tick that is hourly.
const RECONCILE_EVERY_TICKS: u64 = 60;

/// Long-lived loop driver with start/stop lifecycle.
///
/// State machine: Stopped → Running (`start`, no-op when already
/// running) → Stopped (`stop`, idempotent). Within Running each tick is
/// Idle → Busy → Idle via the atomic busy flag; Busy ticks are dropped.
pub struct DailyQuoteScheduler {
    job: Arc<dyn TickJob>,
    config: SchedulerConfig,
    /// At most one batch in flight — the overlap guard.
    busy: Arc<AtomicBool>,
    /// Present while the loop task is alive.
    running: Mutex<Option<LoopHandle>>,
}

struct LoopHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl DailyQuoteScheduler {
    pub fn new(job: Arc<dyn TickJob>, config: SchedulerConfig) -> Self {
        Self {
            job,
            config,
            busy: Arc::new(AtomicBool::new(false)),
            running: Mutex::new(None),
        }
    }

    /// Start the tick loop. No-op when already running or when the
    /// scheduler is disabled by configuration (non-primary instances).
    pub fn start(&self) {
        if !self.config.enabled {
            info!("scheduler disabled by configuration; not starting");
            return;
        }

        let mut running = self.running.lock().unwrap();
        if running.is_some() {
            debug!("scheduler already running; start ignored");
            return;
        }

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let job = Arc::clone(&self.job);
        let busy = Arc::clone(&self.busy);
        let tick = Duration::from_secs(self.config.tick_secs.max(1));
        let deadline = Duration::from_secs(self.config.batch_deadline_secs.max(1));

        let task = tokio::spawn(async move {
            info!(tick_secs = tick.as_secs(), "scheduler loop started");
            let mut interval = tokio::time::interval(tick);
            // The first tick of tokio's interval fires immediately;
            // consume it so the loop waits one full period before the
            // first batch.
            interval.tick().await;
            let mut ticks: u64 = 0;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        ticks += 1;
                        try_tick(&job, &busy, deadline);
                        if ticks % RECONCILE_EVERY_TICKS == 0 {
                            let job = Arc::clone(&job);
                            tokio::spawn(async move {
                                job.run_reconcile(Utc::now()).await;
                            });
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            info!("scheduler loop shutting down");
                            break;
                        }
                    }
                }
            }
        });

        *running = Some(LoopHandle { shutdown_tx, task });
    }

    /// Cancel the tick loop. Idempotent; an in-flight batch is not
    /// cancelled — only future ticks are.
    pub fn stop(&self) {
        let handle = self.running.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.shutdown_tx.send(true);
            handle.task.abort();
            info!("scheduler stopped");
        } else {
            debug!("scheduler not running; stop ignored");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().unwrap().is_some()
    }

    /// Fire one guarded tick by hand. Returns false when the previous
    /// batch is still in flight and the tick was dropped.
    pub fn try_tick_now(&self) -> bool {
        let deadline = Duration::from_secs(self.config.batch_deadline_secs.max(1));
        try_tick(&self.job, &self.busy, deadline)
    }
}

impl Drop for DailyQuoteScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Run one batch behind the busy flag. Skipped (returns false) when a
/// pass is already in flight; otherwise the pass runs in its own task
/// with a hard deadline so a hung external call cannot hold the flag
/// forever.
fn try_tick(job: &Arc<dyn TickJob>, busy: &Arc<AtomicBool>, deadline: Duration) -> bool {
    if busy.swap(true, Ordering::SeqCst) {
        warn!("previous batch still running; tick skipped");
        return false;
    }

    let job = Arc::clone(job);
    let busy = Arc::clone(busy);
    tokio::spawn(async move {
        if tokio::time::timeout(deadline, job.run_tick(Utc::now()))
            .await
            .is_err()
        {
            error!(
                deadline_secs = deadline.as_secs(),
                "batch pass exceeded its deadline and was abandoned"
            );
        }
        busy.store(false, Ordering::SeqCst);
    });
    true
}
