//! `gitavani-scheduler` — the fixed-cadence driver for the daily-quote
//! engine.
//!
//! # Overview
//!
//! [`DailyQuoteScheduler`] owns explicit loop state (no process-wide
//! globals): `start()` spawns a tokio task ticking at the configured
//! interval, `stop()` cancels it; both are idempotent. Each tick tries
//! to run one batch pass behind an atomic busy flag — a tick that fires
//! while the previous pass is still running is **skipped**, never
//! queued, so at most one batch is in flight. A per-pass deadline keeps
//! a hung external call from wedging the flag forever.
//!
//! On non-primary deployment instances the loop is disabled entirely
//! via `scheduler.enabled = false`.

pub mod job;
pub mod service;

pub use job::{DailyQuoteJob, TickJob};
pub use service::DailyQuoteScheduler;
