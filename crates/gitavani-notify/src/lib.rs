//! `gitavani-notify` — the daily-quote delivery engine.
//!
//! # Overview
//!
//! One batch tick walks every opted-in user and, for each, answers
//! three questions in order:
//!
//! 1. **Due now?** — [`eligibility`] converts the tick instant into the
//!    user's zone and checks the ±window around their delivery time,
//!    plus the once-per-day guard.
//! 2. **What to say?** — the quote service (see `gitavani-quotes`),
//!    with the sequential cursor advanced after a successful
//!    generation.
//! 3. **Did it land?** — [`dispatcher`] hands the message to the push
//!    gateway and records the outcome on a notification record.
//!
//! Per-user failures never abort the batch; only a failure of the
//! opted-in query itself aborts a tick (the next tick retries). Pacing
//! between dispatches keeps the gateway rate-limit happy.

pub mod batch;
pub mod db;
pub mod dispatcher;
pub mod eligibility;
pub mod error;
pub mod gateway;
pub mod records;
pub mod types;

pub use batch::BatchRunner;
pub use dispatcher::Dispatcher;
pub use error::{NotifyError, Result};
pub use gateway::{FcmGateway, PushError, PushGateway, PushMessage};
pub use records::NotificationStore;
pub use types::{BatchSummary, DeliveryStatus, NotificationRecord, OutcomeKind, UserOutcome};
