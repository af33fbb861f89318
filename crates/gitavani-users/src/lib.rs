//! `gitavani-users` — SQLite-backed user store.
//!
//! Holds each user's notification profile (delivery time, zone,
//! language, strategy, device token, last-sent bookkeeping) and their
//! sequential reading progress. The daily-quote engine only reads users
//! and updates two things: `last_sent_at` (via a conditional update so
//! the once-per-day invariant survives racing runners) and the reading
//! cursor. Account lifecycle belongs to the surrounding application.

pub mod db;
pub mod error;
pub mod store;
pub mod types;

pub use error::{Result, UserError};
pub use store::UserStore;
pub use types::{NotificationProfile, PreferencesPatch, User};
