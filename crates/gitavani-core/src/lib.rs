//! `gitavani-core` — shared configuration, error and domain types.
//!
//! Every other crate in the workspace depends on this one; it holds the
//! pieces that cross subsystem boundaries (which language a user reads
//! in, which quote strategy they follow, how the daily send window is
//! configured) and nothing else.

pub mod config;
pub mod error;
pub mod types;

pub use config::GitavaniConfig;
pub use error::{GitavaniError, Result};
pub use types::{Language, QuoteStrategy, SentDayRule};
