//! `gitavani-corpus` — the fixed Bhagavad Gita index and the sequential
//! reading cursor.
//!
//! # Overview
//!
//! The Gita has 18 chapters with a known verse count each; that table is
//! compiled in and never changes. On top of it sit two things:
//!
//! - a small embedded set of verses with authentic Sanskrit text, used
//!   to serve quotes without a provider round-trip and as the fallback
//!   when the provider fails, and
//! - the [`cursor`] module: a pure advance/reset state machine over a
//!   user's persisted `(chapter, verse)` reading position, wrapping from
//!   chapter 18 back to chapter 1 indefinitely.
//!
//! Persistence of the cursor belongs to `gitavani-users`; nothing in
//! this crate touches a database.

pub mod chapters;
pub mod cursor;
pub mod verses;

pub use chapters::{verse_count, VerseRef, CHAPTER_COUNT};
pub use cursor::{Advanced, ReadingProgress};
pub use verses::{fallback_verse, random_seed_verse, CorpusVerse};
