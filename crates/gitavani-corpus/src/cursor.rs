//! Sequential reading cursor.
//!
//! The cursor presents the verse the user is currently *at*, then moves
//! to the next position for the following day. Wrapping past chapter 18
//! starts a new reading cycle at 1.1 without discarding history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chapters::{verse_count, VerseRef, CHAPTER_COUNT};

/// A user's persisted position in their linear read-through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingProgress {
    pub current_chapter: u32,
    pub current_verse: u32,
    /// Chapters finished at least once. Never cleared by advancing, so
    /// re-reading cycles keep their history.
    pub completed_chapters: Vec<u32>,
    /// Total verses presented over the lifetime of the cursor.
    pub total_read: u64,
    pub last_updated: DateTime<Utc>,
}

impl ReadingProgress {
    /// A fresh cursor at chapter 1, verse 1.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            current_chapter: 1,
            current_verse: 1,
            completed_chapters: Vec::new(),
            total_read: 0,
            last_updated: now,
        }
    }

    pub fn position(&self) -> VerseRef {
        VerseRef::new(self.current_chapter, self.current_verse)
    }
}

/// Result of one cursor step.
#[derive(Debug, Clone)]
pub struct Advanced {
    /// The verse to present — the position *before* the step.
    pub presented: VerseRef,
    /// The state to persist for next time.
    pub next: ReadingProgress,
}

/// Advance the cursor by one verse.
///
/// The presented verse is the pre-advance position. When the step runs
/// past the end of a chapter, the chapter joins `completed_chapters`
/// (exactly once, even if the same pre-state is advanced twice) and the
/// cursor moves to verse 1 of the next chapter; past chapter 18 it wraps
/// to 1.1. `total_read` counts the presented verse; `last_updated` is
/// stamped with `now`.
pub fn advance(progress: &ReadingProgress, now: DateTime<Utc>) -> Advanced {
    let presented = clamp_position(progress);

    let mut next = progress.clone();
    next.current_chapter = presented.chapter;
    next.current_verse = presented.verse + 1;

    let count = verse_count(presented.chapter).unwrap_or(1);
    if next.current_verse > count {
        if !next.completed_chapters.contains(&presented.chapter) {
            next.completed_chapters.push(presented.chapter);
        }
        next.current_verse = 1;
        next.current_chapter = presented.chapter + 1;
        if next.current_chapter > CHAPTER_COUNT {
            next.current_chapter = 1;
        }
    }

    next.total_read = progress.total_read + 1;
    next.last_updated = now;

    Advanced { presented, next }
}

/// Reinitialise the cursor at an explicit position, clearing history.
///
/// Only driven by a direct user action; the engine itself never resets.
/// Out-of-range positions fall back to 1.1.
pub fn reset(chapter: u32, verse: u32, now: DateTime<Utc>) -> ReadingProgress {
    let target = VerseRef::new(chapter, verse);
    let target = if target.is_valid() {
        target
    } else {
        VerseRef::new(1, 1)
    };
    ReadingProgress {
        current_chapter: target.chapter,
        current_verse: target.verse,
        completed_chapters: Vec::new(),
        total_read: 0,
        last_updated: now,
    }
}

/// Repair an out-of-range stored position to the nearest valid one.
/// Stored state can only go bad through external edits; the advance
/// path never produces an invalid position.
fn clamp_position(progress: &ReadingProgress) -> VerseRef {
    let pos = progress.position();
    if pos.is_valid() {
        return pos;
    }
    let chapter = pos.chapter.clamp(1, CHAPTER_COUNT);
    let verse = pos.verse.clamp(1, verse_count(chapter).unwrap_or(1));
    VerseRef::new(chapter, verse)
}
