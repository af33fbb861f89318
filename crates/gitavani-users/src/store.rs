use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use gitavani_corpus::{cursor, Advanced, ReadingProgress};
use rusqlite::Connection;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Result, UserError};
use crate::types::{NotificationProfile, PreferencesPatch, User};

/// Column order shared by every SELECT in this crate.
const USER_COLUMNS: &str = "id, name, email, is_active, last_login_at,
       quotes_enabled, local_time, time_zone, last_sent_at, language,
       strategy, fcm_token,
       current_chapter, current_verse, completed_chapters, total_read,
       progress_updated_at, created_at, updated_at";

/// SQLite-backed user store.
///
/// Thread-safe: the connection sits behind a Mutex, which also
/// serialises every per-user read-modify-write — two overlapping sends
/// for the same user cannot interleave a cursor update.
pub struct UserStore {
    db: Mutex<Connection>,
}

impl UserStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Mutex::new(conn),
        }
    }

    /// Insert a new user with quotes disabled and a fresh cursor.
    pub fn create_user(&self, name: &str, email: &str) -> Result<User> {
        let db = self.db.lock().unwrap();
        let now = Utc::now();
        let now_str = now.to_rfc3339();
        let id = Uuid::new_v4().to_string();

        db.execute(
            "INSERT INTO users
             (id, name, email, is_active, last_login_at,
              progress_updated_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, 1, ?4, ?4, ?4, ?4)",
            rusqlite::params![id, name, email, now_str],
        )?;
        info!(user_id = %id, "user created");

        get_user(&db, &id)?.ok_or_else(|| UserError::NotFound(id))
    }

    pub fn get(&self, id: &str) -> Result<Option<User>> {
        let db = self.db.lock().unwrap();
        get_user(&db, id)
    }

    /// All users the batch runner should consider: quotes enabled, a
    /// device token present, account active, and a login within the
    /// activity window.
    pub fn opted_in(&self, activity_window_days: i64, now: DateTime<Utc>) -> Result<Vec<User>> {
        let db = self.db.lock().unwrap();
        let threshold = (now - Duration::days(activity_window_days)).to_rfc3339();
        let mut stmt = db.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE quotes_enabled = 1
               AND fcm_token IS NOT NULL
               AND is_active = 1
               AND last_login_at IS NOT NULL
               AND last_login_at >= ?1
             ORDER BY created_at",
        ))?;
        let users = stmt
            .query_map([threshold], row_to_user)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(users)
    }

    /// Stamp a login — keeps the user inside the activity window.
    pub fn touch_login(&self, id: &str) -> Result<()> {
        let db = self.db.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        let n = db.execute(
            "UPDATE users SET last_login_at = ?1, updated_at = ?1 WHERE id = ?2",
            rusqlite::params![now, id],
        )?;
        if n == 0 {
            return Err(UserError::NotFound(id.to_string()));
        }
        Ok(())
    }

    /// Store or clear the user's device token.
    pub fn save_token(&self, id: &str, token: Option<&str>) -> Result<()> {
        let db = self.db.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        let n = db.execute(
            "UPDATE users SET fcm_token = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![token, now, id],
        )?;
        if n == 0 {
            return Err(UserError::NotFound(id.to_string()));
        }
        Ok(())
    }

    /// Apply a partial preference update; unset fields keep their value.
    pub fn update_preferences(&self, id: &str, patch: &PreferencesPatch) -> Result<User> {
        if let Some(ref t) = patch.local_time {
            validate_local_time(t)?;
        }

        let db = self.db.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        let n = db.execute(
            "UPDATE users SET
                quotes_enabled = COALESCE(?1, quotes_enabled),
                local_time     = COALESCE(?2, local_time),
                time_zone      = COALESCE(?3, time_zone),
                language       = COALESCE(?4, language),
                strategy       = COALESCE(?5, strategy),
                updated_at     = ?6
             WHERE id = ?7",
            rusqlite::params![
                patch.enabled.map(|b| b as i32),
                patch.local_time,
                patch.time_zone,
                patch.language.map(|l| l.to_string()),
                patch.strategy.map(|s| s.to_string()),
                now,
                id,
            ],
        )?;
        if n == 0 {
            return Err(UserError::NotFound(id.to_string()));
        }
        debug!(user_id = %id, "preferences updated");
        get_user(&db, id)?.ok_or_else(|| UserError::NotFound(id.to_string()))
    }

    /// Conditionally stamp `last_sent_at`.
    ///
    /// The guard is the once-per-day invariant: the row is only updated
    /// when no send has been recorded since `day_start`. Returns false
    /// when another runner won the race (or the user was already sent
    /// today) — the caller must then skip the dispatch.
    pub fn mark_sent(
        &self,
        id: &str,
        now: DateTime<Utc>,
        day_start: DateTime<Utc>,
    ) -> Result<bool> {
        let db = self.db.lock().unwrap();
        let n = db.execute(
            "UPDATE users SET last_sent_at = ?1, updated_at = ?1
             WHERE id = ?2
               AND (last_sent_at IS NULL OR last_sent_at < ?3)",
            rusqlite::params![now.to_rfc3339(), id, day_start.to_rfc3339()],
        )?;
        Ok(n > 0)
    }

    /// Roll back a `mark_sent` claim after a failed dispatch, restoring
    /// the previous value so the user stays eligible today. Conditional
    /// on the claim still being in place — a newer successful send is
    /// never overwritten.
    pub fn revert_sent(
        &self,
        id: &str,
        claimed: DateTime<Utc>,
        prior: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let db = self.db.lock().unwrap();
        db.execute(
            "UPDATE users SET last_sent_at = ?1
             WHERE id = ?2 AND last_sent_at = ?3",
            rusqlite::params![
                prior.map(|t| t.to_rfc3339()),
                id,
                claimed.to_rfc3339()
            ],
        )?;
        Ok(())
    }

    /// Advance the user's sequential cursor by one verse.
    ///
    /// The read, step and write happen under one lock so overlapping
    /// sends for the same user cannot corrupt the cursor.
    pub fn advance_progress(&self, id: &str, now: DateTime<Utc>) -> Result<Advanced> {
        let db = self.db.lock().unwrap();
        let user = get_user(&db, id)?.ok_or_else(|| UserError::NotFound(id.to_string()))?;
        let advanced = cursor::advance(&user.progress, now);
        write_progress(&db, id, &advanced.next)?;
        debug!(user_id = %id, presented = %advanced.presented, "cursor advanced");
        Ok(advanced)
    }

    /// Reinitialise the user's cursor. Driven by explicit user action
    /// from the HTTP surface, never by the engine.
    pub fn reset_progress(
        &self,
        id: &str,
        chapter: u32,
        verse: u32,
        now: DateTime<Utc>,
    ) -> Result<ReadingProgress> {
        let db = self.db.lock().unwrap();
        if get_user(&db, id)?.is_none() {
            return Err(UserError::NotFound(id.to_string()));
        }
        let fresh = cursor::reset(chapter, verse, now);
        write_progress(&db, id, &fresh)?;
        info!(user_id = %id, position = %fresh.position(), "cursor reset");
        Ok(fresh)
    }
}

fn get_user(db: &Connection, id: &str) -> Result<Option<User>> {
    let mut stmt = db.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))?;
    let mut rows = stmt.query_map([id], row_to_user)?;
    match rows.next() {
        Some(row) => Ok(Some(row?)),
        None => Ok(None),
    }
}

fn write_progress(db: &Connection, id: &str, progress: &ReadingProgress) -> Result<()> {
    let completed = serde_json::to_string(&progress.completed_chapters).unwrap_or_default();
    db.execute(
        "UPDATE users SET
            current_chapter = ?1, current_verse = ?2,
            completed_chapters = ?3, total_read = ?4,
            progress_updated_at = ?5, updated_at = ?5
         WHERE id = ?6",
        rusqlite::params![
            progress.current_chapter,
            progress.current_verse,
            completed,
            progress.total_read,
            progress.last_updated.to_rfc3339(),
            id,
        ],
    )?;
    Ok(())
}

fn validate_local_time(t: &str) -> Result<()> {
    let ok = t
        .split_once(':')
        .and_then(|(h, m)| Some((h.parse::<u32>().ok()?, m.parse::<u32>().ok()?)))
        .is_some_and(|(h, m)| h < 24 && m < 60);
    if ok {
        Ok(())
    } else {
        Err(UserError::InvalidPreference(format!(
            "local_time must be HH:MM, got {t:?}"
        )))
    }
}

/// Map a SELECT row (column order from USER_COLUMNS) to a User.
/// Centralised here so every query in this crate stays consistent.
fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    use std::str::FromStr;

    let completed: Vec<u32> =
        serde_json::from_str(&row.get::<_, String>(14)?).unwrap_or_default();
    let language = gitavani_core::Language::from_str(&row.get::<_, String>(9)?)
        .unwrap_or_default();
    let strategy = gitavani_core::QuoteStrategy::from_str(&row.get::<_, String>(10)?)
        .unwrap_or_default();

    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        is_active: row.get::<_, i32>(3)? != 0,
        last_login_at: parse_ts(row.get::<_, Option<String>>(4)?),
        profile: NotificationProfile {
            enabled: row.get::<_, i32>(5)? != 0,
            local_time: row.get(6)?,
            time_zone: row.get(7)?,
            last_sent_at: parse_ts(row.get::<_, Option<String>>(8)?),
            language,
            strategy,
            fcm_token: row.get(11)?,
        },
        progress: ReadingProgress {
            current_chapter: row.get(12)?,
            current_verse: row.get(13)?,
            completed_chapters: completed,
            total_read: row.get(15)?,
            last_updated: parse_ts(row.get::<_, Option<String>>(16)?).unwrap_or_default(),
        },
        created_at: row.get(17)?,
        updated_at: row.get(18)?,
    })
}

fn parse_ts(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}
