use rusqlite::Connection;

use crate::error::Result;

/// Initialise the users schema in `conn`. Idempotent — safe to call on
/// every startup.
///
/// The notification profile and the reading cursor live as columns on
/// the user row: the batch query touches both on every tick and a
/// single-row read keeps the per-user update atomic under one
/// connection mutex.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id                  TEXT    NOT NULL PRIMARY KEY,
            name                TEXT    NOT NULL,
            email               TEXT    NOT NULL UNIQUE,
            is_active           INTEGER NOT NULL DEFAULT 1,
            last_login_at       TEXT,               -- ISO-8601 or NULL

            quotes_enabled      INTEGER NOT NULL DEFAULT 0,
            local_time          TEXT    NOT NULL DEFAULT '09:00',
            time_zone           TEXT    NOT NULL DEFAULT 'Asia/Kolkata',
            last_sent_at        TEXT,               -- ISO-8601 or NULL
            language            TEXT    NOT NULL DEFAULT 'english',
            strategy            TEXT    NOT NULL DEFAULT 'random',
            fcm_token           TEXT,

            current_chapter     INTEGER NOT NULL DEFAULT 1,
            current_verse       INTEGER NOT NULL DEFAULT 1,
            completed_chapters  TEXT    NOT NULL DEFAULT '[]',  -- JSON array
            total_read          INTEGER NOT NULL DEFAULT 0,
            progress_updated_at TEXT    NOT NULL,

            created_at          TEXT    NOT NULL,
            updated_at          TEXT    NOT NULL
        );

        -- The batch runner's hot query: enabled users with a token.
        CREATE INDEX IF NOT EXISTS idx_users_opted_in
            ON users (quotes_enabled, fcm_token);
        ",
    )?;
    Ok(())
}
