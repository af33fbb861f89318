use rusqlite::Connection;

use crate::error::Result;

/// Initialise the notifications schema in `conn`. Idempotent.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS notifications (
            id                 TEXT    NOT NULL PRIMARY KEY,
            user_id            TEXT    NOT NULL,
            title              TEXT    NOT NULL,
            body               TEXT    NOT NULL,
            kind               TEXT    NOT NULL DEFAULT 'daily_quote',
            payload            TEXT    NOT NULL DEFAULT '{}',  -- JSON
            is_read            INTEGER NOT NULL DEFAULT 0,
            read_at            TEXT,
            delivery_status    TEXT    NOT NULL DEFAULT 'pending',
            error_message      TEXT,
            delivery_attempts  INTEGER NOT NULL DEFAULT 0,
            last_attempt_at    TEXT,
            priority           TEXT    NOT NULL DEFAULT 'normal',
            scheduled_for      TEXT,
            expires_at         TEXT    NOT NULL,
            created_at         TEXT    NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_notifications_user
            ON notifications (user_id, created_at);
        -- Reconciliation queries: failed-below-ceiling and purge-by-expiry.
        CREATE INDEX IF NOT EXISTS idx_notifications_status
            ON notifications (delivery_status, delivery_attempts);
        CREATE INDEX IF NOT EXISTS idx_notifications_expiry
            ON notifications (expires_at);
        ",
    )?;
    Ok(())
}
