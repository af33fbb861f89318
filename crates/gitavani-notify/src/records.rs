use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{NotifyError, Result};
use crate::types::{DeliveryStatus, NotificationRecord, QuotePayload};

/// Column order shared by every SELECT in this crate.
const RECORD_COLUMNS: &str = "id, user_id, title, body, kind, payload, is_read, read_at,
       delivery_status, error_message, delivery_attempts, last_attempt_at,
       priority, scheduled_for, expires_at, created_at";

/// SQLite-backed store for notification records.
pub struct NotificationStore {
    db: Mutex<Connection>,
}

impl NotificationStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Mutex::new(conn),
        }
    }

    /// Persist a freshly built record with its initial status.
    pub fn insert(&self, record: &NotificationRecord) -> Result<()> {
        let db = self.db.lock().unwrap();
        let payload = serde_json::to_string(&record.payload).unwrap_or_else(|_| "{}".to_string());
        db.execute(
            "INSERT INTO notifications
             (id, user_id, title, body, kind, payload, is_read, read_at,
              delivery_status, error_message, delivery_attempts, last_attempt_at,
              priority, scheduled_for, expires_at, created_at)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16)",
            rusqlite::params![
                record.id,
                record.user_id,
                record.title,
                record.body,
                record.kind.to_string(),
                payload,
                record.is_read as i32,
                record.read_at.map(|t| t.to_rfc3339()),
                record.delivery_status.to_string(),
                record.error_message,
                record.delivery_attempts,
                record.last_attempt_at.map(|t| t.to_rfc3339()),
                record.priority.to_string(),
                record.scheduled_for.map(|t| t.to_rfc3339()),
                record.expires_at.to_rfc3339(),
                record.created_at.to_rfc3339(),
            ],
        )?;
        debug!(notification_id = %record.id, user_id = %record.user_id, "record inserted");
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<NotificationRecord>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM notifications WHERE id = ?1"
        ))?;
        let mut rows = stmt.query_map([id], row_to_record)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Recent records for one user, newest first.
    pub fn list_for_user(&self, user_id: &str, limit: usize) -> Result<Vec<NotificationRecord>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM notifications
             WHERE user_id = ?1 ORDER BY created_at DESC LIMIT ?2"
        ))?;
        let rows = stmt
            .query_map(rusqlite::params![user_id, limit], row_to_record)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    pub fn mark_read(&self, id: &str) -> Result<()> {
        let db = self.db.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        let n = db.execute(
            "UPDATE notifications SET is_read = 1, read_at = ?1 WHERE id = ?2",
            rusqlite::params![now, id],
        )?;
        if n == 0 {
            return Err(NotifyError::RecordNotFound { id: id.to_string() });
        }
        Ok(())
    }

    pub fn mark_all_read(&self, user_id: &str) -> Result<usize> {
        let db = self.db.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        let n = db.execute(
            "UPDATE notifications SET is_read = 1, read_at = ?1
             WHERE user_id = ?2 AND is_read = 0",
            rusqlite::params![now, user_id],
        )?;
        Ok(n)
    }

    /// Record the outcome of a (re-)delivery attempt. The attempt
    /// counter only ever moves up.
    pub fn record_attempt(
        &self,
        id: &str,
        success: bool,
        error: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let db = self.db.lock().unwrap();
        let status = if success {
            DeliveryStatus::Sent
        } else {
            DeliveryStatus::Failed
        };
        let n = db.execute(
            "UPDATE notifications SET
                delivery_status = ?1,
                error_message = ?2,
                delivery_attempts = delivery_attempts + 1,
                last_attempt_at = ?3
             WHERE id = ?4",
            rusqlite::params![status.to_string(), error, now.to_rfc3339(), id],
        )?;
        if n == 0 {
            return Err(NotifyError::RecordNotFound { id: id.to_string() });
        }
        Ok(())
    }

    /// Failed records still under the attempt ceiling, oldest attempt
    /// first — the reconciliation pass works through these.
    pub fn failed_below(&self, max_attempts: u32) -> Result<Vec<NotificationRecord>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM notifications
             WHERE delivery_status = 'failed' AND delivery_attempts < ?1
             ORDER BY last_attempt_at"
        ))?;
        let rows = stmt
            .query_map([max_attempts], row_to_record)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    /// Failed dispatches for one user since `since` — feeds the poison
    /// suppression check.
    pub fn failed_count_since(&self, user_id: &str, since: DateTime<Utc>) -> Result<u32> {
        let db = self.db.lock().unwrap();
        let n: u32 = db.query_row(
            "SELECT COUNT(*) FROM notifications
             WHERE user_id = ?1 AND delivery_status = 'failed' AND created_at >= ?2",
            rusqlite::params![user_id, since.to_rfc3339()],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    /// Delete records past their expiry, regardless of status.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let db = self.db.lock().unwrap();
        let n = db.execute(
            "DELETE FROM notifications WHERE expires_at <= ?1",
            [now.to_rfc3339()],
        )?;
        if n > 0 {
            info!(count = n, "expired notifications purged");
        }
        Ok(n)
    }
}

/// Map a SELECT row (column order from RECORD_COLUMNS) to a record.
fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<NotificationRecord> {
    use std::str::FromStr;

    let payload: QuotePayload =
        serde_json::from_str(&row.get::<_, String>(5)?).unwrap_or_default();
    let kind = crate::types::NotificationKind::from_str(&row.get::<_, String>(4)?)
        .unwrap_or_default();
    let status = DeliveryStatus::from_str(&row.get::<_, String>(8)?).unwrap_or_default();
    let priority =
        crate::types::Priority::from_str(&row.get::<_, String>(12)?).unwrap_or_default();

    Ok(NotificationRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        body: row.get(3)?,
        kind,
        payload,
        is_read: row.get::<_, i32>(6)? != 0,
        read_at: parse_ts(row.get::<_, Option<String>>(7)?),
        delivery_status: status,
        error_message: row.get(9)?,
        delivery_attempts: row.get(10)?,
        last_attempt_at: parse_ts(row.get::<_, Option<String>>(11)?),
        priority,
        scheduled_for: parse_ts(row.get::<_, Option<String>>(13)?),
        expires_at: parse_ts(row.get::<_, Option<String>>(14)?).unwrap_or_default(),
        created_at: parse_ts(row.get::<_, Option<String>>(15)?).unwrap_or_default(),
    })
}

fn parse_ts(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NotificationKind, Priority};
    use chrono::Duration;

    fn open_store() -> NotificationStore {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_db(&conn).unwrap();
        NotificationStore::new(conn)
    }

    fn record(id: &str, user: &str, status: DeliveryStatus, attempts: u32) -> NotificationRecord {
        let now = Utc::now();
        NotificationRecord {
            id: id.to_string(),
            user_id: user.to_string(),
            title: "t".to_string(),
            body: "b".to_string(),
            kind: NotificationKind::DailyQuote,
            payload: QuotePayload::default(),
            is_read: false,
            read_at: None,
            delivery_status: status,
            error_message: None,
            delivery_attempts: attempts,
            last_attempt_at: Some(now),
            priority: Priority::Normal,
            scheduled_for: None,
            expires_at: now + Duration::days(30),
            created_at: now,
        }
    }

    #[test]
    fn insert_and_get_round_trip() {
        let store = open_store();
        store
            .insert(&record("n1", "u1", DeliveryStatus::Sent, 1))
            .unwrap();
        let got = store.get("n1").unwrap().unwrap();
        assert_eq!(got.user_id, "u1");
        assert_eq!(got.delivery_status, DeliveryStatus::Sent);
        assert_eq!(got.delivery_attempts, 1);
    }

    #[test]
    fn record_attempt_increments_and_flips_status() {
        let store = open_store();
        store
            .insert(&record("n1", "u1", DeliveryStatus::Failed, 1))
            .unwrap();

        store
            .record_attempt("n1", false, Some("token expired"), Utc::now())
            .unwrap();
        let got = store.get("n1").unwrap().unwrap();
        assert_eq!(got.delivery_attempts, 2);
        assert_eq!(got.error_message.as_deref(), Some("token expired"));

        store.record_attempt("n1", true, None, Utc::now()).unwrap();
        let got = store.get("n1").unwrap().unwrap();
        assert_eq!(got.delivery_status, DeliveryStatus::Sent);
        assert_eq!(got.delivery_attempts, 3);
    }

    #[test]
    fn failed_below_respects_the_ceiling() {
        let store = open_store();
        store
            .insert(&record("n1", "u1", DeliveryStatus::Failed, 1))
            .unwrap();
        store
            .insert(&record("n2", "u1", DeliveryStatus::Failed, 3))
            .unwrap();
        store
            .insert(&record("n3", "u2", DeliveryStatus::Sent, 1))
            .unwrap();

        let retryable = store.failed_below(3).unwrap();
        assert_eq!(retryable.len(), 1);
        assert_eq!(retryable[0].id, "n1");
    }

    #[test]
    fn failed_count_since_windows_by_creation() {
        let store = open_store();
        let now = Utc::now();
        store
            .insert(&record("n1", "u1", DeliveryStatus::Failed, 1))
            .unwrap();
        store
            .insert(&record("n2", "u1", DeliveryStatus::Failed, 1))
            .unwrap();
        assert_eq!(
            store
                .failed_count_since("u1", now - Duration::hours(1))
                .unwrap(),
            2
        );
        assert_eq!(
            store
                .failed_count_since("u1", now + Duration::hours(1))
                .unwrap(),
            0
        );
    }

    #[test]
    fn purge_expired_deletes_regardless_of_status() {
        let store = open_store();
        let mut expired = record("n1", "u1", DeliveryStatus::Sent, 1);
        expired.expires_at = Utc::now() - Duration::days(1);
        store.insert(&expired).unwrap();
        store
            .insert(&record("n2", "u1", DeliveryStatus::Failed, 1))
            .unwrap();

        assert_eq!(store.purge_expired(Utc::now()).unwrap(), 1);
        assert!(store.get("n1").unwrap().is_none());
        assert!(store.get("n2").unwrap().is_some());
    }

    #[test]
    fn mark_read_sets_timestamp() {
        let store = open_store();
        store
            .insert(&record("n1", "u1", DeliveryStatus::Sent, 1))
            .unwrap();
        store.mark_read("n1").unwrap();
        let got = store.get("n1").unwrap().unwrap();
        assert!(got.is_read);
        assert!(got.read_at.is_some());

        assert!(matches!(
            store.mark_read("missing").unwrap_err(),
            NotifyError::RecordNotFound { .. }
        ));
    }
}
