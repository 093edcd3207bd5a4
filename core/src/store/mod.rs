//! SQLite snapshot store.
//!
//! RULE: Only the store talks to the database. The engine reads snapshots
//! through SnapshotProvider and never executes SQL.

use crate::{
    error::{SlaError, SlaResult},
    event::{AlertLogEntry, AlertSink, SlaEvent},
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

mod work_item;

pub struct SlaStore {
    conn: Connection,
}

impl SlaStore {
    pub fn open(path: &str) -> SlaResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SlaResult<Self> {
        let conn = Connection::open(":memory:")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order. Safe to call repeatedly.
    pub fn migrate(&self) -> SlaResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_work_items.sql"))?;
        Ok(())
    }

    // ── Alert log ──────────────────────────────────────────────

    pub fn append_alert(&self, entry: &AlertLogEntry) -> SlaResult<()> {
        self.conn.execute(
            "INSERT INTO alert_log (detected_at, event_type, item_id, payload)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.detected_at.timestamp_millis(),
                entry.event_type,
                entry.item_id,
                entry.payload,
            ],
        )?;
        Ok(())
    }

    /// Alerts in insertion order, optionally for one item.
    pub fn alerts(&self, item_id: Option<&str>) -> SlaResult<Vec<AlertLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, detected_at, event_type, item_id, payload
             FROM alert_log WHERE ?1 IS NULL OR item_id = ?1
             ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map(params![item_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, detected_at, event_type, item_id, payload)| {
                Ok(AlertLogEntry {
                    id: Some(id),
                    detected_at: from_millis(detected_at, &item_id, "detected_at")?,
                    event_type,
                    item_id,
                    payload,
                })
            })
            .collect()
    }
}

impl AlertSink for SlaStore {
    fn deliver(&mut self, event: &SlaEvent) -> SlaResult<()> {
        self.append_alert(&AlertLogEntry::from_event(event)?)
    }
}

pub(crate) fn from_millis(
    millis: i64,
    item_id: &str,
    field: &'static str,
) -> SlaResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| SlaError::InvalidTimestamp {
        item_id: item_id.to_string(),
        field,
    })
}
