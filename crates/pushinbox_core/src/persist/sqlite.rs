//! SQLite-backed snapshot gateway.
//!
//! # Responsibility
//! - Persist the full notification sequence in one `notifications` table.
//! - Preserve newest-first store order through the `position` column.
//!
//! # Invariants
//! - `save` replaces the whole table inside one transaction.
//! - `load` rejects invalid persisted state instead of masking it.

use crate::db::{open_db, open_db_in_memory};
use crate::model::notification::{NotificationData, NotificationRecord};
use crate::persist::gateway::{PersistResult, PersistenceError, PersistenceGateway};
use rusqlite::{params, Connection, Row};
use serde_json::Value;
use std::path::Path;

const NOTIFICATION_SELECT_SQL: &str = "SELECT
    id,
    title,
    body,
    data,
    received_at,
    is_read
FROM notifications
ORDER BY position ASC";

/// Snapshot gateway owning one SQLite connection.
pub struct SqliteGateway {
    conn: Connection,
}

impl SqliteGateway {
    /// Opens (and migrates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> PersistResult<Self> {
        Ok(Self {
            conn: open_db(path)?,
        })
    }

    /// Opens a migrated in-memory database.
    pub fn open_in_memory() -> PersistResult<Self> {
        Ok(Self {
            conn: open_db_in_memory()?,
        })
    }

    /// Wraps an already migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }
}

impl PersistenceGateway for SqliteGateway {
    fn load(&mut self) -> PersistResult<Vec<NotificationRecord>> {
        let mut stmt = self.conn.prepare(NOTIFICATION_SELECT_SQL)?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();

        while let Some(row) = rows.next()? {
            records.push(parse_notification_row(row)?);
        }

        Ok(records)
    }

    fn save(&mut self, snapshot: &[NotificationRecord]) -> PersistResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM notifications;", [])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO notifications (
                    id,
                    position,
                    title,
                    body,
                    data,
                    received_at,
                    is_read
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            )?;

            for (position, record) in snapshot.iter().enumerate() {
                let data = record.data().map(serde_json::to_string).transpose()?;
                insert.execute(params![
                    record.id(),
                    position as i64,
                    record.title(),
                    record.body(),
                    data,
                    record.timestamp(),
                    bool_to_int(record.is_read()),
                ])?;
            }
        }
        tx.commit()?;

        Ok(())
    }
}

fn parse_notification_row(row: &Row<'_>) -> PersistResult<NotificationRecord> {
    let id: String = row.get("id")?;
    if id.trim().is_empty() {
        return Err(PersistenceError::InvalidData(
            "empty id in notifications.id".to_string(),
        ));
    }

    let data = match row.get::<_, Option<String>>("data")? {
        Some(text) => Some(parse_data_column(&id, &text)?),
        None => None,
    };

    let read = match row.get::<_, i64>("is_read")? {
        0 => false,
        1 => true,
        other => {
            return Err(PersistenceError::InvalidData(format!(
                "invalid is_read value `{other}` for notification `{id}`"
            )));
        }
    };

    Ok(NotificationRecord::restore(
        id,
        row.get::<_, String>("title")?,
        row.get::<_, String>("body")?,
        data,
        row.get::<_, String>("received_at")?,
        read,
    ))
}

fn parse_data_column(id: &str, text: &str) -> PersistResult<NotificationData> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        _ => Err(PersistenceError::InvalidData(format!(
            "data for notification `{id}` is not a JSON object"
        ))),
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
