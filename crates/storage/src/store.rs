//! SQLite audit store implementation.

use crate::{AuditRecord, AuditSink, Error, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use std::path::Path;
use std::sync::Mutex;

/// SQLite-backed audit store.
///
/// A single connection guarded by a mutex; every append is one statement,
/// so concurrent writers never interleave partial records.
pub struct AuditStore {
    conn: Mutex<Connection>,
}

impl AuditStore {
    /// Open or create an audit store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Create an in-memory audit store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS function_calls (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ts_utc TEXT NOT NULL,
                function_name TEXT NOT NULL,
                arguments_json TEXT NOT NULL,
                result_json TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_function_calls_name
                ON function_calls(function_name, id);
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Load the most recent records, newest first.
    pub fn recent(&self, limit: usize, function_name: Option<&str>) -> Result<Vec<AuditRecord>> {
        let conn = self.conn.lock().map_err(|_| Error::Poisoned)?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let mut stmt = conn.prepare(
            "SELECT ts_utc, function_name, arguments_json, result_json FROM function_calls
             WHERE ?1 IS NULL OR function_name = ?1
             ORDER BY id DESC LIMIT ?2",
        )?;

        let rows = stmt
            .query_map(params![function_name, limit], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(ts, function_name, arguments, result)| {
                Ok(AuditRecord {
                    timestamp: parse_timestamp(&ts),
                    function_name,
                    arguments: serde_json::from_str(&arguments)?,
                    result: serde_json::from_str(&result)?,
                })
            })
            .collect()
    }

    /// Total number of records.
    pub fn count(&self) -> Result<u64> {
        let conn = self.conn.lock().map_err(|_| Error::Poisoned)?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM function_calls", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

impl AuditSink for AuditStore {
    fn append(&self, record: &AuditRecord) -> Result<()> {
        let arguments = record.arguments_json()?;
        let result = record.result_json()?;
        let conn = self.conn.lock().map_err(|_| Error::Poisoned)?;
        conn.execute(
            "INSERT INTO function_calls (ts_utc, function_name, arguments_json, result_json)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.timestamp.to_rfc3339(),
                record.function_name,
                arguments,
                result,
            ],
        )?;
        Ok(())
    }
}

// Rows written by other tools may carry odd timestamps; keep them readable.
fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn append_and_read_back() {
        let store = AuditStore::in_memory().unwrap();
        let record = AuditRecord::new(
            "convert_currency",
            json!({"amount": 500, "base": "inr", "target": "usd"}),
            json!({"converted": 6.0, "rate": 0.012}),
        );
        store.append(&record).unwrap();

        let loaded = store.recent(10, None).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].function_name, "convert_currency");
        assert_eq!(loaded[0].arguments, record.arguments);
        assert_eq!(loaded[0].result, record.result);
    }

    #[test]
    fn recent_is_newest_first_and_filterable() {
        let store = AuditStore::in_memory().unwrap();
        for name in ["get_weather_for_date", "get_news_for_city", "get_weather_for_date"] {
            store
                .append(&AuditRecord::new(name, json!({}), json!({})))
                .unwrap();
        }

        let all = store.recent(2, None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].function_name, "get_weather_for_date");
        assert_eq!(all[1].function_name, "get_news_for_city");

        let weather = store.recent(10, Some("get_weather_for_date")).unwrap();
        assert_eq!(weather.len(), 2);
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn concurrent_appends_are_not_lost() {
        let store = Arc::new(AuditStore::in_memory().unwrap());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for j in 0..25 {
                        store
                            .append(&AuditRecord::new(
                                "convert_currency",
                                json!({"worker": i, "seq": j}),
                                json!({"ok": true}),
                            ))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.count().unwrap(), 200);
    }
}
