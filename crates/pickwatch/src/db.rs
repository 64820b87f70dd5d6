// SQLite persistence for draft plans and pick queues.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

/// SQLite-backed key/value store. Values are JSON documents.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure the schema
    /// exists. Pass `":memory:"` for an ephemeral in-memory database.
    pub fn open(path: &str) -> Result<Self> {
        if path != ":memory:" {
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("failed to create database directory {}", parent.display())
                    })?;
                }
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS draft_state (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Panics if the mutex is poisoned.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    /// Persist a JSON value under `key`, replacing any previous value.
    pub fn save_state(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let conn = self.conn();
        let json_str =
            serde_json::to_string(value).context("failed to serialize state value")?;
        conn.execute(
            "INSERT OR REPLACE INTO draft_state (key, value) VALUES (?1, ?2)",
            params![key, json_str],
        )
        .context("failed to save state")?;
        Ok(())
    }

    /// Load a previously saved JSON value. `None` if the key does not exist.
    pub fn load_state(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT value FROM draft_state WHERE key = ?1")
            .context("failed to prepare load_state query")?;

        let mut rows = stmt
            .query_map(params![key], |row| row.get::<_, String>(0))
            .context("failed to query draft state")?;

        match rows.next() {
            Some(row_result) => {
                let json_str = row_result.context("failed to read state row")?;
                let value: serde_json::Value = serde_json::from_str(&json_str)
                    .context("failed to deserialize state value")?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Remove one key. Returns whether a row was deleted.
    pub fn delete_state(&self, key: &str) -> Result<bool> {
        let conn = self.conn();
        let n = conn
            .execute("DELETE FROM draft_state WHERE key = ?1", params![key])
            .context("failed to delete state")?;
        Ok(n > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mem() -> Database {
        Database::open(":memory:").unwrap()
    }

    #[test]
    fn save_and_load_roundtrip() {
        let db = mem();
        db.save_state("plan:1", &json!({"rounds": {}})).unwrap();
        assert_eq!(db.load_state("plan:1").unwrap(), Some(json!({"rounds": {}})));
        assert_eq!(db.load_state("plan:2").unwrap(), None);
    }

    #[test]
    fn save_overwrites() {
        let db = mem();
        db.save_state("queue:1", &json!([1])).unwrap();
        db.save_state("queue:1", &json!([1, 2])).unwrap();
        assert_eq!(db.load_state("queue:1").unwrap(), Some(json!([1, 2])));
    }

    #[test]
    fn delete_removes_only_named_key() {
        let db = mem();
        db.save_state("plan:a", &json!(1)).unwrap();
        db.save_state("queue:a", &json!(3)).unwrap();
        assert!(db.delete_state("plan:a").unwrap());
        assert!(!db.delete_state("plan:a").unwrap());
        assert_eq!(db.load_state("plan:a").unwrap(), None);
        assert_eq!(db.load_state("queue:a").unwrap(), Some(json!(3)));
    }

    #[test]
    fn file_backed_database_persists() {
        let dir = std::env::temp_dir().join(format!(
            "pickwatch-db-{}-{}",
            std::process::id(),
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0)
        ));
        let path = dir.join("nested").join("state.db");
        let path_str = path.to_str().unwrap();
        {
            let db = Database::open(path_str).unwrap();
            db.save_state("queue:x", &json!(["p1"])).unwrap();
        }
        let db = Database::open(path_str).unwrap();
        assert_eq!(db.load_state("queue:x").unwrap(), Some(json!(["p1"])));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
