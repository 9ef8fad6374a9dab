//! SQLite-backed persistence for rules and dispatch statistics.
//!
//! The engine reads and writes whole JSON documents by key — it never
//! owns table layout. `SqliteStore` is the durable implementation;
//! `MemoryStore` backs tests and ephemeral runs.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use rusqlite::OptionalExtension;
use serde_json::Value;
use tannoy_core::error::{Result, TannoyError};

/// Document key for the rule set.
pub const RULES_KEY: &str = "rules";
/// Document key for the stats snapshot.
pub const STATS_KEY: &str = "stats";

/// Key → JSON document store.
pub trait DocumentStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn set(&self, key: &str, value: &Value) -> Result<()>;
}

/// SQLite-backed document store.
pub struct SqliteStore {
    conn: Mutex<rusqlite::Connection>,
}

impl SqliteStore {
    /// Open or create the database at `path`, creating parent
    /// directories as needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let conn = rusqlite::Connection::open(path)
            .map_err(|e| TannoyError::Storage(format!("DB open: {e}")))?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS documents (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );",
        )
        .map_err(|e| TannoyError::Storage(format!("Migration: {e}")))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, rusqlite::Connection>> {
        self.conn
            .lock()
            .map_err(|_| TannoyError::Storage("store lock poisoned".into()))
    }
}

impl DocumentStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let conn = self.lock()?;
        let raw: Option<String> = conn
            .query_row("SELECT value FROM documents WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| TannoyError::Storage(format!("Get '{key}': {e}")))?;
        match raw {
            Some(text) => serde_json::from_str(&text)
                .map(Some)
                .map_err(|e| TannoyError::Storage(format!("Parse '{key}': {e}"))),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &Value) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO documents (key, value, updated_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![key, value.to_string(), chrono::Utc::now().to_rfc3339()],
        )
        .map_err(|e| TannoyError::Storage(format!("Set '{key}': {e}")))?;
        Ok(())
    }
}

/// In-memory store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let docs = self
            .docs
            .lock()
            .map_err(|_| TannoyError::Storage("store lock poisoned".into()))?;
        Ok(docs.get(key).cloned())
    }

    fn set(&self, key: &str, value: &Value) -> Result<()> {
        let mut docs = self
            .docs
            .lock()
            .map_err(|_| TannoyError::Storage("store lock poisoned".into()))?;
        docs.insert(key.to_string(), value.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("tannoy-test-{}-{name}.db", std::process::id()))
    }

    #[test]
    fn test_sqlite_roundtrip() {
        let path = temp_db_path("roundtrip");
        let _ = std::fs::remove_file(&path);

        let store = SqliteStore::open(&path).unwrap();
        assert!(store.get(RULES_KEY).unwrap().is_none());

        let doc = serde_json::json!([{"name": "rule-1"}, {"name": "rule-2"}]);
        store.set(RULES_KEY, &doc).unwrap();
        assert_eq!(store.get(RULES_KEY).unwrap().unwrap(), doc);

        // Overwrite wins.
        let doc2 = serde_json::json!([]);
        store.set(RULES_KEY, &doc2).unwrap();
        assert_eq!(store.get(RULES_KEY).unwrap().unwrap(), doc2);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_sqlite_survives_reopen() {
        let path = temp_db_path("reopen");
        let _ = std::fs::remove_file(&path);

        {
            let store = SqliteStore::open(&path).unwrap();
            store.set(STATS_KEY, &serde_json::json!({"rules": {}})).unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert!(store.get(STATS_KEY).unwrap().is_some());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert!(store.get("anything").unwrap().is_none());
        store.set("k", &serde_json::json!(42)).unwrap();
        assert_eq!(store.get("k").unwrap().unwrap(), serde_json::json!(42));
    }
}
