//! Database module for `SQLite` storage (commit cache snapshots)

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::PathBuf;

use crate::cache::store::SnapshotStore;
use crate::error;
use crate::paths;

/// Database connection wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create the database at the default location
    pub fn open() -> Result<Self> {
        let path = Self::default_path()?;
        Self::open_path(&path)
    }

    /// Open or create the database at a specific path
    pub fn open_path(path: &PathBuf) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create data directory")?;
        }

        let conn = Connection::open(path).context("Failed to open database")?;

        let db = Self { conn };
        db.init()?;

        Ok(db)
    }

    /// Open a throwaway in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open database")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Get the default database path
    pub fn default_path() -> Result<PathBuf> {
        paths::database_path()
    }

    /// Initialize the database schema
    fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r"
            -- Commit cache snapshots, one row per repository
            CREATE TABLE IF NOT EXISTS cache_snapshots (
                scope TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            ",
        )?;

        Ok(())
    }

    // ==================== Snapshots ====================

    /// List stored snapshot keys with their last update time
    pub fn list_snapshots(&self) -> Result<Vec<(String, String)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT scope, updated_at FROM cache_snapshots ORDER BY scope")?;

        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete every snapshot
    pub fn clear_snapshots(&self) -> Result<usize> {
        let count = self.conn.execute("DELETE FROM cache_snapshots", params![])?;
        Ok(count)
    }
}

impl SnapshotStore for Database {
    fn read(&self, key: &str) -> error::Result<Option<String>> {
        let payload = self
            .conn
            .query_row(
                "SELECT payload FROM cache_snapshots WHERE scope = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(payload)
    }

    fn write(&self, key: &str, blob: &str) -> error::Result<()> {
        self.conn.execute(
            r"INSERT OR REPLACE INTO cache_snapshots (scope, payload, updated_at)
               VALUES (?1, ?2, ?3)",
            params![key, blob, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> error::Result<()> {
        self.conn.execute(
            "DELETE FROM cache_snapshots WHERE scope = ?1",
            params![key],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::RecencyCache;
    use crate::cache::store::{CachePersistence, snapshot_key};
    use tempfile::tempdir;

    #[test]
    fn test_database_init() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.sqlite");
        let _db = Database::open_path(&path).unwrap();
        // Should create without error
    }

    #[test]
    fn test_snapshot_crud() {
        let db = Database::open_in_memory().unwrap();

        assert_eq!(db.read("k").unwrap(), None);

        db.write("k", "[1]").unwrap();
        db.write("k", "[2]").unwrap();
        assert_eq!(db.read("k").unwrap().as_deref(), Some("[2]"));
        assert_eq!(db.list_snapshots().unwrap().len(), 1);

        db.remove("k").unwrap();
        assert_eq!(db.read("k").unwrap(), None);
        db.remove("k").unwrap();
    }

    #[test]
    fn test_snapshot_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.sqlite");

        {
            let persistence = CachePersistence::new(Database::open_path(&path).unwrap());
            let mut cache = RecencyCache::new(4).unwrap();
            cache.put("c1".to_string(), 1_u32);
            cache.put("c2".to_string(), 2_u32);
            persistence.save("me/pics", &cache);
        }

        let db = Database::open_path(&path).unwrap();
        assert!(db.read(&snapshot_key("me/pics")).unwrap().is_some());

        let persistence = CachePersistence::new(db);
        let restored: RecencyCache<String, u32> = persistence.restore("me/pics", 4).unwrap();
        let keys: Vec<&str> = restored.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["c1", "c2"]);
    }

    #[test]
    fn test_clear_snapshots() {
        let db = Database::open_in_memory().unwrap();
        db.write("a", "[]").unwrap();
        db.write("b", "[]").unwrap();
        assert_eq!(db.clear_snapshots().unwrap(), 2);
        assert!(db.list_snapshots().unwrap().is_empty());
    }
}
