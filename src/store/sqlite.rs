use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, params};

use super::{PrimitiveStore, StoredPrimitive};

const DB_SCHEMA_VERSION: &str = "0.1.0";

/// Local fallback store with the same shape as the remote table.
pub struct SqliteStore {
    connection: Connection,
    location: String,
}

impl SqliteStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }

        let connection = Connection::open(db_path)
            .with_context(|| format!("failed to open {}", db_path.display()))?;
        connection
            .pragma_update(None, "journal_mode", "WAL")
            .context("failed to set journal_mode=WAL")?;

        Self::with_connection(connection, db_path.display().to_string())
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let connection =
            Connection::open_in_memory().context("failed to open in-memory database")?;
        Self::with_connection(connection, ":memory:".to_string())
    }

    fn with_connection(connection: Connection, location: String) -> Result<Self> {
        ensure_schema(&connection)?;
        Ok(Self {
            connection,
            location,
        })
    }
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS metadata (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS primitives (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              primitive TEXT NOT NULL,
              created_at TEXT NOT NULL
            );
            ",
        )
        .context("failed to initialize primitives schema")?;

    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [DB_SCHEMA_VERSION],
    )?;

    Ok(())
}

impl PrimitiveStore for SqliteStore {
    fn describe(&self) -> String {
        format!("sqlite:{}", self.location)
    }

    fn insert(&self, primitive: &str) -> Result<()> {
        self.connection
            .execute(
                "INSERT INTO primitives(primitive, created_at) VALUES(?1, ?2)",
                params![primitive, Utc::now()],
            )
            .context("failed to insert primitive")?;
        Ok(())
    }

    fn list(&self) -> Result<Vec<StoredPrimitive>> {
        let mut statement = self
            .connection
            .prepare("SELECT id, primitive FROM primitives ORDER BY id ASC")?;

        let rows = statement.query_map([], |row| {
            Ok(StoredPrimitive {
                id: row.get(0)?,
                primitive: row.get(1)?,
            })
        })?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to read primitives")
    }

    fn delete(&self, id: i64) -> Result<bool> {
        let removed = self
            .connection
            .execute("DELETE FROM primitives WHERE id = ?1", [id])
            .with_context(|| format!("failed to delete primitive {id}"))?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_list_delete_round_trip() {
        let store = SqliteStore::open_in_memory().expect("in-memory DB should open");

        store.insert("Residents must evacuate when ordered.").expect("insert");
        store.insert("Vendors may not raise prices.").expect("insert");

        let rows = store.list().expect("list");
        assert_eq!(rows.len(), 2);
        assert!(rows[0].id < rows[1].id);
        assert_eq!(rows[1].primitive, "Vendors may not raise prices.");

        assert!(store.delete(rows[0].id).expect("delete"));
        assert!(!store.delete(rows[0].id).expect("second delete"));

        let rows = store.list().expect("list after delete");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].primitive, "Vendors may not raise prices.");
    }

    #[test]
    fn schema_version_is_recorded() {
        let store = SqliteStore::open_in_memory().expect("in-memory DB should open");
        let version: String = store
            .connection
            .query_row(
                "SELECT value FROM metadata WHERE key = 'db_schema_version'",
                [],
                |row| row.get(0),
            )
            .expect("schema version row");
        assert_eq!(version, DB_SCHEMA_VERSION);
        assert_eq!(store.describe(), "sqlite::memory:");
    }
}
