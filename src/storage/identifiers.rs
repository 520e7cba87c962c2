use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
    #[error("Failed to create store directory: {0}")]
    IoError(#[from] std::io::Error),
}

/// Calendar identifiers the user has compared before, used for suggestions.
pub struct IdentifierStore {
    conn: Connection,
}

impl IdentifierStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let store = Self::new(Connection::open(path)?);
        store.initialize()?;
        Ok(store)
    }

    pub fn initialize(&self) -> Result<(), StoreError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS identifiers (
                identifier TEXT PRIMARY KEY,
                use_count INTEGER NOT NULL DEFAULT 1,
                last_used TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Records a use of `identifier`. Blank identifiers are ignored.
    pub fn remember(&self, identifier: &str) -> Result<(), StoreError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Ok(());
        }

        self.conn.execute(
            "INSERT INTO identifiers (identifier, use_count, last_used) VALUES (?1, 1, ?2)
             ON CONFLICT(identifier) DO UPDATE SET use_count = use_count + 1, last_used = ?2",
            rusqlite::params![identifier, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// All identifiers, most recently used first.
    pub fn all(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT identifier FROM identifiers ORDER BY last_used DESC, identifier ASC",
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Identifiers containing `fragment`, ignoring case. An empty fragment
    /// suggests nothing.
    pub fn suggest(&self, fragment: &str) -> Result<Vec<String>, StoreError> {
        let needle = fragment.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .all()?
            .into_iter()
            .filter(|identifier| identifier.to_lowercase().contains(&needle))
            .collect())
    }

    pub fn use_count(&self, identifier: &str) -> Result<Option<u32>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT use_count FROM identifiers WHERE identifier = ?1",
                [identifier],
                |row| row.get(0),
            )
            .optional()?)
    }

    pub fn forget(&self, identifier: &str) -> Result<bool, StoreError> {
        let removed = self
            .conn
            .execute("DELETE FROM identifiers WHERE identifier = ?1", [identifier.trim()])?;
        Ok(removed > 0)
    }
}
