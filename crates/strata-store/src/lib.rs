//! strata-store: SQLite persistence for symbols, references and planning results.
//!
//! Uses rusqlite with bundled SQLite and an embedded schema. A [`Store`] is an
//! explicit handle owned by one run; nothing here is global.

use std::path::Path;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

mod error;
mod plan;
mod references;
mod symbols;

#[cfg(test)]
mod tests;

pub use error::StoreError;
pub use references::ReferenceListing;

const SCHEMA: &str = include_str!("schema.sql");

const CLEAR_ALL: &str = "DELETE FROM clusters;
     DELETE FROM assignments;
     DELETE FROM symbol_references;
     DELETE FROM symbols;";

pub type Result<T> = std::result::Result<T, StoreError>;

/// SQLite-backed store.
pub struct Store {
    conn: Connection,
}

/// Row counts for `strata stats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub symbols: usize,
    pub unclassified: usize,
    pub references: usize,
    pub assigned: usize,
    pub layers: usize,
    pub clusters: usize,
    /// `(kind, count)` for classified symbols, by kind name.
    pub by_kind: Vec<(String, usize)>,
}

impl Store {
    /// Open (or create) a store at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        conn.execute_batch(SCHEMA)?;
        tracing::debug!("Opened store at {}", path.display());
        Ok(Self { conn })
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Delete every row from every table.
    pub fn clear(&self) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute_batch(CLEAR_ALL)?;
        tx.commit()?;
        Ok(())
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let count = |sql: &str| -> Result<usize> {
            let n: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
            Ok(n as usize)
        };

        let mut stmt = self
            .conn
            .prepare("SELECT kind, COUNT(*) FROM symbols WHERE kind IS NOT NULL GROUP BY kind ORDER BY kind")?;
        let by_kind = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(StoreStats {
            symbols: count("SELECT COUNT(*) FROM symbols")?,
            unclassified: count("SELECT COUNT(*) FROM symbols WHERE kind IS NULL")?,
            references: count("SELECT COUNT(*) FROM symbol_references")?,
            assigned: count("SELECT COUNT(*) FROM assignments")?,
            layers: count("SELECT COUNT(DISTINCT layer) FROM assignments")?,
            clusters: count("SELECT COUNT(*) FROM clusters")?,
            by_kind,
        })
    }
}
