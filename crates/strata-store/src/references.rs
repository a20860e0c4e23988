//! Reference rows and per-symbol listings.

use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use strata_core::{ReferenceEdge, SymbolId};

use crate::{Result, Store};

/// One side of a reference, as shown by `strata show`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceListing {
    /// The symbol on the other end.
    pub symbol_id: SymbolId,
    pub name: String,
    pub file_path: String,
    /// Line in the referencing symbol's file.
    pub line: u32,
}

fn listing(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReferenceListing> {
    Ok(ReferenceListing {
        symbol_id: SymbolId(row.get(0)?),
        name: row.get(1)?,
        file_path: row.get(2)?,
        line: row.get(3)?,
    })
}

pub(crate) fn insert_reference_rows(conn: &Connection, edges: &[ReferenceEdge]) -> rusqlite::Result<()> {
    let mut stmt =
        conn.prepare("INSERT INTO symbol_references (from_id, to_id, line_in_from) VALUES (?1, ?2, ?3)")?;
    for edge in edges {
        stmt.execute(params![edge.from.0, edge.to.0, edge.line])?;
    }
    Ok(())
}

impl Store {
    pub fn insert_references(&self, edges: &[ReferenceEdge]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        insert_reference_rows(&tx, edges)?;
        tx.commit()?;
        tracing::debug!("Inserted {} references", edges.len());
        Ok(edges.len())
    }

    pub fn load_references(&self) -> Result<Vec<ReferenceEdge>> {
        let mut stmt = self
            .conn
            .prepare("SELECT from_id, to_id, line_in_from FROM symbol_references ORDER BY from_id, line_in_from, to_id")?;
        let edges = stmt
            .query_map([], |row| {
                Ok(ReferenceEdge {
                    from: SymbolId(row.get(0)?),
                    to: SymbolId(row.get(1)?),
                    line: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(edges)
    }

    /// What `id` references, by line.
    pub fn references_from(&self, id: SymbolId) -> Result<Vec<ReferenceListing>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.id, s.name, s.file_path, r.line_in_from
             FROM symbol_references r JOIN symbols s ON s.id = r.to_id
             WHERE r.from_id = ?1
             ORDER BY r.line_in_from, s.id",
        )?;
        let rows = stmt
            .query_map(params![id.0], listing)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// What references `id`, by file then line.
    pub fn references_to(&self, id: SymbolId) -> Result<Vec<ReferenceListing>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.id, s.name, s.file_path, r.line_in_from
             FROM symbol_references r JOIN symbols s ON s.id = r.from_id
             WHERE r.to_id = ?1
             ORDER BY s.file_path, r.line_in_from, s.id",
        )?;
        let rows = stmt
            .query_map(params![id.0], listing)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
