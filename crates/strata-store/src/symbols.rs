//! Symbol rows: import, load, and span/kind write-back.

use rusqlite::{Connection, OptionalExtension, params};
use strata_core::{ReferenceEdge, Resolution, Symbol, SymbolId, SymbolKind};

use crate::references::insert_reference_rows;
use crate::{CLEAR_ALL, Result, Store, StoreError};

const SYMBOL_COLUMNS: &str = "id, name, file_path, start_line, end_line, kind";

/// Raw row, converted outside the rusqlite callback so kind parsing can fail
/// with a store error.
struct SymbolRow {
    id: i64,
    name: String,
    file_path: String,
    start_line: i64,
    end_line: i64,
    kind: Option<String>,
}

impl SymbolRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(SymbolRow {
            id: row.get(0)?,
            name: row.get(1)?,
            file_path: row.get(2)?,
            start_line: row.get(3)?,
            end_line: row.get(4)?,
            kind: row.get(5)?,
        })
    }

    fn into_symbol(self) -> Result<Symbol> {
        let kind = self
            .kind
            .map(|k| k.parse::<SymbolKind>().map_err(StoreError::InvalidKind))
            .transpose()?;
        Ok(Symbol {
            id: SymbolId(self.id),
            name: self.name,
            file_path: self.file_path.into(),
            start_line: self.start_line as u32,
            end_line: self.end_line as u32,
            kind,
        })
    }
}

pub(crate) fn insert_symbol_rows(conn: &Connection, symbols: &[Symbol]) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO symbols (id, name, file_path, start_line, end_line, kind)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for symbol in symbols {
        stmt.execute(params![
            symbol.id.0,
            symbol.name,
            symbol.file_path.to_string_lossy(),
            symbol.start_line,
            symbol.end_line,
            symbol.kind.map(SymbolKind::as_str),
        ])?;
    }
    Ok(())
}

impl Store {
    /// Insert symbol rows in one transaction. A duplicate id aborts the batch.
    pub fn insert_symbols(&self, symbols: &[Symbol]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        insert_symbol_rows(&tx, symbols)?;
        tx.commit()?;
        tracing::debug!("Inserted {} symbols", symbols.len());
        Ok(symbols.len())
    }

    /// Load a full set of symbol and reference rows in one transaction. With
    /// `replace`, every existing row is deleted first. Any failure leaves the
    /// store as it was.
    pub fn import(&self, symbols: &[Symbol], edges: &[ReferenceEdge], replace: bool) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        if replace {
            tx.execute_batch(CLEAR_ALL)?;
        }
        insert_symbol_rows(&tx, symbols)?;
        insert_reference_rows(&tx, edges)?;
        tx.commit()?;
        tracing::debug!(
            "Imported {} symbols, {} references (replace: {})",
            symbols.len(),
            edges.len(),
            replace
        );
        Ok(())
    }

    /// Every symbol, ascending by id.
    pub fn load_symbols(&self) -> Result<Vec<Symbol>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {SYMBOL_COLUMNS} FROM symbols ORDER BY id"))?;
        let rows = stmt
            .query_map([], SymbolRow::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().map(SymbolRow::into_symbol).collect()
    }

    pub fn get_symbol(&self, id: SymbolId) -> Result<Symbol> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {SYMBOL_COLUMNS} FROM symbols WHERE id = ?1"),
                params![id.0],
                SymbolRow::from_row,
            )
            .optional()?;
        row.ok_or_else(|| StoreError::NotFound(format!("symbol {id}")))?
            .into_symbol()
    }

    /// Symbols with the given name, ascending by id.
    pub fn find_symbols(&self, name: &str) -> Result<Vec<Symbol>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {SYMBOL_COLUMNS} FROM symbols WHERE name = ?1 ORDER BY id"))?;
        let rows = stmt
            .query_map(params![name], SymbolRow::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().map(SymbolRow::into_symbol).collect()
    }

    /// The lowest-id symbol in `path` whose span covers `line`. An open end
    /// (`0`) covers everything after the start.
    pub fn symbol_at(&self, path: &str, line: u32) -> Result<Option<Symbol>> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "SELECT {SYMBOL_COLUMNS} FROM symbols
                     WHERE file_path = ?1 AND start_line <= ?2 AND (end_line >= ?2 OR end_line = 0)
                     ORDER BY id LIMIT 1"
                ),
                params![path, line],
                SymbolRow::from_row,
            )
            .optional()?;
        row.map(SymbolRow::into_symbol).transpose()
    }

    /// Distinct names matching a SQL `LIKE` pattern, sorted.
    pub fn search(&self, pattern: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT name FROM symbols WHERE name LIKE ?1 ORDER BY name")?;
        let names = stmt
            .query_map(params![pattern], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(names)
    }

    /// Write resolved spans and kinds back. All or nothing.
    pub fn apply_resolutions(&self, resolutions: &[Resolution]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut updated = 0;
        {
            let mut stmt =
                tx.prepare("UPDATE symbols SET start_line = ?2, end_line = ?3, kind = ?4 WHERE id = ?1")?;
            for r in resolutions {
                updated += stmt.execute(params![r.id.0, r.start_line, r.end_line, r.kind.as_str()])?;
            }
        }
        tx.commit()?;
        tracing::info!("Stored {} resolved spans", updated);
        Ok(updated)
    }

    /// Store nominal bounds and delete merged or duplicate records, in one
    /// transaction.
    pub fn replace_symbols_bounds(&self, symbols: &[Symbol], removed: &[SymbolId]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut update = tx.prepare("UPDATE symbols SET start_line = ?2, end_line = ?3 WHERE id = ?1")?;
            for symbol in symbols {
                update.execute(params![symbol.id.0, symbol.start_line, symbol.end_line])?;
            }
            let mut delete = tx.prepare("DELETE FROM symbols WHERE id = ?1")?;
            for id in removed {
                delete.execute(params![id.0])?;
            }
        }
        tx.commit()?;
        tracing::info!(
            "Stored bounds for {} symbols, removed {}",
            symbols.len(),
            removed.len()
        );
        Ok(())
    }
}
