//! Nominal end boundaries and duplicate pruning.
//!
//! The external indexer reports only where a definition starts. Before spans can
//! be resolved each symbol gets a nominal end (the line before the next symbol in
//! the same file) and duplicate records for the same name are collapsed so that
//! spans within one file never overlap.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::model::{Symbol, SymbolId};

/// Outcome of [`assign_nominal_ends`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundsReport {
    /// Symbols whose end was set.
    pub updated: usize,
    /// Records merged into the preceding record of the same name (struct tag + typedef).
    pub merged: Vec<SymbolId>,
}

/// Outcome of [`prune_duplicates`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupReport {
    pub removed: Vec<SymbolId>,
    /// Same-name pairs no rule could decide between. Left in place.
    pub unhandled: Vec<(SymbolId, SymbolId)>,
}

/// Set each symbol's end to the line before the next symbol in the same file,
/// walking in id order. Consecutive records that share a name are merged: the
/// first one's end becomes the second one's start and the second is removed.
/// Every later record of a longer run is removed as well.
/// The last symbol of every file keeps an open end.
pub fn assign_nominal_ends(symbols: &mut Vec<Symbol>) -> BoundsReport {
    symbols.sort_by_key(|s| s.id);
    let mut report = BoundsReport::default();
    let mut merged = BTreeSet::new();

    for i in 0..symbols.len().saturating_sub(1) {
        let (current, next) = (&symbols[i], &symbols[i + 1]);
        if current.file_path != next.file_path {
            continue;
        }
        // A merged record still passes its name on, so a whole run of same-name
        // records collapses into the first one.
        let current_merged = merged.contains(&current.id);
        let end = if current.name == next.name {
            tracing::debug!(
                "Merging {} in {} (lines {}-{})",
                current.name,
                current.file_path.display(),
                current.start_line,
                next.start_line
            );
            merged.insert(next.id);
            next.start_line
        } else {
            next.start_line.saturating_sub(1)
        };
        if !current_merged {
            symbols[i].end_line = end;
            report.updated += 1;
        }
    }

    symbols.retain(|s| !merged.contains(&s.id));
    report.merged = merged.into_iter().collect();
    report
}

/// Close the open end of each file's last symbol with the file's line count.
///
/// `line_count` returns `None` for files that cannot be read; those stay open.
/// Returns how many symbols were closed.
pub fn close_open_ends<F>(symbols: &mut [Symbol], mut line_count: F) -> usize
where
    F: FnMut(&Path) -> Option<u32>,
{
    let mut last_by_file: HashMap<PathBuf, usize> = HashMap::new();
    for (idx, symbol) in symbols.iter().enumerate() {
        let slot = last_by_file.entry(symbol.file_path.clone()).or_insert(idx);
        if symbols[*slot].start_line < symbol.start_line {
            *slot = idx;
        }
    }

    let mut closed = 0;
    for idx in last_by_file.into_values() {
        let symbol = &mut symbols[idx];
        if !symbol.is_open() {
            continue;
        }
        match line_count(&symbol.file_path) {
            Some(count) if count > 0 => {
                symbol.end_line = count;
                closed += 1;
            }
            _ => tracing::warn!("Cannot close end of {}: file unreadable", symbol.file_path.display()),
        }
    }
    closed
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}

/// Collapse records that share a name. A header/source pair keeps the source
/// record (the header one is an extern declaration); two records in the same `.c`
/// file keep the later one (the earlier is a prototype). Anything else is
/// reported and left alone.
pub fn prune_duplicates(symbols: &mut Vec<Symbol>) -> DedupReport {
    let mut order: Vec<usize> = (0..symbols.len()).collect();
    order.sort_by(|&a, &b| {
        let (a, b) = (&symbols[a], &symbols[b]);
        (&a.name, &a.file_path, a.start_line).cmp(&(&b.name, &b.file_path, b.start_line))
    });

    let mut report = DedupReport::default();
    let mut removed = BTreeSet::new();

    for pair in order.windows(2) {
        let (current, next) = (&symbols[pair[0]], &symbols[pair[1]]);
        if current.name != next.name {
            continue;
        }
        let (ce, ne) = (extension(&current.file_path), extension(&next.file_path));
        let victim = match (ce, ne) {
            (Some("h"), Some("c")) => Some(current),
            (Some("c"), Some("h")) => Some(next),
            (Some("c"), Some("c")) if current.file_path == next.file_path => {
                // Sorted by start line, so `current` is the prototype.
                Some(current)
            }
            _ => None,
        };

        match victim {
            Some(symbol) => {
                tracing::debug!(
                    "Removing duplicate {} at {}:{}",
                    symbol.name,
                    symbol.file_path.display(),
                    symbol.start_line
                );
                removed.insert(symbol.id);
            }
            None => {
                tracing::warn!(
                    "Unhandled duplicate symbol {}: {} ({}) and {} ({})",
                    current.name,
                    current.id,
                    current.file_path.display(),
                    next.id,
                    next.file_path.display()
                );
                report.unhandled.push((current.id, next.id));
            }
        }
    }

    symbols.retain(|s| !removed.contains(&s.id));
    report.removed = removed.into_iter().collect();
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ends_follow_next_start_within_file() {
        let mut symbols = vec![
            Symbol::new(1, "a", "x.c", 3),
            Symbol::new(2, "b", "x.c", 10),
            Symbol::new(3, "c", "x.c", 20),
            Symbol::new(4, "d", "y.c", 1),
        ];
        let report = assign_nominal_ends(&mut symbols);
        assert_eq!(report.updated, 2);
        let ends: Vec<u32> = symbols.iter().map(|s| s.end_line).collect();
        assert_eq!(ends, vec![9, 19, 0, 0]);
    }

    #[test]
    fn same_name_records_merge() {
        let mut symbols = vec![
            Symbol::new(1, "node", "list.h", 4),
            Symbol::new(2, "node", "list.h", 8),
            Symbol::new(3, "push", "list.h", 12),
        ];
        let report = assign_nominal_ends(&mut symbols);
        assert_eq!(report.merged, vec![SymbolId(2)]);
        assert_eq!(symbols.len(), 2);
        assert_eq!(symbols[0].end_line, 8);
        assert_eq!(symbols[1].id, SymbolId(3));
    }

    #[test]
    fn same_name_run_collapses_into_first_record() {
        let mut symbols = vec![
            Symbol::new(1, "cfg", "cfg.h", 3),
            Symbol::new(2, "cfg", "cfg.h", 7),
            Symbol::new(3, "cfg", "cfg.h", 9),
            Symbol::new(4, "load", "cfg.h", 15),
        ];
        let report = assign_nominal_ends(&mut symbols);
        assert_eq!(report.merged, vec![SymbolId(2), SymbolId(3)]);
        assert_eq!(report.updated, 1);
        let left: Vec<(i64, u32)> = symbols.iter().map(|s| (s.id.0, s.end_line)).collect();
        assert_eq!(left, vec![(1, 7), (4, 0)]);
    }

    #[test]
    fn close_last_symbol_per_file() {
        let mut symbols = vec![
            Symbol::new(1, "a", "x.c", 3),
            Symbol::new(2, "b", "x.c", 10),
            Symbol::new(3, "c", "missing.c", 1),
        ];
        symbols[0].end_line = 9;
        let closed = close_open_ends(&mut symbols, |p| (p == Path::new("x.c")).then_some(42));
        assert_eq!(closed, 1);
        assert_eq!(symbols[1].end_line, 42);
        assert!(symbols[2].is_open());
    }

    #[test]
    fn header_declaration_and_prototype_are_pruned() {
        let mut symbols = vec![
            Symbol::new(1, "init", "core.h", 5),
            Symbol::new(2, "init", "core.c", 40),
            Symbol::new(3, "helper", "util.c", 3),
            Symbol::new(4, "helper", "util.c", 30),
            Symbol::new(5, "shared", "a.c", 1),
            Symbol::new(6, "shared", "b.c", 1),
        ];
        let report = prune_duplicates(&mut symbols);
        assert_eq!(report.removed, vec![SymbolId(1), SymbolId(3)]);
        assert_eq!(report.unhandled, vec![(SymbolId(5), SymbolId(6))]);
        let left: Vec<i64> = symbols.iter().map(|s| s.id.0).collect();
        assert_eq!(left, vec![2, 4, 5, 6]);
    }
}
