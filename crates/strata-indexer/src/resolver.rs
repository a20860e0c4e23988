//! Span and kind resolution over a source tree

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use strata_core::{Resolution, Symbol, resolve_symbol};

use crate::source::SourceFile;

/// Outcome of [`resolve_symbols`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveReport {
    pub resolved: Vec<Resolution>,
    /// Symbols whose file could not be read.
    pub skipped_missing: usize,
    /// Symbols whose start line is not in the file.
    pub skipped_out_of_range: usize,
}

impl ResolveReport {
    pub fn skipped(&self) -> usize {
        self.skipped_missing + self.skipped_out_of_range
    }
}

/// Resolve span and kind of every symbol, reading each file once. Files that
/// cannot be read are skipped with a warning; their symbols are left alone.
pub fn resolve_symbols(root: &Path, symbols: &[Symbol]) -> ResolveReport {
    let mut by_file: BTreeMap<&Path, Vec<&Symbol>> = BTreeMap::new();
    for symbol in symbols {
        by_file.entry(symbol.file_path.as_path()).or_default().push(symbol);
    }

    let mut report = ResolveReport::default();

    for (rel, group) in by_file {
        let file = match SourceFile::read(root, rel) {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!("Skipping {} symbols: {e:#}", group.len());
                report.skipped_missing += group.len();
                continue;
            }
        };

        for symbol in group {
            match resolve_symbol(file.lines(), symbol) {
                Some(resolution) => {
                    tracing::debug!(
                        "{} {}:{}-{} {}",
                        symbol.name,
                        rel.display(),
                        resolution.start_line,
                        resolution.end_line,
                        resolution.kind
                    );
                    report.resolved.push(resolution);
                }
                None => {
                    tracing::warn!(
                        "{} starts at line {} but {} has {} lines",
                        symbol.name,
                        symbol.start_line,
                        rel.display(),
                        file.line_count()
                    );
                    report.skipped_out_of_range += 1;
                }
            }
        }
    }

    tracing::info!(
        "Resolved {} symbols ({} skipped)",
        report.resolved.len(),
        report.skipped()
    );
    report
}

/// The symbol's stored span with a `Source: path:start-end` header line.
pub fn render_source(root: &Path, symbol: &Symbol) -> Result<String> {
    let file = SourceFile::read(root, &symbol.file_path)?;
    let count = file.line_count();
    let start = symbol.start_line as usize;
    if start == 0 || start > count {
        bail!(
            "{} starts at line {} but {} has {} lines",
            symbol.name,
            symbol.start_line,
            symbol.file_path.display(),
            count
        );
    }
    let end = if symbol.is_open() {
        count
    } else {
        (symbol.end_line as usize).clamp(start, count)
    };

    let mut out = format!("Source: {}:{}-{}\n", symbol.file_path.display(), start, end);
    for line in &file.lines()[start - 1..end] {
        out.push_str(line);
        out.push('\n');
    }
    Ok(out)
}
