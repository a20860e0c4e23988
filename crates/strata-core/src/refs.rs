//! Hub filtering over raw reference rows.
//!
//! A handful of utility symbols (allocators, assert helpers, logging) are
//! referenced from nearly everywhere. Left in, they collect huge dependent
//! counts and sink to the last layers or drag cycles into the overflow layer.

use std::collections::{BTreeSet, HashMap};

use crate::model::{ReferenceEdge, SymbolId};

/// The `n` most referenced targets, counting every row. Ties go to the lower id.
pub fn top_referenced(edges: &[ReferenceEdge], n: usize) -> Vec<SymbolId> {
    if n == 0 {
        return Vec::new();
    }
    let mut counts: HashMap<SymbolId, usize> = HashMap::new();
    for edge in edges {
        *counts.entry(edge.to).or_default() += 1;
    }

    let mut ranked: Vec<(SymbolId, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.into_iter().take(n).map(|(id, _)| id).collect()
}

/// Rows whose target is not in `excluded`.
pub fn without_targets(edges: &[ReferenceEdge], excluded: &[SymbolId]) -> Vec<ReferenceEdge> {
    let excluded: BTreeSet<SymbolId> = excluded.iter().copied().collect();
    edges
        .iter()
        .filter(|edge| !excluded.contains(&edge.to))
        .copied()
        .collect()
}
