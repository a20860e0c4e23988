//! Layer assignment by dependent-count frontier peeling.
//!
//! Symbols nothing in scope references form layer 0. Sealing a layer releases
//! one dependent from every symbol its members reference; symbols left with no
//! unsealed dependents form the next layer. Whatever never gets released (cycle
//! members and everything only reachable through a cycle) goes into one overflow
//! layer after the last real one.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::graph::ReferenceGraph;
use crate::model::SymbolId;

/// Result of one layering run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layering {
    /// Members of each layer, ascending id within a layer.
    layers: Vec<Vec<SymbolId>>,
    layer_of: BTreeMap<SymbolId, u32>,
    /// Index of the overflow layer, when there is one.
    overflow: Option<u32>,
    cyclic_components: usize,
}

/// Summary figures for logging and the planning report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayeringStats {
    pub layer_count: usize,
    pub overflow_size: usize,
    pub cyclic_components: usize,
}

impl Layering {
    pub fn layers(&self) -> &[Vec<SymbolId>] {
        &self.layers
    }

    pub fn layer_of(&self, id: SymbolId) -> Option<u32> {
        self.layer_of.get(&id).copied()
    }

    pub fn overflow_layer(&self) -> Option<u32> {
        self.overflow
    }

    /// Members of the overflow layer (empty when the graph was acyclic).
    pub fn overflow_members(&self) -> &[SymbolId] {
        self.overflow
            .and_then(|idx| self.layers.get(idx as usize))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Every `(symbol, layer)` pair, ascending by symbol id.
    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, u32)> + '_ {
        self.layer_of.iter().map(|(&id, &layer)| (id, layer))
    }

    pub fn stats(&self) -> LayeringStats {
        LayeringStats {
            layer_count: self.layers.len(),
            overflow_size: self.overflow_members().len(),
            cyclic_components: self.cyclic_components,
        }
    }
}

/// Peel the graph into layers. Runs in O(V + E) plus the SCC decomposition of
/// the overflow layer, which is only used for reporting.
pub fn assign_layers(graph: &ReferenceGraph) -> Layering {
    let mut remaining: BTreeMap<SymbolId, usize> = graph
        .nodes()
        .map(|id| (id, graph.dependent_count(id)))
        .collect();

    let mut frontier: Vec<SymbolId> = remaining
        .iter()
        .filter(|&(_, &count)| count == 0)
        .map(|(&id, _)| id)
        .collect();

    let mut layering = Layering::default();

    while !frontier.is_empty() {
        let layer = layering.layers.len() as u32;
        let mut next = Vec::new();

        for &member in &frontier {
            layering.layer_of.insert(member, layer);
            for dep in graph.dependencies(member) {
                let Some(count) = remaining.get_mut(&dep) else { continue };
                *count -= 1;
                if *count == 0 {
                    next.push(dep);
                }
            }
        }

        layering.layers.push(std::mem::take(&mut frontier));
        next.sort();
        frontier = next;
    }

    let residual: BTreeSet<SymbolId> = remaining
        .into_iter()
        .filter(|&(_, count)| count > 0)
        .map(|(id, _)| id)
        .collect();

    if !residual.is_empty() {
        let components = graph.cyclic_components(&residual);
        layering.cyclic_components = components.len();
        tracing::warn!(
            "Reference cycles left {} symbols unplaced ({} cyclic components); grouping them into the last layer",
            residual.len(),
            components.len()
        );

        let overflow = layering.layers.len() as u32;
        for &id in &residual {
            layering.layer_of.insert(id, overflow);
        }
        layering.overflow = Some(overflow);
        layering.layers.push(residual.into_iter().collect());
    }

    tracing::info!(
        "Assigned {} symbols to {} layers",
        layering.layer_of.len(),
        layering.layers.len()
    );
    layering
}
