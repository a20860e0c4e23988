//! Reference graph restricted to the in-scope symbol set.
//!
//! Edges point from the referencing symbol to the referenced one. Parallel edges
//! (several call sites) collapse into one adjacency entry; self-loops are kept.

use std::collections::{BTreeMap, BTreeSet};

use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;

use crate::model::{ReferenceEdge, SymbolId};

/// Forward and reverse adjacency over in-scope symbols.
#[derive(Default)]
pub struct ReferenceGraph {
    nodes: BTreeSet<SymbolId>,
    /// `adj[v]`: symbols `v` references.
    adj: BTreeMap<SymbolId, BTreeSet<SymbolId>>,
    /// `rev[v]`: symbols referencing `v`.
    rev: BTreeMap<SymbolId, BTreeSet<SymbolId>>,
    dropped_edges: usize,
}

impl std::fmt::Debug for ReferenceGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceGraph")
            .field("node_count", &self.node_count())
            .field("edge_count", &self.edge_count())
            .field("dropped_edges", &self.dropped_edges)
            .finish()
    }
}

impl ReferenceGraph {
    /// Build adjacency from raw reference rows, dropping every edge with an
    /// endpoint outside `scope`.
    pub fn build<I>(scope: I, edges: &[ReferenceEdge]) -> Self
    where
        I: IntoIterator<Item = SymbolId>,
    {
        let mut graph = ReferenceGraph {
            nodes: scope.into_iter().collect(),
            ..Default::default()
        };

        for edge in edges {
            if !graph.nodes.contains(&edge.from) || !graph.nodes.contains(&edge.to) {
                graph.dropped_edges += 1;
                continue;
            }
            graph.adj.entry(edge.from).or_default().insert(edge.to);
            graph.rev.entry(edge.to).or_default().insert(edge.from);
        }

        tracing::debug!(
            "Built reference graph: {} symbols, {} edges, {} dropped",
            graph.node_count(),
            graph.edge_count(),
            graph.dropped_edges
        );
        graph
    }

    /// In-scope symbols, ascending.
    pub fn nodes(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.nodes.iter().copied()
    }

    pub fn contains(&self, id: SymbolId) -> bool {
        self.nodes.contains(&id)
    }

    /// Symbols `id` references, ascending.
    pub fn dependencies(&self, id: SymbolId) -> impl Iterator<Item = SymbolId> + '_ {
        self.adj.get(&id).into_iter().flatten().copied()
    }

    /// Symbols referencing `id`, ascending.
    pub fn dependents(&self, id: SymbolId) -> impl Iterator<Item = SymbolId> + '_ {
        self.rev.get(&id).into_iter().flatten().copied()
    }

    /// Number of distinct in-scope symbols referencing `id`.
    pub fn dependent_count(&self, id: SymbolId) -> usize {
        self.rev.get(&id).map_or(0, BTreeSet::len)
    }

    pub fn has_edge(&self, from: SymbolId, to: SymbolId) -> bool {
        self.adj.get(&from).is_some_and(|deps| deps.contains(&to))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Distinct (from, to) pairs.
    pub fn edge_count(&self) -> usize {
        self.adj.values().map(BTreeSet::len).sum()
    }

    /// Raw rows discarded because an endpoint was out of scope.
    pub fn dropped_edges(&self) -> usize {
        self.dropped_edges
    }

    /// Strongly connected components of the subgraph induced by `subset` that
    /// actually contain a cycle (more than one member, or a self-loop). Members
    /// and components are sorted ascending.
    pub fn cyclic_components(&self, subset: &BTreeSet<SymbolId>) -> Vec<Vec<SymbolId>> {
        let mut sub: DiGraphMap<SymbolId, ()> = DiGraphMap::new();
        for &id in subset {
            sub.add_node(id);
        }
        for &from in subset {
            for to in self.dependencies(from).filter(|to| subset.contains(to)) {
                sub.add_edge(from, to, ());
            }
        }

        let mut components: Vec<Vec<SymbolId>> = tarjan_scc(&sub)
            .into_iter()
            .filter(|c| c.len() > 1 || self.has_edge(c[0], c[0]))
            .map(|mut c| {
                c.sort();
                c
            })
            .collect();
        components.sort();
        components
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(v: &[i64]) -> Vec<SymbolId> {
        v.iter().map(|&i| SymbolId(i)).collect()
    }

    #[test]
    fn out_of_scope_edges_are_dropped() {
        let edges = [
            ReferenceEdge::new(1, 2, 10),
            ReferenceEdge::new(1, 99, 11),
            ReferenceEdge::new(98, 2, 1),
        ];
        let graph = ReferenceGraph::build(ids(&[1, 2]), &edges);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.dropped_edges(), 2);
        assert!(graph.has_edge(SymbolId(1), SymbolId(2)));
    }

    #[test]
    fn parallel_edges_collapse_and_self_loops_stay() {
        let edges = [
            ReferenceEdge::new(1, 2, 10),
            ReferenceEdge::new(1, 2, 12),
            ReferenceEdge::new(3, 3, 5),
        ];
        let graph = ReferenceGraph::build(ids(&[1, 2, 3]), &edges);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.dependent_count(SymbolId(2)), 1);
        assert_eq!(graph.dependent_count(SymbolId(3)), 1);
        assert_eq!(graph.dependencies(SymbolId(3)).collect::<Vec<_>>(), ids(&[3]));
    }

    #[test]
    fn reverse_adjacency_mirrors_forward() {
        let edges = [ReferenceEdge::new(1, 3, 1), ReferenceEdge::new(2, 3, 1)];
        let graph = ReferenceGraph::build(ids(&[1, 2, 3]), &edges);
        assert_eq!(graph.dependents(SymbolId(3)).collect::<Vec<_>>(), ids(&[1, 2]));
        assert_eq!(graph.dependent_count(SymbolId(1)), 0);
    }

    #[test]
    fn cyclic_components_skip_acyclic_members() {
        let edges = [
            ReferenceEdge::new(1, 2, 1),
            ReferenceEdge::new(2, 1, 1),
            ReferenceEdge::new(2, 3, 1),
            ReferenceEdge::new(4, 4, 1),
        ];
        let graph = ReferenceGraph::build(ids(&[1, 2, 3, 4]), &edges);
        let subset: BTreeSet<SymbolId> = ids(&[1, 2, 3, 4]).into_iter().collect();
        assert_eq!(graph.cyclic_components(&subset), vec![ids(&[1, 2]), ids(&[4])]);
    }
}
