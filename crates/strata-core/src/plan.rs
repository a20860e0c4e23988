//! One planning run: scope, graph, layers, clusters, batches.

use serde::{Deserialize, Serialize};

use crate::cluster::build_clusters;
use crate::config::ClusterConfig;
use crate::export::{BatchRecord, export_batches};
use crate::graph::ReferenceGraph;
use crate::layering::{Layering, assign_layers};
use crate::model::{Assignment, Cluster, ReferenceEdge, Symbol, SymbolId};
use crate::refs::{top_referenced, without_targets};
use crate::scope::ScopeFilter;

/// Summary of a planning run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanReport {
    /// RFC 3339 timestamp of the run.
    pub generated_at: String,
    pub total_symbols: usize,
    pub in_scope: usize,
    /// Hub symbols whose incoming rows were dropped, most referenced first.
    pub excluded_hubs: Vec<SymbolId>,
    pub hub_rows_dropped: usize,
    pub edges: usize,
    pub dropped_edges: usize,
    pub layer_count: usize,
    pub overflow_size: usize,
    pub cyclic_components: usize,
    pub cluster_count: usize,
}

#[derive(Debug, Clone)]
pub struct Plan {
    pub layering: Layering,
    pub clusters: Vec<Cluster>,
    pub batches: Vec<BatchRecord>,
    pub report: PlanReport,
}

impl Plan {
    /// Per-symbol layer and cluster, ascending by symbol id.
    pub fn assignments(&self) -> Vec<Assignment> {
        let mut out: Vec<Assignment> = self
            .clusters
            .iter()
            .flat_map(|cluster| {
                cluster.members.iter().map(|&symbol_id| Assignment {
                    symbol_id,
                    layer: self.layering.layer_of(symbol_id).unwrap_or(0),
                    cluster_id: cluster.id,
                })
            })
            .collect();
        out.sort_by_key(|a| a.symbol_id);
        out
    }
}

pub fn plan(symbols: &[Symbol], edges: &[ReferenceEdge], scope: &ScopeFilter, config: &ClusterConfig) -> Plan {
    let in_scope = scope.select(symbols);
    tracing::info!("{} of {} symbols in scope", in_scope.len(), symbols.len());

    let excluded_hubs = top_referenced(edges, scope.exclude_top_referenced);
    let kept = without_targets(edges, &excluded_hubs);
    if !excluded_hubs.is_empty() {
        tracing::info!(
            "Excluding {} hub symbols ({} reference rows)",
            excluded_hubs.len(),
            edges.len() - kept.len()
        );
    }

    let graph = ReferenceGraph::build(in_scope.iter().map(|s| s.id), &kept);
    let layering = assign_layers(&graph);
    let clusters = build_clusters(&in_scope, &layering, config);
    let batches = export_batches(&clusters);

    let stats = layering.stats();
    let report = PlanReport {
        generated_at: chrono::Utc::now().to_rfc3339(),
        total_symbols: symbols.len(),
        in_scope: graph.node_count(),
        hub_rows_dropped: edges.len() - kept.len(),
        excluded_hubs,
        edges: graph.edge_count(),
        dropped_edges: graph.dropped_edges(),
        layer_count: stats.layer_count,
        overflow_size: stats.overflow_size,
        cyclic_components: stats.cyclic_components,
        cluster_count: clusters.len(),
    };

    Plan {
        layering,
        clusters,
        batches,
        report,
    }
}
