//! Group in-scope symbols into bounded clusters.
//!
//! Symbols are grouped by file. Small files stay whole; larger ones are split by
//! kind and chunked so no batch grows past `chunk_size` members.

use std::collections::BTreeMap;
use std::path::Path;

use crate::config::ClusterConfig;
use crate::layering::Layering;
use crate::model::{Cluster, ClusterId, Symbol, SymbolKind};

/// Cluster type of an unsplit file group.
pub const FILE_CLUSTER: &str = "file";

/// Build clusters for `symbols`, numbering them from 1 in file path order.
///
/// Members are ordered by kind then id. A member missing from `layering`
/// counts as layer 0 when averaging.
pub fn build_clusters(symbols: &[&Symbol], layering: &Layering, config: &ClusterConfig) -> Vec<Cluster> {
    let mut by_file: BTreeMap<&Path, Vec<&Symbol>> = BTreeMap::new();
    for &symbol in symbols {
        by_file.entry(symbol.file_path.as_path()).or_default().push(symbol);
    }

    let chunk_size = config.chunk_size.max(1);
    let mut clusters = Vec::new();

    for (path, mut group) in by_file {
        group.sort_by_key(|s| (kind_of(s), s.id));

        if group.len() <= config.small_file_threshold {
            let id = next_id(&clusters);
            clusters.push(make_cluster(id, FILE_CLUSTER.to_string(), &group, layering, config));
            continue;
        }

        tracing::debug!("Splitting {} ({} symbols) by kind", path.display(), group.len());
        for kind in SymbolKind::ALL {
            let of_kind: Vec<&Symbol> = group.iter().copied().filter(|s| kind_of(s) == kind).collect();
            for chunk in of_kind.chunks(chunk_size) {
                let id = next_id(&clusters);
                let cluster_type = format!("{}_{}", FILE_CLUSTER, kind.tag());
                clusters.push(make_cluster(id, cluster_type, chunk, layering, config));
            }
        }
    }

    tracing::info!("Built {} clusters from {} symbols", clusters.len(), symbols.len());
    clusters
}

fn kind_of(symbol: &Symbol) -> SymbolKind {
    symbol.kind.unwrap_or(SymbolKind::Unknown)
}

fn next_id(clusters: &[Cluster]) -> ClusterId {
    ClusterId(clusters.len() as u32 + 1)
}

fn make_cluster(
    id: ClusterId,
    cluster_type: String,
    members: &[&Symbol],
    layering: &Layering,
    config: &ClusterConfig,
) -> Cluster {
    let total: u64 = members
        .iter()
        .map(|s| u64::from(layering.layer_of(s.id).unwrap_or(0)))
        .sum();
    let layer = match members.len() as u64 {
        0 => 0,
        n => (total / n) as u32,
    };

    Cluster {
        id,
        cluster_type,
        layer,
        members: members.iter().map(|s| s.id).collect(),
        estimated_cost: members.len() as u64 * config.cost_per_symbol,
    }
}
