//! Batch export: the ordered hand-off list for the downstream pipeline.

use serde::{Deserialize, Serialize};

use crate::model::{Cluster, ClusterId, SymbolId};

/// One exported batch. Field names are part of the exchange format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRecord {
    pub batch_id: ClusterId,
    #[serde(rename = "type")]
    pub batch_type: String,
    pub layer: u32,
    pub member_ids: Vec<SymbolId>,
    pub estimated_cost: u64,
}

impl From<&Cluster> for BatchRecord {
    fn from(cluster: &Cluster) -> Self {
        BatchRecord {
            batch_id: cluster.id,
            batch_type: cluster.cluster_type.clone(),
            layer: cluster.layer,
            member_ids: cluster.members.clone(),
            estimated_cost: cluster.estimated_cost,
        }
    }
}

/// Batches ordered by layer, then cluster id.
pub fn export_batches(clusters: &[Cluster]) -> Vec<BatchRecord> {
    let mut batches: Vec<BatchRecord> = clusters.iter().map(BatchRecord::from).collect();
    batches.sort_by_key(|b| (b.layer, b.batch_id));
    batches
}

pub fn to_json(batches: &[BatchRecord]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(batches)
}

pub fn from_json(json: &str) -> serde_json::Result<Vec<BatchRecord>> {
    serde_json::from_str(json)
}
