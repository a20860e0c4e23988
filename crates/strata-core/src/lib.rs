//! Strata Core — symbol boundaries, classification, reference layering and batch planning

pub mod model;
pub mod lexer;
pub mod span;
pub mod classify;
pub mod bounds;
pub mod scope;
pub mod refs;
pub mod graph;
pub mod layering;
pub mod cluster;
pub mod export;
pub mod plan;
pub mod config;


pub use model::{Assignment, Cluster, ClusterId, ReferenceEdge, Resolution, Symbol, SymbolId, SymbolKind};
pub use lexer::LexState;
pub use span::{Span, resolve_span, resolve_symbol};
pub use classify::classify;
pub use bounds::{BoundsReport, DedupReport, assign_nominal_ends, close_open_ends, prune_duplicates};
pub use scope::ScopeFilter;
pub use refs::{top_referenced, without_targets};
pub use graph::ReferenceGraph;
pub use layering::{Layering, LayeringStats, assign_layers};
pub use cluster::build_clusters;
pub use export::{BatchRecord, export_batches};
pub use plan::{Plan, PlanReport, plan};
pub use config::{CONFIG_FILE, ClusterConfig, ConfigError, StoreConfig, StrataConfig};
