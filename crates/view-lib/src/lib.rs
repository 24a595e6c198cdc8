//! Hierarchy view library
//!
//! This crate provides the core functionality for:
//! - Parsing resource hierarchy snapshots
//! - Flattening a snapshot into parent/child chart rows
//! - Allocation ratios for capacity views
//! - View state tracking with stale-response protection
//! - Logical group sorting
//! - Service filtering for the network graph
//! - Observability

pub mod capacity;
pub mod error;
pub mod flatten;
pub mod graph;
pub mod groups;
pub mod models;
pub mod observability;
pub mod view;

pub use capacity::{compute_allocation_ratios, AllocationRatio, AllocationRatios, ResourceKind};
pub use error::{Result, ViewError};
pub use flatten::{
    apply_metric_change, flatten, flatten_topology, ChildCell, Flattened, Row, TopologyRow,
    TopologyTable, COLUMN_NAMES, TOPOLOGY_COLUMN_NAMES,
};
pub use graph::{
    filter_by_service, parse_edges, parse_nodes, service_list, GraphEdge, GraphNode, NodeId,
    ServiceGraph, ALL_SERVICES,
};
pub use groups::{parse_groups, sort_groups, GroupSortKey, LogicalGroup, SortOrder};
pub use models::*;
pub use observability::{StructuredLogger, ViewMetrics};
