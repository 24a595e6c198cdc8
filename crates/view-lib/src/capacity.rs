//! Allocation ratios for the capacity view
//!
//! Compares allocated against available capacity for the root of a metrics
//! snapshot, one ratio per resource dimension.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{Entity, Metric};

/// What the root of a capacity snapshot represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceKind {
    Cluster,
    Node,
    PersistentVolume,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ResourceKind::Cluster => "Cluster",
            ResourceKind::Node => "Node",
            ResourceKind::PersistentVolume => "PersistentVolume",
        };
        f.write_str(label)
    }
}

/// Allocated versus capacity for one dimension
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AllocationRatio {
    pub allocated: f64,
    pub capacity: f64,
    /// Rounded percentage; NaN or infinite when capacity is zero
    pub ratio: f64,
}

impl AllocationRatio {
    pub const ZERO: AllocationRatio = AllocationRatio {
        allocated: 0.0,
        capacity: 0.0,
        ratio: 0.0,
    };

    pub fn new(allocated: f64, capacity: f64) -> Self {
        let allocated = round2(allocated);
        let capacity = round2(capacity);
        Self {
            allocated,
            capacity,
            ratio: (allocated * 100.0 / capacity).round(),
        }
    }

    /// Percentage suitable for display, `None` when the ratio is not finite
    pub fn percent(&self) -> Option<i64> {
        self.ratio.is_finite().then_some(self.ratio as i64)
    }
}

/// Allocation ratios for a snapshot root
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationRatios {
    pub resource_kind: ResourceKind,
    pub cpu: AllocationRatio,
    pub memory: AllocationRatio,
    pub storage: AllocationRatio,
}

impl AllocationRatios {
    pub fn get(&self, metric: Metric) -> &AllocationRatio {
        match metric {
            Metric::Cpu => &self.cpu,
            Metric::Memory => &self.memory,
            Metric::Storage => &self.storage,
        }
    }
}

/// Compute allocation ratios for the root entity
///
/// Nodes carry no storage and persistent volumes carry no cpu or memory, so
/// those dimensions are zeroed for them.
pub fn compute_allocation_ratios(root: &Entity) -> AllocationRatios {
    let ratio = |metric| {
        AllocationRatio::new(
            root.allocated.value_or_zero(metric),
            root.capacity.value_or_zero(metric),
        )
    };

    let mut ratios = AllocationRatios {
        resource_kind: ResourceKind::Cluster,
        cpu: ratio(Metric::Cpu),
        memory: ratio(Metric::Memory),
        storage: ratio(Metric::Storage),
    };

    match root.kind.as_deref() {
        Some("node") => {
            ratios.storage = AllocationRatio::ZERO;
            ratios.resource_kind = ResourceKind::Node;
        }
        Some("pv") => {
            ratios.cpu = AllocationRatio::ZERO;
            ratios.memory = AllocationRatio::ZERO;
            ratios.resource_kind = ResourceKind::PersistentVolume;
        }
        _ => {}
    }

    ratios
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entity(value: serde_json::Value) -> Entity {
        Entity::from_value(&value).unwrap()
    }

    #[test]
    fn test_node_zeroes_storage() {
        let root = entity(json!({
            "type": "node",
            "cpuCapacity": 8, "cpuAllocated": 4,
            "memoryCapacity": 16, "memoryAllocated": 8,
            "storageCapacity": 100, "storageAllocated": 50
        }));

        let ratios = compute_allocation_ratios(&root);

        assert_eq!(ratios.resource_kind, ResourceKind::Node);
        assert_eq!(ratios.cpu.ratio, 50.0);
        assert_eq!(ratios.memory.ratio, 50.0);
        assert_eq!(ratios.storage, AllocationRatio::ZERO);
        assert_eq!(ratios.storage.ratio, 0.0);
    }

    #[test]
    fn test_pv_zeroes_cpu_and_memory() {
        let root = entity(json!({
            "type": "pv",
            "cpuCapacity": 8, "cpuAllocated": 4,
            "storageCapacity": 20.1, "storageAllocated": 10.5
        }));

        let ratios = compute_allocation_ratios(&root);

        assert_eq!(ratios.resource_kind, ResourceKind::PersistentVolume);
        assert_eq!(ratios.cpu, AllocationRatio::ZERO);
        assert_eq!(ratios.memory, AllocationRatio::ZERO);
        assert_eq!(ratios.storage.ratio, 52.0);
    }

    #[test]
    fn test_cluster_keeps_all_dimensions() {
        let root = entity(json!({
            "type": "cluster",
            "cpuAllocated": 0.2, "cpuCapacity": 0.4,
            "memoryAllocated": 1.2, "memoryCapacity": 1.8,
            "storageAllocated": 10.5, "storageCapacity": 20.1
        }));

        let ratios = compute_allocation_ratios(&root);

        assert_eq!(ratios.resource_kind, ResourceKind::Cluster);
        assert_eq!(ratios.cpu.percent(), Some(50));
        assert_eq!(ratios.memory.percent(), Some(67));
        assert_eq!(ratios.storage.percent(), Some(52));
        assert_eq!(ratios.resource_kind.to_string(), "Cluster");
    }

    #[test]
    fn test_values_round_to_two_decimals() {
        let root = entity(json!({ "cpuAllocated": 1.23456, "cpuCapacity": 3.14159 }));

        let ratios = compute_allocation_ratios(&root);

        assert_eq!(ratios.cpu.allocated, 1.23);
        assert_eq!(ratios.cpu.capacity, 3.14);
        assert_eq!(ratios.cpu.ratio, 39.0);
    }

    #[test]
    fn test_zero_capacity_is_not_finite() {
        let root = entity(json!({ "type": "cluster", "cpuAllocated": 2 }));

        let ratios = compute_allocation_ratios(&root);

        assert!(ratios.cpu.ratio.is_infinite());
        assert_eq!(ratios.cpu.percent(), None);
        // 0 / 0
        assert!(ratios.memory.ratio.is_nan());
        assert_eq!(ratios.memory.percent(), None);
    }

    #[test]
    fn test_get_by_metric() {
        let root = entity(json!({ "type": "node", "memoryAllocated": 3, "memoryCapacity": 4 }));
        let ratios = compute_allocation_ratios(&root);
        assert_eq!(ratios.get(Metric::Memory).ratio, 75.0);
    }
}
