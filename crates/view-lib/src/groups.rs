//! Logical groups of workloads and their sort orders

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::str::FromStr;

use crate::error::{Result, ViewError};

/// Aggregated usage and month-to-date cost for one logical group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogicalGroup {
    pub name: String,
    pub pods_count: u64,
    pub cpu: f64,
    pub memory: f64,
    pub storage: f64,
    #[serde(rename = "mtdCPU")]
    pub mtd_cpu: f64,
    pub mtd_memory: f64,
    pub mtd_storage: f64,
    #[serde(rename = "mtdCPUCost")]
    pub mtd_cpu_cost: f64,
    pub mtd_memory_cost: f64,
    pub mtd_storage_cost: f64,
    pub mtd_cost: f64,
}

/// Column a group list can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupSortKey {
    Name,
    PodsCount,
    Cpu,
    Memory,
    Storage,
    MtdCost,
}

impl FromStr for GroupSortKey {
    type Err = ViewError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "name" => Ok(GroupSortKey::Name),
            "pods" | "podscount" => Ok(GroupSortKey::PodsCount),
            "cpu" => Ok(GroupSortKey::Cpu),
            "memory" => Ok(GroupSortKey::Memory),
            "storage" => Ok(GroupSortKey::Storage),
            "cost" | "mtdcost" => Ok(GroupSortKey::MtdCost),
            _ => Err(ViewError::UnknownSortKey(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl GroupSortKey {
    fn compare(&self, a: &LogicalGroup, b: &LogicalGroup) -> Ordering {
        match self {
            GroupSortKey::Name => a.name.cmp(&b.name),
            GroupSortKey::PodsCount => a.pods_count.cmp(&b.pods_count),
            GroupSortKey::Cpu => a.cpu.total_cmp(&b.cpu),
            GroupSortKey::Memory => a.memory.total_cmp(&b.memory),
            GroupSortKey::Storage => a.storage.total_cmp(&b.storage),
            GroupSortKey::MtdCost => a.mtd_cost.total_cmp(&b.mtd_cost),
        }
    }
}

/// Stable in-place sort; equal groups keep their relative order in both directions
pub fn sort_groups(groups: &mut [LogicalGroup], key: GroupSortKey, order: SortOrder) {
    groups.sort_by(|a, b| {
        let ordering = key.compare(a, b);
        match order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });
}

/// Parse the groups endpoint body: a bare array or `{ "groups" | "data": [...] }`
pub fn parse_groups(body: &Value) -> Result<Vec<LogicalGroup>> {
    let list = match body {
        Value::Null => return Ok(Vec::new()),
        Value::Array(_) => body,
        Value::Object(map) => match map.get("groups").or_else(|| map.get("data")) {
            Some(Value::Null) | None => return Ok(Vec::new()),
            Some(list) => list,
        },
        _ => {
            return Err(ViewError::InvalidSnapshot(
                "groups response must be an array".to_string(),
            ))
        }
    };

    serde_json::from_value(list.clone())
        .map_err(|e| ViewError::InvalidSnapshot(format!("invalid group list: {e}")))
}
