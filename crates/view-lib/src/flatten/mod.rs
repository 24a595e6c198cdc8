//! Hierarchy flattening for parent/child chart widgets
//!
//! Turns one snapshot into the flat `[child, parent, value]` rows consumed by
//! tree-map and org-chart widgets, plus the list of child names offered as
//! drill-in filters. Only the root's direct children are expanded; the next
//! level is fetched from the data source on drill-in.

use serde::ser::{SerializeTuple, Serializer};
use serde::Serialize;
use std::collections::HashSet;

use crate::models::{Entity, Metric};

/// Column headers expected by the chart widget
pub const COLUMN_NAMES: [&str; 3] = ["Child", "Parent", "Metric"];

/// Column headers for topology rows, whose third column is the entity type
pub const TOPOLOGY_COLUMN_NAMES: [&str; 3] = ["Child", "Parent", "Type"];

/// First column of a chart row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChildCell {
    /// Entity name, unique across a table
    #[serde(rename = "v")]
    pub value: String,
    /// Label rendered by the widget
    #[serde(rename = "f")]
    pub display: String,
    /// Entity type; absent on the root row
    #[serde(rename = "t", skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
}

/// One parent/child row; `V` is the third column
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRow<V> {
    pub child: ChildCell,
    pub parent: Option<String>,
    pub value: V,
}

/// Capacity row sized by a metric value
pub type Row = ChartRow<f64>;

/// Topology row carrying the entity type as tooltip
pub type TopologyRow = ChartRow<String>;

impl<V: Serialize> Serialize for ChartRow<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(3)?;
        tuple.serialize_element(&self.child)?;
        tuple.serialize_element(&self.parent)?;
        tuple.serialize_element(&self.value)?;
        tuple.end()
    }
}

/// Rows plus the derived filter list
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Table<V> {
    pub rows: Vec<ChartRow<V>>,
    pub filter_names: Vec<String>,
}

impl<V> Default for Table<V> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            filter_names: Vec::new(),
        }
    }
}

impl<V> Table<V> {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn cell(&self, index: usize) -> Option<&ChildCell> {
        self.rows.get(index).map(|row| &row.child)
    }

    /// Position and row of the entity with the given name
    pub fn find(&self, name: &str) -> Option<(usize, &ChartRow<V>)> {
        self.rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.child.value == name)
    }
}

/// Result of [`flatten`]
pub type Flattened = Table<f64>;

/// Result of [`flatten_topology`]
pub type TopologyTable = Table<String>;

/// How a flattening pass labels and sizes rows
pub trait RowStyle {
    type Value;

    /// Display and value for the root row, or `None` to omit it
    fn root(&self, root: &Entity, name: &str) -> Option<(String, Self::Value)>;

    /// Display and value for a direct child
    fn child(&self, child: &Entity, name: &str) -> (String, Self::Value);
}

/// Rows sized by one metric, labelled with the metric and its cost
#[derive(Debug, Clone)]
pub struct MetricStyle<'a> {
    label: &'a str,
    metric: Option<Metric>,
}

impl<'a> MetricStyle<'a> {
    /// Unknown metric names are kept for labels but read as zero
    pub fn new(metric: &'a str) -> Self {
        Self {
            label: metric,
            metric: metric.parse().ok(),
        }
    }

    fn values(&self, entity: &Entity) -> (f64, f64) {
        match self.metric {
            Some(metric) => (
                entity.usage.value_or_zero(metric),
                entity.cost.value_or_zero(metric),
            ),
            None => (0.0, 0.0),
        }
    }
}

impl RowStyle for MetricStyle<'_> {
    type Value = f64;

    fn root(&self, root: &Entity, name: &str) -> Option<(String, f64)> {
        let (value, cost) = self.values(root);
        Some((format_label(name, self.label, value, cost), 0.0))
    }

    fn child(&self, child: &Entity, name: &str) -> (String, f64) {
        let (value, cost) = self.values(child);
        (format_label(name, self.label, value, cost), value)
    }
}

/// Rows labelled by name, with the entity type in the third column
#[derive(Debug, Clone, Copy, Default)]
pub struct TopologyStyle;

impl RowStyle for TopologyStyle {
    type Value = String;

    fn root(&self, _root: &Entity, _name: &str) -> Option<(String, String)> {
        None
    }

    fn child(&self, child: &Entity, name: &str) -> (String, String) {
        (name.to_string(), child.kind.clone().unwrap_or_default())
    }
}

/// `"{name}, {metric}: {value}, {metric} cost: {cost}"` with two decimals
pub fn format_label(name: &str, metric: &str, value: f64, cost: f64) -> String {
    format!("{name}, {metric}: {value:.2}, {metric} cost: {cost:.2}")
}

/// Flatten a snapshot into capacity rows sized by `metric`
///
/// The root row comes first with no parent and a value of 0, followed by one
/// row per direct child in relation-key order. A name already emitted is not
/// emitted again. `filter_names` holds the children of the last relation key
/// processed, duplicates included.
pub fn flatten(root: Option<&Entity>, metric: &str) -> Flattened {
    flatten_with(root, &MetricStyle::new(metric))
}

/// Re-flatten the retained original snapshot under a new metric
pub fn apply_metric_change(original: Option<&Entity>, metric: &str) -> Flattened {
    flatten(original, metric)
}

/// Flatten a snapshot into topology rows (no root row)
pub fn flatten_topology(root: Option<&Entity>) -> TopologyTable {
    flatten_with(root, &TopologyStyle)
}

/// Flatten a snapshot with the given row style
pub fn flatten_with<S: RowStyle>(root: Option<&Entity>, style: &S) -> Table<S::Value> {
    let Some(root) = root else {
        return Table::default();
    };

    let mut table = Table::default();
    let mut seen: HashSet<&str> = HashSet::new();

    if let Some(name) = root.name.as_deref() {
        if let Some((display, value)) = style.root(root, name) {
            seen.insert(name);
            table.rows.push(ChartRow {
                child: ChildCell {
                    value: name.to_string(),
                    display,
                    entity_type: None,
                },
                parent: None,
                value,
            });
        }
    }

    for relation in &root.relations {
        table.filter_names.clear();

        for child in &relation.children {
            let Some(name) = child.name.as_deref() else {
                continue;
            };
            table.filter_names.push(name.to_string());

            if !seen.insert(name) {
                continue;
            }

            // A child named like its parent would loop back onto itself
            let parent = if child.name == root.name {
                root.kind.clone()
            } else {
                root.name.clone()
            };
            let (display, value) = style.child(child, name);
            table.rows.push(ChartRow {
                child: ChildCell {
                    value: name.to_string(),
                    display,
                    entity_type: child.kind.clone(),
                },
                parent,
                value,
            });
        }
    }

    table
}
