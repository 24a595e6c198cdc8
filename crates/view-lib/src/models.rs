//! Core data models for resource hierarchy snapshots
//!
//! Snapshots arrive as loosely-typed JSON objects. They are parsed once into
//! [`Entity`] records: metric fields are keyed by the closed [`Metric`]
//! enumeration and child collections by the closed [`RelationKey`] set, with
//! relation keys kept in the order they appeared in the source object.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, ViewError};

/// Resource dimension used to size chart rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Cpu,
    Memory,
    Storage,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Cpu, Metric::Memory, Metric::Storage];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Cpu => "cpu",
            Metric::Memory => "memory",
            Metric::Storage => "storage",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = ViewError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cpu" => Ok(Metric::Cpu),
            "memory" => Ok(Metric::Memory),
            "storage" => Ok(Metric::Storage),
            other => Err(ViewError::UnknownMetric(other.to_string())),
        }
    }
}

/// One value per resource dimension; `None` when the field was absent or falsy
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricValues {
    pub cpu: Option<f64>,
    pub memory: Option<f64>,
    pub storage: Option<f64>,
}

impl MetricValues {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Cpu => self.cpu,
            Metric::Memory => self.memory,
            Metric::Storage => self.storage,
        }
    }

    /// Value for the metric, reading absent values as zero
    pub fn value_or_zero(&self, metric: Metric) -> f64 {
        self.get(metric).unwrap_or(0.0)
    }

    pub fn set(&mut self, metric: Metric, value: Option<f64>) {
        match metric {
            Metric::Cpu => self.cpu = value,
            Metric::Memory => self.memory = value,
            Metric::Storage => self.storage = value,
        }
    }

    /// Read `{metric}{suffix}` fields from a JSON object
    fn read(map: &Map<String, Value>, suffix: &str) -> Self {
        let mut values = Self::default();
        for metric in Metric::ALL {
            let key = format!("{}{}", metric.as_str(), suffix);
            values.set(metric, read_number(map, &key));
        }
        values
    }
}

/// Property names whose values hold child entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKey {
    Service,
    Pod,
    Container,
    Process,
    Cluster,
    Namespace,
    Deployment,
    Replicaset,
    Node,
    Daemonset,
    Job,
    Statefulset,
    Children,
    Pv,
    Pvc,
}

impl RelationKey {
    pub const ALL: [RelationKey; 15] = [
        RelationKey::Service,
        RelationKey::Pod,
        RelationKey::Container,
        RelationKey::Process,
        RelationKey::Cluster,
        RelationKey::Namespace,
        RelationKey::Deployment,
        RelationKey::Replicaset,
        RelationKey::Node,
        RelationKey::Daemonset,
        RelationKey::Job,
        RelationKey::Statefulset,
        RelationKey::Children,
        RelationKey::Pv,
        RelationKey::Pvc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKey::Service => "service",
            RelationKey::Pod => "pod",
            RelationKey::Container => "container",
            RelationKey::Process => "process",
            RelationKey::Cluster => "cluster",
            RelationKey::Namespace => "namespace",
            RelationKey::Deployment => "deployment",
            RelationKey::Replicaset => "replicaset",
            RelationKey::Node => "node",
            RelationKey::Daemonset => "daemonset",
            RelationKey::Job => "job",
            RelationKey::Statefulset => "statefulset",
            RelationKey::Children => "children",
            RelationKey::Pv => "pv",
            RelationKey::Pvc => "pvc",
        }
    }

    /// Match a JSON property name against the recognized relation keys
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_str() == key)
    }
}

impl fmt::Display for RelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Children held under one relation key, in source order
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub key: RelationKey,
    pub children: Vec<Entity>,
}

/// Generic resource node of a hierarchy snapshot
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub struct Entity {
    pub name: Option<String>,
    /// Entity type (`cluster`, `node`, `pod`, ...)
    pub kind: Option<String>,
    /// `cpu`, `memory`, `storage`
    pub usage: MetricValues,
    /// `cpuCost`, `memoryCost`, `storageCost`
    pub cost: MetricValues,
    /// `cpuCapacity`, `memoryCapacity`, `storageCapacity`
    pub capacity: MetricValues,
    /// `cpuAllocated`, `memoryAllocated`, `storageAllocated`
    pub allocated: MetricValues,
    pub relations: Vec<Relation>,
}

impl Entity {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            kind: Some(kind.into()),
            ..Default::default()
        }
    }

    pub fn with_usage(mut self, metric: Metric, value: f64) -> Self {
        self.usage.set(metric, Some(value));
        self
    }

    pub fn with_cost(mut self, metric: Metric, value: f64) -> Self {
        self.cost.set(metric, Some(value));
        self
    }

    pub fn with_relation(mut self, key: RelationKey, children: Vec<Entity>) -> Self {
        self.relations.push(Relation { key, children });
        self
    }

    /// Parse an entity from a JSON object
    pub fn from_value(value: &Value) -> Result<Self> {
        let map = value.as_object().ok_or_else(|| {
            ViewError::InvalidSnapshot(format!("expected an object, found {}", json_kind(value)))
        })?;
        Ok(Self::from_map(map))
    }

    fn from_map(map: &Map<String, Value>) -> Self {
        let mut relations = Vec::new();
        for (key, value) in map {
            let Some(relation) = RelationKey::from_key(key) else {
                continue;
            };
            // Non-array relation values and non-object entries carry no children
            let children = value
                .as_array()
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_object)
                        .map(Self::from_map)
                        .collect()
                })
                .unwrap_or_default();
            relations.push(Relation {
                key: relation,
                children,
            });
        }

        Self {
            name: read_string(map, "name"),
            kind: read_string(map, "type"),
            usage: MetricValues::read(map, ""),
            cost: MetricValues::read(map, "Cost"),
            capacity: MetricValues::read(map, "Capacity"),
            allocated: MetricValues::read(map, "Allocated"),
            relations,
        }
    }

    /// Extract the snapshot from a response body
    ///
    /// Accepts `{ "data": Entity }` or a bare entity. A null body or null
    /// `data` field means the source had nothing to return.
    pub fn from_response(body: &Value) -> Result<Option<Self>> {
        let payload = match body {
            Value::Null => return Ok(None),
            Value::Object(map) => match map.get("data") {
                Some(Value::Null) => return Ok(None),
                Some(data) => data,
                None => body,
            },
            other => {
                return Err(ViewError::InvalidSnapshot(format!(
                    "expected an object, found {}",
                    json_kind(other)
                )))
            }
        };
        Self::from_value(payload).map(Some)
    }

    /// An entity with no name and no relations renders nothing
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.relations.is_empty()
    }

    /// Direct children across all relation keys, in traversal order
    pub fn children(&self) -> impl Iterator<Item = &Entity> {
        self.relations.iter().flat_map(|r| r.children.iter())
    }

    /// Direct child matching name and, when given, type
    pub fn find_child(&self, name: &str, kind: Option<&str>) -> Option<&Entity> {
        self.children().find(|child| {
            child.name.as_deref() == Some(name)
                && kind.map_or(true, |k| child.kind.as_deref() == Some(k))
        })
    }
}

impl TryFrom<Value> for Entity {
    type Error = ViewError;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(&value)
    }
}

/// Non-empty string field
fn read_string(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Numeric field; zero and non-numeric values count as absent
fn read_number(map: &Map<String, Value>, key: &str) -> Option<f64> {
    map.get(key)
        .and_then(Value::as_f64)
        .filter(|v| *v != 0.0 && v.is_finite())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
