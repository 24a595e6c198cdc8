//! Service filtering for the node/edge network graph
//!
//! Nodes list the services they belong to in `cid`. Filtering by a service
//! keeps every edge touching one of that service's nodes, then every node
//! those edges touch, so one-hop neighbours outside the service stay visible.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

use crate::error::{Result, ViewError};

/// Service selector that disables filtering
pub const ALL_SERVICES: &str = "ALL";

/// Node identifier; the graph endpoints use both numbers and strings
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeId {
    Number(i64),
    Text(String),
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Number(n) => write!(f, "{}", n),
            NodeId::Text(s) => f.write_str(s),
        }
    }
}

/// One node of the network graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Services this node belongs to
    #[serde(default, deserialize_with = "null_as_empty")]
    pub cid: Vec<String>,
    /// Rendering attributes (group, shape, ...) passed through untouched
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl GraphNode {
    pub fn new(id: NodeId, cid: &[&str]) -> Self {
        Self {
            id,
            label: None,
            cid: cid.iter().map(|c| c.to_string()).collect(),
            attributes: Map::new(),
        }
    }

    pub fn in_service(&self, service: &str) -> bool {
        self.cid.iter().any(|c| c == service)
    }
}

/// One directed edge of the network graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: NodeId,
    pub to: NodeId,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl GraphEdge {
    pub fn new(from: NodeId, to: NodeId) -> Self {
        Self {
            from,
            to,
            attributes: Map::new(),
        }
    }
}

/// Nodes and edges left after filtering
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServiceGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Distinct service ids across all nodes, in first-seen order
pub fn service_list(nodes: &[GraphNode]) -> Vec<String> {
    let mut seen = HashSet::new();
    nodes
        .iter()
        .flat_map(|node| node.cid.iter())
        .filter(|cid| !cid.is_empty() && seen.insert(cid.as_str()))
        .cloned()
        .collect()
}

/// Restrict the graph to one service and its direct neighbours
///
/// `None`, an empty name or [`ALL_SERVICES`] returns the graph unchanged.
/// Otherwise nodes survive only when a kept edge touches them, so a member
/// node with no edges is dropped.
pub fn filter_by_service(
    nodes: &[GraphNode],
    edges: &[GraphEdge],
    service: Option<&str>,
) -> ServiceGraph {
    let service = match service {
        Some(s) if !s.is_empty() && s != ALL_SERVICES => s,
        _ => {
            return ServiceGraph {
                nodes: nodes.to_vec(),
                edges: edges.to_vec(),
            }
        }
    };

    let members: HashSet<&NodeId> = nodes
        .iter()
        .filter(|node| node.in_service(service))
        .map(|node| &node.id)
        .collect();

    let kept_edges: Vec<GraphEdge> = edges
        .iter()
        .filter(|edge| members.contains(&edge.from) || members.contains(&edge.to))
        .cloned()
        .collect();

    let touched: HashSet<&NodeId> = kept_edges
        .iter()
        .flat_map(|edge| [&edge.from, &edge.to])
        .collect();

    let kept_nodes = nodes
        .iter()
        .filter(|node| touched.contains(&node.id))
        .cloned()
        .collect();

    ServiceGraph {
        nodes: kept_nodes,
        edges: kept_edges,
    }
}

/// Parse the nodes endpoint body: a bare array or `{ "data": [...] }`
pub fn parse_nodes(body: &Value) -> Result<Vec<GraphNode>> {
    parse_list(body, "nodes")
}

/// Parse the edges endpoint body: a bare array or `{ "data": [...] }`
pub fn parse_edges(body: &Value) -> Result<Vec<GraphEdge>> {
    parse_list(body, "edges")
}

fn parse_list<T: DeserializeOwned>(body: &Value, what: &str) -> Result<Vec<T>> {
    let list = match body {
        Value::Null => return Ok(Vec::new()),
        Value::Array(_) => body,
        Value::Object(map) => match map.get("data") {
            Some(Value::Null) | None => return Ok(Vec::new()),
            Some(list) => list,
        },
        _ => {
            return Err(ViewError::InvalidSnapshot(format!(
                "{what} response must be an array"
            )))
        }
    };

    serde_json::from_value(list.clone())
        .map_err(|e| ViewError::InvalidSnapshot(format!("invalid {what} list: {e}")))
}
