//! Graph model & validator: parses a submitted workflow description
//! into normalized node/edge structures, dropping dangling edges with a
//! warning.

use crate::error::{DataflowError, ErrorCategory};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Wire format for one node. Some client formats nest `type`/`label`/
/// `config` under a `data` sub-field; both forms are accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct RawNode {
    pub id: String,
    #[serde(rename = "type", default)]
    pub node_type: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub config: Option<serde_json::Value>,
    #[serde(default)]
    pub data: Option<RawNodeData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawNodeData {
    #[serde(rename = "type", default)]
    pub node_type: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub config: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEdge {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawWorkflow {
    pub nodes: Vec<RawNode>,
    pub edges: Vec<RawEdge>,
}

/// Canonical, flat node form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub node_type: String,
    pub label: String,
    pub config: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
}

/// A normalized workflow graph: nodes/edges plus precomputed adjacency
/// maps. Edge order within `edges` is preserved verbatim — it is the
/// fan-in ordering contract the scheduler relies on.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub adjacency: HashMap<String, Vec<String>>,
    pub reverse_adjacency: HashMap<String, Vec<String>>,
}

impl Graph {
    pub fn normalize(raw: RawWorkflow) -> crate::error::Result<Graph> {
        let mut nodes = Vec::with_capacity(raw.nodes.len());
        let mut ids: HashSet<String> = HashSet::new();

        for n in raw.nodes {
            let node_type = n
                .node_type
                .clone()
                .or_else(|| n.data.as_ref().and_then(|d| d.node_type.clone()))
                .ok_or_else(|| {
                    DataflowError::new(
                        ErrorCategory::GraphStructure,
                        format!("node '{}' has no type (flat or data.type)", n.id),
                    )
                    .with_node(n.id.clone())
                })?;
            let label = n
                .label
                .clone()
                .or_else(|| n.data.as_ref().and_then(|d| d.label.clone()))
                .unwrap_or_else(|| n.id.clone());
            let config = n
                .config
                .clone()
                .or_else(|| n.data.as_ref().and_then(|d| d.config.clone()))
                .unwrap_or_else(|| serde_json::json!({}));

            if !ids.insert(n.id.clone()) {
                return Err(DataflowError::new(
                    ErrorCategory::GraphStructure,
                    format!("duplicate node id '{}'", n.id),
                )
                .with_node(n.id.clone()));
            }

            nodes.push(Node {
                id: n.id,
                node_type,
                label,
                config,
            });
        }

        let mut edges = Vec::with_capacity(raw.edges.len());
        for e in raw.edges {
            if !ids.contains(&e.source) || !ids.contains(&e.target) {
                log::warn!(
                    "dropping edge {}->{}: endpoint references an unknown node id",
                    e.source,
                    e.target
                );
                continue;
            }
            edges.push(Edge {
                source: e.source,
                target: e.target,
            });
        }

        let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
        let mut reverse_adjacency: HashMap<String, Vec<String>> = HashMap::new();
        for id in &ids {
            adjacency.entry(id.clone()).or_default();
            reverse_adjacency.entry(id.clone()).or_default();
        }
        for e in &edges {
            adjacency.get_mut(&e.source).unwrap().push(e.target.clone());
            reverse_adjacency.get_mut(&e.target).unwrap().push(e.source.clone());
        }

        Ok(Graph {
            nodes,
            edges,
            adjacency,
            reverse_adjacency,
        })
    }

    pub fn find_node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Inputs to `node_id` in edge-encounter order.
    pub fn incoming_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.target == node_id)
    }
}
