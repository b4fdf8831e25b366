//! Canonical JSON descriptor.
//!
//! The descriptor is the persisted form of a pipeline:
//!
//! ```json
//! {
//!   "id": "daily-orders",
//!   "name": "Daily orders",
//!   "nodes": [{ "id": "A", "type": "source-pg", "label": "", "config": { "table": "orders" } }],
//!   "edges": [{ "from": "A", "to": "B" }]
//! }
//! ```
//!
//! Nodes are sorted by ID, edges by `(from, to)` and config keys
//! alphabetically, so equal pipelines serialize to equal bytes.

use super::graph::Pipeline;
use super::node::Node;
use crate::error::Result;
use crate::types::{Edge, NodeId, PipelineId};
use crate::validation::ValidationLimits;
use crate::value::ConfigMap;
use serde::{Deserialize, Serialize};

/// Serializable form of a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDescriptor {
    /// Pipeline ID.
    pub id: PipelineId,
    /// Pipeline name.
    #[serde(default)]
    pub name: String,
    /// Nodes.
    #[serde(default)]
    pub nodes: Vec<NodeDescriptor>,
    /// Edges.
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// Serializable form of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    /// Node ID.
    pub id: NodeId,
    /// Registry type ID.
    #[serde(rename = "type")]
    pub node_type: String,
    /// Human label.
    #[serde(default)]
    pub label: String,
    /// Configuration.
    #[serde(default)]
    pub config: ConfigMap,
}

impl From<&Node> for NodeDescriptor {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id.clone(),
            node_type: node.node_type.clone(),
            label: node.label.clone(),
            config: node.config.clone(),
        }
    }
}

impl From<NodeDescriptor> for Node {
    fn from(desc: NodeDescriptor) -> Self {
        Node::new(desc.id, desc.node_type)
            .with_label(desc.label)
            .with_config_map(desc.config)
    }
}

impl PipelineDescriptor {
    /// Sort nodes and edges into canonical order.
    pub fn canonicalize(&mut self) {
        self.nodes.sort_by(|a, b| a.id.cmp(&b.id));
        self.edges.sort();
    }
}

impl Pipeline {
    /// Build the canonical descriptor.
    pub fn to_descriptor(&self) -> PipelineDescriptor {
        PipelineDescriptor {
            id: self.id().clone(),
            name: self.name().to_string(),
            nodes: self.nodes().map(NodeDescriptor::from).collect(),
            edges: self.edges().cloned().collect(),
        }
    }

    /// Rebuild a pipeline from a descriptor.
    ///
    /// Duplicate nodes, dangling edges, self-loops and duplicate edges are
    /// rejected. Cycles and unknown node types are accepted so that
    /// validation can report them.
    pub fn from_descriptor(descriptor: PipelineDescriptor) -> Result<Self> {
        let mut pipeline = Pipeline::new(descriptor.id, descriptor.name);
        for node in descriptor.nodes {
            pipeline.add_node(node.into())?;
        }
        for edge in &descriptor.edges {
            pipeline.add_edge_allow_cycle(edge.from.as_str(), edge.to.as_str())?;
        }
        Ok(pipeline)
    }

    /// Serialize to canonical, pretty-printed JSON with a trailing newline.
    pub fn to_canonical_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(&self.to_descriptor())?;
        json.push('\n');
        Ok(json)
    }

    /// Parse a pipeline from descriptor JSON using default limits.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_json_with_limits(json, &ValidationLimits::default())
    }

    /// Parse a pipeline from descriptor JSON, checking its size first.
    pub fn from_json_with_limits(json: &str, limits: &ValidationLimits) -> Result<Self> {
        limits.validate_content_size(json)?;
        let descriptor: PipelineDescriptor = serde_json::from_str(json)?;
        Self::from_descriptor(descriptor)
    }
}
