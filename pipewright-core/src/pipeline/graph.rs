//! Pipeline graph representation and analysis.

use super::node::Node;
use crate::error::{PipelineError, Result};
use crate::types::{Edge, NodeId, PipelineId};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// A pipeline: nodes plus directed edges.
///
/// Every mutation checks the structural invariants first and leaves the
/// pipeline untouched when it fails:
///
/// - edges reference existing nodes
/// - no duplicate edges, no self-loops
/// - no cycles (`add_edge` rejects an edge whose target already reaches its
///   source)
///
/// All collections are ordered so that iteration, and everything derived from
/// it, is deterministic.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    id: PipelineId,
    name: String,
    nodes: BTreeMap<NodeId, Node>,
    edges: BTreeSet<Edge>,
    /// Successors indexed by source node.
    outgoing: BTreeMap<NodeId, BTreeSet<NodeId>>,
    /// Predecessors indexed by target node.
    incoming: BTreeMap<NodeId, BTreeSet<NodeId>>,
}

impl Pipeline {
    /// Create an empty pipeline.
    pub fn new(id: impl Into<PipelineId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            nodes: BTreeMap::new(),
            edges: BTreeSet::new(),
            outgoing: BTreeMap::new(),
            incoming: BTreeMap::new(),
        }
    }

    /// Pipeline ID.
    pub fn id(&self) -> &PipelineId {
        &self.id
    }

    /// Pipeline name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the pipeline.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Nodes in ascending ID order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Edges in ascending `(from, to)` order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    /// Get a node by ID.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Get a node by ID or fail with `NodeNotFound`.
    pub fn require_node(&self, id: &str) -> Result<&Node> {
        self.nodes.get(id).ok_or_else(|| PipelineError::NodeNotFound {
            node_id: NodeId::new(id),
        })
    }

    /// Check if a node exists.
    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Check if an edge exists.
    pub fn contains_edge(&self, from: &str, to: &str) -> bool {
        self.outgoing
            .get(from)
            .is_some_and(|targets| targets.contains(to))
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Check if the pipeline has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a node.
    pub fn add_node(&mut self, node: Node) -> Result<()> {
        if self.nodes.contains_key(&node.id) {
            return Err(PipelineError::DuplicateNode { node_id: node.id });
        }
        self.outgoing.entry(node.id.clone()).or_default();
        self.incoming.entry(node.id.clone()).or_default();
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    /// Remove a node and every edge touching it.
    pub fn remove_node(&mut self, id: &str) -> Result<Node> {
        let node = self
            .nodes
            .remove(id)
            .ok_or_else(|| PipelineError::NodeNotFound {
                node_id: NodeId::new(id),
            })?;

        let successors = self.outgoing.remove(id).unwrap_or_default();
        for to in &successors {
            if let Some(preds) = self.incoming.get_mut(to) {
                preds.remove(id);
            }
            self.edges.remove(&Edge::new(node.id.clone(), to.clone()));
        }

        let predecessors = self.incoming.remove(id).unwrap_or_default();
        for from in &predecessors {
            if let Some(succs) = self.outgoing.get_mut(from) {
                succs.remove(id);
            }
            self.edges.remove(&Edge::new(from.clone(), node.id.clone()));
        }

        Ok(node)
    }

    /// Get a mutable node by ID or fail with `NodeNotFound`.
    pub fn node_mut(&mut self, id: &str) -> Result<&mut Node> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| PipelineError::NodeNotFound {
                node_id: NodeId::new(id),
            })
    }

    /// Add an edge, refusing anything that would break the DAG.
    pub fn add_edge(&mut self, from: &str, to: &str) -> Result<()> {
        self.check_edge(from, to)?;

        // `to` already reaching `from` means the new edge would close a cycle.
        if self.can_reach(to, from) {
            return Err(PipelineError::CycleWouldForm {
                edge: Edge::new(from, to),
            });
        }

        self.insert_edge(Edge::new(from, to));
        Ok(())
    }

    /// Add an edge without the reachability check.
    ///
    /// Used when loading external descriptors, which may contain cycles that
    /// validation must be able to report.
    pub(crate) fn add_edge_allow_cycle(&mut self, from: &str, to: &str) -> Result<()> {
        self.check_edge(from, to)?;
        self.insert_edge(Edge::new(from, to));
        Ok(())
    }

    fn check_edge(&self, from: &str, to: &str) -> Result<()> {
        for endpoint in [from, to] {
            if !self.nodes.contains_key(endpoint) {
                return Err(PipelineError::NodeNotFound {
                    node_id: NodeId::new(endpoint),
                });
            }
        }
        if from == to {
            return Err(PipelineError::SelfLoop {
                node_id: NodeId::new(from),
            });
        }
        if self.contains_edge(from, to) {
            return Err(PipelineError::DuplicateEdge {
                edge: Edge::new(from, to),
            });
        }
        Ok(())
    }

    fn insert_edge(&mut self, edge: Edge) {
        self.outgoing
            .entry(edge.from.clone())
            .or_default()
            .insert(edge.to.clone());
        self.incoming
            .entry(edge.to.clone())
            .or_default()
            .insert(edge.from.clone());
        self.edges.insert(edge);
    }

    /// Remove an edge.
    pub fn remove_edge(&mut self, from: &str, to: &str) -> Result<()> {
        let edge = Edge::new(from, to);
        if !self.edges.remove(&edge) {
            return Err(PipelineError::EdgeNotFound { edge });
        }
        if let Some(succs) = self.outgoing.get_mut(from) {
            succs.remove(to);
        }
        if let Some(preds) = self.incoming.get_mut(to) {
            preds.remove(from);
        }
        Ok(())
    }

    /// Direct upstream nodes in ascending ID order (empty for unknown nodes).
    pub fn predecessors<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a NodeId> + use<'a> {
        self.incoming.get(id).into_iter().flatten()
    }

    /// Direct downstream nodes in ascending ID order (empty for unknown nodes).
    pub fn successors<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a NodeId> + use<'a> {
        self.outgoing.get(id).into_iter().flatten()
    }

    /// Number of incoming edges.
    pub fn in_degree(&self, id: &str) -> usize {
        self.incoming.get(id).map_or(0, BTreeSet::len)
    }

    /// Number of outgoing edges.
    pub fn out_degree(&self, id: &str) -> usize {
        self.outgoing.get(id).map_or(0, BTreeSet::len)
    }

    /// Check whether a path leads from `from` to `to` (a node reaches itself).
    pub fn can_reach(&self, from: &str, to: &str) -> bool {
        if from == to {
            return true;
        }
        let mut visited: BTreeSet<&str> = BTreeSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([from]);

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            for next in self.successors(current) {
                if next.as_str() == to {
                    return true;
                }
                queue.push_back(next.as_str());
            }
        }
        false
    }

    /// All nodes reachable from `id`, excluding `id` itself.
    pub fn descendants(&self, id: &str) -> BTreeSet<&NodeId> {
        let mut visited: BTreeSet<&NodeId> = BTreeSet::new();
        let mut queue: VecDeque<&NodeId> = self.successors(id).collect();

        while let Some(current) = queue.pop_front() {
            if visited.insert(current) {
                queue.extend(self.successors(current.as_str()));
            }
        }
        visited.retain(|n| n.as_str() != id);
        visited
    }

    /// Order nodes so that every edge points forward.
    ///
    /// Kahn's algorithm with ties (nodes whose in-degree reaches zero at the
    /// same time) broken by ascending node ID, so the same pipeline always
    /// yields the same order. Fails with `CycleDetected` naming every node
    /// that could not be ordered.
    pub fn topological_order(&self) -> Result<Vec<NodeId>> {
        let mut in_degree: BTreeMap<&NodeId, usize> = self
            .nodes
            .keys()
            .map(|id| (id, self.in_degree(id.as_str())))
            .collect();

        let mut ready: BTreeSet<&NodeId> = in_degree
            .iter()
            .filter(|&(_, degree)| *degree == 0)
            .map(|(&id, _)| id)
            .collect();

        let mut sorted = Vec::with_capacity(self.nodes.len());

        while let Some(node_id) = ready.pop_first() {
            sorted.push(node_id.clone());

            for next in self.successors(node_id.as_str()) {
                if let Some(degree) = in_degree.get_mut(next) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(next);
                    }
                }
            }
        }

        if sorted.len() != self.nodes.len() {
            let cyclic: Vec<NodeId> = in_degree
                .into_iter()
                .filter(|&(_, degree)| degree > 0)
                .map(|(id, _)| id.clone())
                .collect();
            return Err(PipelineError::CycleDetected { nodes: cyclic });
        }

        Ok(sorted)
    }
}
