//! Error types for Pipewright.
//!
//! Every error names the node, edge, field or file it concerns. Structural
//! errors are raised synchronously by the mutation that would have broken an
//! invariant, so they never reach a pipeline's state.

use crate::types::{Edge, NodeId, PipelineId};
use crate::validation::{Diagnostic, Severity};
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for Pipewright operations.
#[derive(Error, Debug)]
pub enum PipelineError {
    // =========================================================================
    // Reference Errors (E100-E199)
    // =========================================================================
    /// A node references a type the registry does not know.
    #[error("E101: Unknown node type '{type_id}'")]
    NodeTypeNotFound {
        /// The unresolved type identifier.
        type_id: String,
    },

    /// Node not found in the pipeline.
    #[error("E102: Node '{node_id}' not found in pipeline")]
    NodeNotFound {
        /// The missing node.
        node_id: NodeId,
    },

    /// Edge not found in the pipeline.
    #[error("E103: Edge {edge} not found in pipeline")]
    EdgeNotFound {
        /// The missing edge.
        edge: Edge,
    },

    /// A node with this ID already exists.
    #[error("E104: Node '{node_id}' already exists")]
    DuplicateNode {
        /// The conflicting node ID.
        node_id: NodeId,
    },

    /// A configuration value does not match its field descriptor.
    #[error("E105: Invalid value for field '{field}' of node '{node_id}': {cause}")]
    InvalidConfigValue {
        /// The node being configured.
        node_id: NodeId,
        /// The offending field.
        field: String,
        /// Why the value was rejected.
        cause: String,
    },

    /// The configuration names a field the node type does not declare.
    #[error("E106: Node '{node_id}' of type '{type_id}' has no field '{field}'")]
    UnknownConfigField {
        /// The node being configured.
        node_id: NodeId,
        /// The node's type.
        type_id: String,
        /// The undeclared field.
        field: String,
    },

    /// A pipeline document with this ID already exists.
    #[error("E107: Pipeline '{pipeline_id}' already exists")]
    DuplicatePipeline {
        /// The conflicting pipeline ID.
        pipeline_id: PipelineId,
    },

    // =========================================================================
    // Topology Errors (E200-E299)
    // =========================================================================
    /// Adding the edge would close a cycle.
    #[error("E201: Edge {edge} would form a cycle")]
    CycleWouldForm {
        /// The rejected edge.
        edge: Edge,
    },

    /// The graph contains a cycle.
    #[error("E202: Cycle detected involving nodes: {nodes:?}")]
    CycleDetected {
        /// Nodes that could not be ordered.
        nodes: Vec<NodeId>,
    },

    /// The edge already exists.
    #[error("E203: Duplicate edge {edge}")]
    DuplicateEdge {
        /// The duplicated edge.
        edge: Edge,
    },

    /// The edge connects a node to itself.
    #[error("E204: Self-loop on node '{node_id}'")]
    SelfLoop {
        /// The node with the self-loop.
        node_id: NodeId,
    },

    // =========================================================================
    // Compilation Errors (E300-E399)
    // =========================================================================
    /// Validation produced blocking diagnostics.
    #[error("E301: Pipeline is not deployable: {}", summarize_blocking(.diagnostics))]
    NotDeployable {
        /// Every diagnostic of the failed validation run, not only errors.
        diagnostics: Vec<Diagnostic>,
    },

    // =========================================================================
    // Concurrency Errors (E400-E499)
    // =========================================================================
    /// The document moved past the version the caller worked against.
    #[error("E401: Stale version: expected {expected}, document is at {actual}")]
    StaleVersion {
        /// Version the caller expected.
        expected: u64,
        /// Current version of the document.
        actual: u64,
    },

    // =========================================================================
    // Configuration Errors (E500-E599)
    // =========================================================================
    /// A node type record was rejected at load time.
    #[error("E501: Invalid node type spec '{type_id}': {cause}")]
    InvalidNodeTypeSpec {
        /// The rejected type.
        type_id: String,
        /// Why it was rejected.
        cause: String,
    },

    /// A validation policy was rejected.
    #[error("E502: Invalid validation policy for rule '{rule}': {cause}")]
    InvalidPolicy {
        /// The rule being overridden.
        rule: String,
        /// Why the override was rejected.
        cause: String,
    },

    /// A size or count limit was exceeded.
    #[error("E503: Limit exceeded: {cause}")]
    LimitExceeded {
        /// Which limit and by how much.
        cause: String,
    },

    // =========================================================================
    // Serialization Errors (E600-E699)
    // =========================================================================
    /// Pipeline descriptor could not be parsed or produced.
    #[error("E601: Descriptor error: {0}")]
    Descriptor(#[from] serde_json::Error),

    /// YAML document could not be parsed.
    #[error("E602: YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // =========================================================================
    // I/O Errors (E900-E999)
    // =========================================================================
    /// File I/O error.
    #[error("E901: I/O error at {path}: {source}")]
    Io {
        /// The path being accessed.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

fn summarize_blocking(diagnostics: &[Diagnostic]) -> String {
    let errors: Vec<String> = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .map(ToString::to_string)
        .collect();
    format!("{} blocking diagnostic(s): {}", errors.len(), errors.join("; "))
}

impl PipelineError {
    /// Get the error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NodeTypeNotFound { .. } => "E101",
            Self::NodeNotFound { .. } => "E102",
            Self::EdgeNotFound { .. } => "E103",
            Self::DuplicateNode { .. } => "E104",
            Self::InvalidConfigValue { .. } => "E105",
            Self::UnknownConfigField { .. } => "E106",
            Self::DuplicatePipeline { .. } => "E107",
            Self::CycleWouldForm { .. } => "E201",
            Self::CycleDetected { .. } => "E202",
            Self::DuplicateEdge { .. } => "E203",
            Self::SelfLoop { .. } => "E204",
            Self::NotDeployable { .. } => "E301",
            Self::StaleVersion { .. } => "E401",
            Self::InvalidNodeTypeSpec { .. } => "E501",
            Self::InvalidPolicy { .. } => "E502",
            Self::LimitExceeded { .. } => "E503",
            Self::Descriptor(_) => "E601",
            Self::Yaml(_) => "E602",
            Self::Io { .. } => "E901",
        }
    }

    /// Check if this error is an unknown type, node or edge reference.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NodeTypeNotFound { .. } | Self::NodeNotFound { .. } | Self::EdgeNotFound { .. }
        )
    }

    /// Check if this error was raised to protect the graph's structure.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::CycleWouldForm { .. }
                | Self::CycleDetected { .. }
                | Self::DuplicateEdge { .. }
                | Self::SelfLoop { .. }
                | Self::DuplicateNode { .. }
        ) || self.is_not_found()
    }

    /// Check if the caller can recover by fixing input or retrying.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotDeployable { .. } | Self::StaleVersion { .. }
        )
    }

    /// The diagnostics carried by a `NotDeployable` error.
    pub fn diagnostics(&self) -> Option<&[Diagnostic]> {
        match self {
            Self::NotDeployable { diagnostics } => Some(diagnostics),
            _ => None,
        }
    }
}

/// Result type alias using `PipelineError`.
pub type Result<T> = std::result::Result<T, PipelineError>;
