//! Versioned pipeline document.

use crate::codegen::{ArtifactKind, CodeGenerator, CompiledArtifact};
use parking_lot::RwLock;
use pipewright_core::validation::ValidationReport;
use pipewright_core::{ConfigMap, Node, NodeId, Pipeline, PipelineError, PipelineId, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// A single mutation of a pipeline document.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    /// Add a node. Its type must exist in the registry.
    AddNode(Node),
    /// Remove a node and its incident edges.
    RemoveNode(NodeId),
    /// Connect two nodes.
    AddEdge {
        /// Upstream node.
        from: NodeId,
        /// Downstream node.
        to: NodeId,
    },
    /// Disconnect two nodes.
    RemoveEdge {
        /// Upstream node.
        from: NodeId,
        /// Downstream node.
        to: NodeId,
    },
    /// Replace a node's whole configuration.
    SetNodeConfig {
        /// Node to configure.
        node_id: NodeId,
        /// New configuration.
        config: ConfigMap,
    },
    /// Merge values into a node's configuration.
    UpdateNodeConfig {
        /// Node to configure.
        node_id: NodeId,
        /// Values to set.
        config: ConfigMap,
    },
    /// Change a node's label.
    SetNodeLabel {
        /// Node to relabel.
        node_id: NodeId,
        /// New label.
        label: String,
    },
    /// Rename the pipeline.
    Rename(String),
}

impl Edit {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddNode(_) => "add_node",
            Self::RemoveNode(_) => "remove_node",
            Self::AddEdge { .. } => "add_edge",
            Self::RemoveEdge { .. } => "remove_edge",
            Self::SetNodeConfig { .. } => "set_node_config",
            Self::UpdateNodeConfig { .. } => "update_node_config",
            Self::SetNodeLabel { .. } => "set_node_label",
            Self::Rename(_) => "rename",
        }
    }

    /// The node this edit targets, if any.
    pub fn node_id(&self) -> Option<&NodeId> {
        match self {
            Self::AddNode(node) => Some(&node.id),
            Self::RemoveNode(id) => Some(id),
            Self::SetNodeConfig { node_id, .. }
            | Self::UpdateNodeConfig { node_id, .. }
            | Self::SetNodeLabel { node_id, .. } => Some(node_id),
            Self::AddEdge { .. } | Self::RemoveEdge { .. } | Self::Rename(_) => None,
        }
    }
}

/// A consistent view of a document at one version.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// The pipeline at `version`.
    pub pipeline: Arc<Pipeline>,
    /// Document version.
    pub version: u64,
}

struct DocumentState {
    pipeline: Arc<Pipeline>,
    version: u64,
    /// Only ever holds artifacts for `version`.
    artifacts: HashMap<ArtifactKind, CompiledArtifact>,
}

/// Owns one pipeline and its version counter.
///
/// Mutations are serialized behind a write lock. Reads clone an
/// `Arc<Pipeline>` snapshot and validate or generate without holding any
/// lock; a mutation arriving meanwhile copies the pipeline instead of
/// touching the snapshot.
///
/// Every successful mutation bumps the version and drops cached artifacts.
/// A failed mutation changes nothing.
pub struct PipelineDocument {
    generator: CodeGenerator,
    state: RwLock<DocumentState>,
}

impl PipelineDocument {
    /// Create an empty document at version 0.
    pub fn new(
        id: impl Into<PipelineId>,
        name: impl Into<String>,
        generator: CodeGenerator,
    ) -> Self {
        Self::from_pipeline(Pipeline::new(id, name), generator)
    }

    /// Wrap an existing pipeline at version 0.
    pub fn from_pipeline(pipeline: Pipeline, generator: CodeGenerator) -> Self {
        Self {
            generator,
            state: RwLock::new(DocumentState {
                pipeline: Arc::new(pipeline),
                version: 0,
                artifacts: HashMap::new(),
            }),
        }
    }

    /// Load a document from a JSON descriptor, enforcing the validator's
    /// size limits.
    pub fn open(json: &str, generator: CodeGenerator) -> Result<Self> {
        let pipeline = Pipeline::from_json_with_limits(json, generator.validator().limits())?;
        tracing::debug!(
            pipeline_id = %pipeline.id(),
            nodes = pipeline.node_count(),
            edges = pipeline.edge_count(),
            "Opened pipeline document"
        );
        Ok(Self::from_pipeline(pipeline, generator))
    }

    /// Pipeline ID.
    pub fn id(&self) -> PipelineId {
        self.state.read().pipeline.id().clone()
    }

    /// Current version.
    pub fn version(&self) -> u64 {
        self.state.read().version
    }

    /// The current pipeline and version.
    pub fn snapshot(&self) -> Snapshot {
        let state = self.state.read();
        Snapshot {
            pipeline: Arc::clone(&state.pipeline),
            version: state.version,
        }
    }

    /// The generator used by `validate` and `compile`.
    pub fn generator(&self) -> &CodeGenerator {
        &self.generator
    }

    /// Apply an edit and return the new version.
    pub fn apply(&self, edit: Edit) -> Result<u64> {
        let mut state = self.state.write();
        self.apply_locked(&mut state, edit)
    }

    /// Apply an edit only if the document is still at `expected`.
    pub fn apply_at(&self, expected: u64, edit: Edit) -> Result<u64> {
        let mut state = self.state.write();
        if state.version != expected {
            return Err(PipelineError::StaleVersion {
                expected,
                actual: state.version,
            });
        }
        self.apply_locked(&mut state, edit)
    }

    fn apply_locked(&self, state: &mut DocumentState, edit: Edit) -> Result<u64> {
        let kind = edit.name();
        let node_id = edit.node_id().cloned();

        let result = self
            .check_edit(&state.pipeline, &edit)
            .and_then(|()| mutate(Arc::make_mut(&mut state.pipeline), edit));
        if let Err(e) = result {
            tracing::debug!(
                pipeline_id = %state.pipeline.id(),
                version = state.version,
                edit = kind,
                error = %e,
                "Edit rejected"
            );
            return Err(e);
        }

        state.version += 1;
        state.artifacts.clear();

        tracing::debug!(
            pipeline_id = %state.pipeline.id(),
            version = state.version,
            edit = kind,
            node_id = node_id.as_ref().map(NodeId::as_str),
            "Edit applied"
        );
        Ok(state.version)
    }

    /// Registry and config checks that the graph itself does not perform.
    ///
    /// Missing required fields are left to validation: a node may be placed
    /// on the canvas before it is configured.
    fn check_edit(&self, pipeline: &Pipeline, edit: &Edit) -> Result<()> {
        let registry = self.generator.registry();
        match edit {
            Edit::AddNode(node) => {
                let spec = registry.lookup(&node.node_type)?;
                node.check_config(spec)
            }
            Edit::SetNodeConfig { node_id, config } => {
                let node = pipeline.require_node(node_id.as_str())?;
                let spec = registry.lookup(&node.node_type)?;
                node.clone().with_config_map(config.clone()).check_config(spec)
            }
            Edit::UpdateNodeConfig { node_id, config } => {
                let node = pipeline.require_node(node_id.as_str())?;
                let spec = registry.lookup(&node.node_type)?;
                let mut merged = node.clone();
                merged.config.extend(config.clone());
                merged.check_config(spec)
            }
            _ => Ok(()),
        }
    }

    /// Add a node.
    pub fn add_node(&self, node: Node) -> Result<u64> {
        self.apply(Edit::AddNode(node))
    }

    /// Remove a node and its incident edges.
    pub fn remove_node(&self, id: impl Into<NodeId>) -> Result<u64> {
        self.apply(Edit::RemoveNode(id.into()))
    }

    /// Connect two nodes.
    pub fn add_edge(&self, from: impl Into<NodeId>, to: impl Into<NodeId>) -> Result<u64> {
        self.apply(Edit::AddEdge {
            from: from.into(),
            to: to.into(),
        })
    }

    /// Disconnect two nodes.
    pub fn remove_edge(&self, from: impl Into<NodeId>, to: impl Into<NodeId>) -> Result<u64> {
        self.apply(Edit::RemoveEdge {
            from: from.into(),
            to: to.into(),
        })
    }

    /// Replace a node's configuration.
    pub fn set_node_config(&self, node_id: impl Into<NodeId>, config: ConfigMap) -> Result<u64> {
        self.apply(Edit::SetNodeConfig {
            node_id: node_id.into(),
            config,
        })
    }

    /// Merge values into a node's configuration.
    pub fn update_node_config(&self, node_id: impl Into<NodeId>, config: ConfigMap) -> Result<u64> {
        self.apply(Edit::UpdateNodeConfig {
            node_id: node_id.into(),
            config,
        })
    }

    /// Change a node's label.
    pub fn set_node_label(
        &self,
        node_id: impl Into<NodeId>,
        label: impl Into<String>,
    ) -> Result<u64> {
        self.apply(Edit::SetNodeLabel {
            node_id: node_id.into(),
            label: label.into(),
        })
    }

    /// Rename the pipeline.
    pub fn rename(&self, name: impl Into<String>) -> Result<u64> {
        self.apply(Edit::Rename(name.into()))
    }

    /// Validate the current version.
    pub fn validate(&self) -> ValidationReport {
        let snapshot = self.snapshot();
        let report = self
            .generator
            .validator()
            .validate(&snapshot.pipeline, self.generator.registry());
        tracing::debug!(
            pipeline_id = %snapshot.pipeline.id(),
            version = snapshot.version,
            diagnostics = report.len(),
            deployable = report.is_deployable(),
            "Validated pipeline document"
        );
        report
    }

    /// Canonical JSON of the current version, without validation.
    pub fn to_json(&self) -> Result<String> {
        self.snapshot().pipeline.to_canonical_json()
    }

    /// The cached artifact of this kind for the current version.
    pub fn cached(&self, kind: ArtifactKind) -> Option<CompiledArtifact> {
        self.state.read().artifacts.get(&kind).cloned()
    }

    /// Validate and generate an artifact for the current version.
    ///
    /// Served from cache when the version has not moved. Fails with
    /// `StaleVersion` if a mutation lands while generating; the result is
    /// then discarded.
    pub fn compile(&self, kind: ArtifactKind) -> Result<CompiledArtifact> {
        let snapshot = {
            let state = self.state.read();
            if let Some(artifact) = state.artifacts.get(&kind) {
                tracing::trace!(
                    pipeline_id = %state.pipeline.id(),
                    version = state.version,
                    kind = %kind,
                    "Artifact served from cache"
                );
                return Ok(artifact.clone());
            }
            Snapshot {
                pipeline: Arc::clone(&state.pipeline),
                version: state.version,
            }
        };

        let artifact = self
            .generator
            .compile(&snapshot.pipeline, kind, snapshot.version)?;
        self.commit_artifact(artifact.clone())?;

        tracing::info!(
            pipeline_id = %artifact.pipeline_id,
            version = artifact.version,
            kind = %kind,
            bytes = artifact.text.len(),
            "Compiled pipeline"
        );
        Ok(artifact)
    }

    /// Cache an artifact if it still matches the current version.
    pub(crate) fn commit_artifact(&self, artifact: CompiledArtifact) -> Result<()> {
        let mut state = self.state.write();
        if state.version != artifact.version {
            tracing::warn!(
                pipeline_id = %artifact.pipeline_id,
                compiled = artifact.version,
                current = state.version,
                kind = %artifact.kind,
                "Discarding artifact for superseded version"
            );
            return Err(PipelineError::StaleVersion {
                expected: artifact.version,
                actual: state.version,
            });
        }
        state.artifacts.insert(artifact.kind, artifact);
        Ok(())
    }
}

/// Apply an edit to the graph. Each graph operation checks its invariants
/// before touching anything.
fn mutate(pipeline: &mut Pipeline, edit: Edit) -> Result<()> {
    match edit {
        Edit::AddNode(node) => pipeline.add_node(node),
        Edit::RemoveNode(id) => pipeline.remove_node(id.as_str()).map(drop),
        Edit::AddEdge { from, to } => pipeline.add_edge(from.as_str(), to.as_str()),
        Edit::RemoveEdge { from, to } => pipeline.remove_edge(from.as_str(), to.as_str()),
        Edit::SetNodeConfig { node_id, config } => {
            pipeline.node_mut(node_id.as_str())?.config = config;
            Ok(())
        }
        Edit::UpdateNodeConfig { node_id, config } => {
            pipeline.node_mut(node_id.as_str())?.config.extend(config);
            Ok(())
        }
        Edit::SetNodeLabel { node_id, label } => {
            pipeline.node_mut(node_id.as_str())?.label = label;
            Ok(())
        }
        Edit::Rename(name) => {
            pipeline.set_name(name);
            Ok(())
        }
    }
}

impl std::fmt::Debug for PipelineDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("PipelineDocument")
            .field("id", state.pipeline.id())
            .field("version", &state.version)
            .field("nodes", &state.pipeline.node_count())
            .field("cached", &state.artifacts.len())
            .finish()
    }
}
