//! Code generation.
//!
//! Generation is a pure function of a validated pipeline: the same pipeline
//! always yields byte-identical output. Pipelines with blocking diagnostics
//! are refused with `NotDeployable`.

mod json;
mod naming;
mod sql;

pub use json::JsonEmitter;
pub use naming::{VIEW_PREFIX, quote_ident, relation_names, sanitize, table_ref};
pub use sql::SqlEmitter;

use pipewright_core::{
    NodeTypeRegistry, Pipeline, PipelineError, PipelineId, PipelineValidator, Result,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Kind of generated artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// SQL statement chain.
    Sql,
    /// Canonical JSON descriptor.
    Json,
}

impl ArtifactKind {
    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sql => "sql",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sql" => Ok(Self::Sql),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown artifact kind '{}'", other)),
        }
    }
}

/// Generated output for one version of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledArtifact {
    /// Artifact kind.
    pub kind: ArtifactKind,
    /// Generated text.
    pub text: String,
    /// Pipeline it was generated from.
    pub pipeline_id: PipelineId,
    /// Document version it was generated from.
    pub version: u64,
}

/// Renders a pipeline into text.
///
/// Emitters run only on pipelines that passed validation.
pub trait Emitter: Send + Sync {
    /// Kind of artifact produced.
    fn kind(&self) -> ArtifactKind;

    /// Render the pipeline.
    fn emit(&self, pipeline: &Pipeline, registry: &NodeTypeRegistry) -> Result<String>;
}

/// Validates pipelines and dispatches them to an emitter.
#[derive(Clone)]
pub struct CodeGenerator {
    registry: Arc<NodeTypeRegistry>,
    validator: PipelineValidator,
}

impl CodeGenerator {
    /// Create a generator with the default validator.
    pub fn new(registry: Arc<NodeTypeRegistry>) -> Self {
        Self {
            registry,
            validator: PipelineValidator::new(),
        }
    }

    /// Set the validator used before generation.
    pub fn with_validator(mut self, validator: PipelineValidator) -> Self {
        self.validator = validator;
        self
    }

    /// The registry used for lookups.
    pub fn registry(&self) -> &Arc<NodeTypeRegistry> {
        &self.registry
    }

    /// The validator run before generation.
    pub fn validator(&self) -> &PipelineValidator {
        &self.validator
    }

    /// Validate and render a pipeline.
    pub fn generate(&self, pipeline: &Pipeline, kind: ArtifactKind) -> Result<String> {
        let report = self.validator.validate(pipeline, &self.registry);
        if !report.is_deployable() {
            return Err(PipelineError::NotDeployable {
                diagnostics: report.into_diagnostics(),
            });
        }
        self.emitter(kind).emit(pipeline, &self.registry)
    }

    /// Validate and render a pipeline, stamping the result with `version`.
    pub fn compile(
        &self,
        pipeline: &Pipeline,
        kind: ArtifactKind,
        version: u64,
    ) -> Result<CompiledArtifact> {
        let text = self.generate(pipeline, kind)?;
        Ok(CompiledArtifact {
            kind,
            text,
            pipeline_id: pipeline.id().clone(),
            version,
        })
    }

    fn emitter(&self, kind: ArtifactKind) -> &'static dyn Emitter {
        match kind {
            ArtifactKind::Sql => &SqlEmitter,
            ArtifactKind::Json => &JsonEmitter,
        }
    }
}

impl fmt::Debug for CodeGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodeGenerator")
            .field("node_types", &self.registry.len())
            .field("validator", &self.validator)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipewright_core::Node;

    fn generator() -> CodeGenerator {
        CodeGenerator::new(Arc::new(NodeTypeRegistry::builtin()))
    }

    fn pipeline() -> Pipeline {
        let mut pipeline = Pipeline::new("daily-orders", "Daily orders");
        pipeline
            .add_node(
                Node::new("A", "source-pg")
                    .with_config("connection", "warehouse")
                    .with_config("table", "orders"),
            )
            .unwrap();
        pipeline
            .add_node(
                Node::new("B", "transform-filter").with_config("condition", "status = 'active'"),
            )
            .unwrap();
        pipeline
            .add_node(
                Node::new("C", "target-pg")
                    .with_config("connection", "warehouse")
                    .with_config("table", "daily_orders"),
            )
            .unwrap();
        pipeline.add_edge("A", "B").unwrap();
        pipeline.add_edge("B", "C").unwrap();
        pipeline
    }

    #[test]
    fn artifact_kind_parse() {
        assert_eq!("SQL".parse::<ArtifactKind>(), Ok(ArtifactKind::Sql));
        assert!("yaml".parse::<ArtifactKind>().is_err());
    }

    #[test]
    fn sql_chain_for_linear_pipeline() {
        let sql = generator().generate(&pipeline(), ArtifactKind::Sql).unwrap();
        assert!(sql.contains("CREATE OR REPLACE TEMPORARY VIEW pw_A AS\nSELECT * FROM orders;"));
        assert!(sql.contains(
            "CREATE OR REPLACE TEMPORARY VIEW pw_B AS\nSELECT * FROM pw_A WHERE status = 'active';"
        ));
        assert!(sql.contains("INSERT INTO daily_orders\nSELECT * FROM pw_B;"));
        assert!(sql.find("VIEW pw_B").unwrap() < sql.find("INSERT INTO").unwrap());
    }

    #[test]
    fn refuses_undeployable_pipeline() {
        let mut pipeline = pipeline();
        pipeline.remove_edge("A", "B").unwrap();

        let err = generator().generate(&pipeline, ArtifactKind::Json).unwrap_err();
        assert_eq!(err.code(), "E301");
        let diags = err.diagnostics().unwrap();
        assert!(diags.iter().any(|d| d.message.contains("no incoming connections")));
    }

    #[test]
    fn compile_stamps_version() {
        let artifact = generator().compile(&pipeline(), ArtifactKind::Json, 7).unwrap();
        assert_eq!(artifact.version, 7);
        assert_eq!(artifact.pipeline_id.as_str(), "daily-orders");
        assert_eq!(artifact.text, pipeline().to_canonical_json().unwrap());
    }
}
