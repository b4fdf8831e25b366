//! Pipewright Engine - code generation and pipeline documents.
//!
//! This crate builds on `pipewright-core`:
//! - SQL statement chains and canonical JSON from validated pipelines
//! - Versioned pipeline documents with cached artifacts
//! - A store of independent documents
//! - YAML engine configuration (rule policy, limits, extra node types)
//! - Logging setup

#![warn(missing_docs)]

pub mod codegen;
pub mod config;
pub mod document;
pub mod observability;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::codegen::{
        ArtifactKind, CodeGenerator, CompiledArtifact, Emitter, JsonEmitter, SqlEmitter,
    };
    pub use crate::config::EngineConfig;
    pub use crate::document::{DocumentStore, Edit, PipelineDocument, Snapshot};
    pub use crate::observability::{LogFormat, TracingConfig, init_tracing};
}
