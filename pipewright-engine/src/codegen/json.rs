//! Canonical JSON descriptor emitter.

use super::{ArtifactKind, Emitter};
use pipewright_core::{NodeTypeRegistry, Pipeline, Result};

/// Emits the canonical descriptor.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEmitter;

impl Emitter for JsonEmitter {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Json
    }

    fn emit(&self, pipeline: &Pipeline, _registry: &NodeTypeRegistry) -> Result<String> {
        pipeline.to_canonical_json()
    }
}
