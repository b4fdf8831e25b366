//! Compile command - generate SQL or canonical JSON from a descriptor.

use super::load_pipeline;
use anyhow::{Context, Result};
use pipewright_core::PipelineError;
use pipewright_engine::codegen::{ArtifactKind, CompiledArtifact};
use pipewright_engine::config::EngineConfig;
use pipewright_engine::document::PipelineDocument;
use std::path::Path;

/// Run the compile command.
pub fn run(
    file: &Path,
    target: ArtifactKind,
    output: Option<&Path>,
    config: &EngineConfig,
) -> Result<()> {
    let artifact = compile(file, target, config)?;

    match output {
        Some(path) => {
            std::fs::write(path, &artifact.text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "✓ Compiled {} to {} ({} bytes)",
                file.display(),
                path.display(),
                artifact.text.len()
            );
        }
        None => print!("{}", artifact.text),
    }
    Ok(())
}

/// Load, validate and compile a descriptor.
pub fn compile(
    file: &Path,
    target: ArtifactKind,
    config: &EngineConfig,
) -> Result<CompiledArtifact> {
    let pipeline = load_pipeline(file, config)?;
    let document = PipelineDocument::from_pipeline(pipeline, config.code_generator()?);

    tracing::info!(file = %file.display(), target = %target, "Compiling pipeline");

    match document.compile(target) {
        Ok(artifact) => Ok(artifact),
        Err(PipelineError::NotDeployable { diagnostics }) => {
            eprintln!("✗ Pipeline is not deployable:");
            for diagnostic in diagnostics.iter().filter(|d| d.is_error()) {
                eprintln!("  - {}", diagnostic);
            }
            anyhow::bail!("Compilation of {} failed", file.display())
        }
        Err(e) => Err(e).with_context(|| format!("Compilation of {} failed", file.display())),
    }
}
