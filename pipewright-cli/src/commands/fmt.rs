//! Fmt command - rewrite a descriptor in canonical form.

use super::read_descriptor;
use anyhow::{Context, Result};
use pipewright_core::Pipeline;
use pipewright_engine::config::EngineConfig;
use std::path::Path;

/// Run the fmt command.
pub fn run(file: &Path, check: bool, config: &EngineConfig) -> Result<()> {
    let content = read_descriptor(file)?;
    let canonical = canonicalize(&content, config)
        .with_context(|| format!("Invalid pipeline descriptor {}", file.display()))?;

    if canonical == content {
        tracing::debug!(file = %file.display(), "Already canonical");
        return Ok(());
    }

    if check {
        println!("✗ {} is not canonically formatted", file.display());
        anyhow::bail!("Formatting check failed");
    }

    std::fs::write(file, &canonical)
        .with_context(|| format!("Failed to write {}", file.display()))?;
    println!("✓ Formatted {}", file.display());
    Ok(())
}

/// Canonical form of a descriptor: sorted nodes, edges and config keys.
///
/// Unknown fields such as canvas positions are dropped.
fn canonicalize(content: &str, config: &EngineConfig) -> Result<String> {
    let pipeline = Pipeline::from_json_with_limits(content, &config.limits)?;
    Ok(pipeline.to_canonical_json()?)
}
