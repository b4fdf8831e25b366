//! CLI command implementations.

pub mod compile;
pub mod fmt;
pub mod types;
pub mod validate;

use anyhow::{Context, Result};
use pipewright_core::Pipeline;
use pipewright_engine::config::EngineConfig;
use std::path::Path;

/// Load the engine config from `path`, or from `$PIPEWRIGHT_CONFIG`.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => EngineConfig::from_env().context("Failed to load config from PIPEWRIGHT_CONFIG"),
    }
}

/// Read a pipeline descriptor file.
pub fn read_descriptor(file: &Path) -> Result<String> {
    if !file.exists() {
        anyhow::bail!("Pipeline file not found: {}", file.display());
    }
    std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))
}

/// Read and parse a pipeline descriptor, enforcing configured limits.
pub fn load_pipeline(file: &Path, config: &EngineConfig) -> Result<Pipeline> {
    let content = read_descriptor(file)?;
    Pipeline::from_json_with_limits(&content, &config.limits)
        .with_context(|| format!("Invalid pipeline descriptor {}", file.display()))
}
