//! Engine configuration from YAML.
//!
//! ```yaml
//! policy:
//!   recommended_config: error
//! limits:
//!   max_node_count: 200
//! registry: node-types.yaml
//! ```
//!
//! Every section is optional. A relative `registry` path is resolved against
//! the directory of the configuration file.

use crate::codegen::CodeGenerator;
use pipewright_core::validation::{ValidationLimits, ValidationPolicy};
use pipewright_core::{NodeTypeRegistry, PipelineError, PipelineValidator, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Environment variable naming the default configuration file.
pub const CONFIG_ENV: &str = "PIPEWRIGHT_CONFIG";

/// Engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Rule severity overrides.
    pub policy: ValidationPolicy,
    /// Size limits.
    pub limits: ValidationLimits,
    /// Extra node type specs merged into the built-in catalog.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry: Option<PathBuf>,
}

impl EngineConfig {
    /// Parse configuration from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PipelineError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut config = Self::from_yaml(&content)?;

        if let Some(registry) = &config.registry {
            if registry.is_relative() {
                if let Some(dir) = path.parent() {
                    config.registry = Some(dir.join(registry));
                }
            }
        }

        tracing::debug!(path = %path.display(), "Loaded engine config");
        Ok(config)
    }

    /// Load from the file named by `PIPEWRIGHT_CONFIG`, or defaults if unset.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    /// Build the registry: built-in catalog plus any configured extras.
    pub fn build_registry(&self) -> Result<NodeTypeRegistry> {
        let mut registry = NodeTypeRegistry::builtin();
        if let Some(path) = &self.registry {
            let specs = NodeTypeRegistry::load_file(path)?;
            let count = specs.len();
            registry.extend(specs)?;
            tracing::info!(path = %path.display(), count, "Loaded extra node types");
        }
        Ok(registry)
    }

    /// Build a validator from the policy and limits.
    pub fn validator(&self) -> PipelineValidator {
        PipelineValidator::new()
            .with_limits(self.limits.clone())
            .with_policy(self.policy.clone())
    }

    /// Build a code generator sharing one registry.
    pub fn code_generator(&self) -> Result<CodeGenerator> {
        let registry = Arc::new(self.build_registry()?);
        Ok(CodeGenerator::new(registry).with_validator(self.validator()))
    }
}
