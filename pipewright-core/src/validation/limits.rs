//! Size limits for pipelines and descriptors.

use super::diagnostic::{Diagnostic, RuleId};
use crate::error::{PipelineError, Result};
use crate::pipeline::Pipeline;
use serde::{Deserialize, Serialize};

/// Limits that keep oversized pipelines out of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationLimits {
    /// Maximum number of nodes in a pipeline (default: 1000).
    pub max_node_count: usize,
    /// Maximum number of edges in a pipeline (default: 5000).
    pub max_edge_count: usize,
    /// Maximum descriptor size in bytes (default: 10MB).
    pub max_descriptor_size: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_node_count: 1000,
            max_edge_count: 5000,
            max_descriptor_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

impl ValidationLimits {
    /// Create limits with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum node count.
    pub fn with_max_node_count(mut self, count: usize) -> Self {
        self.max_node_count = count;
        self
    }

    /// Set maximum edge count.
    pub fn with_max_edge_count(mut self, count: usize) -> Self {
        self.max_edge_count = count;
        self
    }

    /// Set maximum descriptor size.
    pub fn with_max_descriptor_size(mut self, size: usize) -> Self {
        self.max_descriptor_size = size;
        self
    }

    /// Check raw descriptor size before parsing.
    pub fn validate_content_size(&self, content: &str) -> Result<()> {
        if content.len() > self.max_descriptor_size {
            return Err(PipelineError::LimitExceeded {
                cause: format!(
                    "descriptor size ({} bytes) exceeds maximum allowed ({} bytes)",
                    content.len(),
                    self.max_descriptor_size
                ),
            });
        }
        Ok(())
    }

    /// Check node and edge counts, one error diagnostic per exceeded limit.
    pub fn check(&self, pipeline: &Pipeline) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        if pipeline.node_count() > self.max_node_count {
            diagnostics.push(Diagnostic::error(
                RuleId::Limits,
                format!(
                    "node count ({}) exceeds maximum allowed ({})",
                    pipeline.node_count(),
                    self.max_node_count
                ),
            ));
        }

        if pipeline.edge_count() > self.max_edge_count {
            diagnostics.push(Diagnostic::error(
                RuleId::Limits,
                format!(
                    "edge count ({}) exceeds maximum allowed ({})",
                    pipeline.edge_count(),
                    self.max_edge_count
                ),
            ));
        }

        diagnostics
    }
}
