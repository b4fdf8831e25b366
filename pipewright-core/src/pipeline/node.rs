//! Pipeline nodes.

use crate::error::{PipelineError, Result};
use crate::registry::NodeTypeSpec;
use crate::types::NodeId;
use crate::value::{ConfigMap, ConfigValue};

/// A node in a pipeline.
///
/// Position, selection and other canvas state belong to the presentation
/// layer and are deliberately absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Node ID, unique within the pipeline.
    pub id: NodeId,
    /// Registry type ID (e.g. "transform-filter").
    pub node_type: String,
    /// Human label shown on the canvas.
    pub label: String,
    /// Configuration values by field name.
    pub config: ConfigMap,
}

impl Node {
    /// Create a node with an empty label and configuration.
    pub fn new(id: impl Into<NodeId>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            label: String::new(),
            config: ConfigMap::new(),
        }
    }

    /// Set the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set one configuration value.
    pub fn with_config(mut self, field: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.config.insert(field.into(), value.into());
        self
    }

    /// Replace the whole configuration.
    pub fn with_config_map(mut self, config: ConfigMap) -> Self {
        self.config = config;
        self
    }

    /// Label if set, otherwise the ID.
    pub fn display_name(&self) -> &str {
        if self.label.is_empty() {
            self.id.as_str()
        } else {
            &self.label
        }
    }

    /// Get a raw configuration value.
    pub fn get(&self, field: &str) -> Option<&ConfigValue> {
        self.config.get(field)
    }

    /// Get a configuration value, falling back to the node type's default.
    pub fn effective<'a>(&'a self, spec: &'a NodeTypeSpec, field: &str) -> Option<&'a ConfigValue> {
        self.config
            .get(field)
            .or_else(|| spec.field(field).and_then(|f| f.default.as_ref()))
    }

    /// Check that a field is present and not blank.
    ///
    /// A declared default counts as present.
    pub fn has_value(&self, spec: &NodeTypeSpec, field: &str) -> bool {
        self.effective(spec, field).is_some_and(|v| !v.is_empty())
    }

    /// Check every configured value against the node type's field descriptors.
    ///
    /// Missing required fields are not an error here; blank values are
    /// treated as absent.
    pub fn check_config(&self, spec: &NodeTypeSpec) -> Result<()> {
        for (name, value) in &self.config {
            let field = spec
                .field(name)
                .ok_or_else(|| PipelineError::UnknownConfigField {
                    node_id: self.id.clone(),
                    type_id: spec.id.clone(),
                    field: name.clone(),
                })?;
            if value.is_empty() {
                continue;
            }
            if let Some(cause) = field.check(value) {
                return Err(PipelineError::InvalidConfigValue {
                    node_id: self.id.clone(),
                    field: name.clone(),
                    cause,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::NodeTypeRegistry;

    #[test]
    fn node_builder() {
        let node = Node::new("B", "transform-filter")
            .with_label("Filter Active")
            .with_config("condition", "status = 'active'");

        assert_eq!(node.id, NodeId::new("B"));
        assert_eq!(node.display_name(), "Filter Active");
        assert_eq!(
            node.get("condition").and_then(ConfigValue::as_str),
            Some("status = 'active'")
        );
    }

    #[test]
    fn display_name_falls_back_to_id() {
        assert_eq!(Node::new("orders", "source-pg").display_name(), "orders");
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let registry = NodeTypeRegistry::builtin();
        let spec = registry.lookup("target-pg").unwrap();
        let node = Node::new("C", "target-pg");

        assert_eq!(
            node.effective(spec, "load_strategy"),
            Some(&ConfigValue::string("append"))
        );
        assert!(node.has_value(spec, "load_strategy"));
        assert!(!node.has_value(spec, "table"));

        let node = node.with_config("load_strategy", "merge");
        assert_eq!(
            node.effective(spec, "load_strategy").and_then(ConfigValue::as_str),
            Some("merge")
        );
    }

    #[test]
    fn config_checked_against_node_type() {
        let registry = NodeTypeRegistry::builtin();
        let spec = registry.lookup("quality-check").unwrap();

        let node = Node::new("Q", "quality-check")
            .with_config("rule", "uniqueness")
            .with_config("threshold", 99_i64)
            .with_config("column", "");
        assert!(node.check_config(spec).is_ok());

        let err = node.clone().with_config("mode", "explode").check_config(spec).unwrap_err();
        assert_eq!(err.code(), "E105");

        let err = node.with_config("severity", "high").check_config(spec).unwrap_err();
        assert_eq!(err.code(), "E106");
    }
}
