//! Node type registry.
//!
//! The registry is the catalog of [`NodeTypeSpec`]s every pipeline is checked
//! against. It is built once (from the built-in catalog, plus optional records
//! loaded from YAML or JSON) and then shared read-only, typically behind an
//! `Arc`.
//!
//! Malformed records are rejected while loading:
//!
//! - empty or duplicate type IDs
//! - duplicate field names within a type
//! - `enum` fields without options
//! - defaults that do not fit their field

mod builtin;
mod spec;

pub use builtin::{FILE_FORMATS, LOAD_STRATEGIES, QUALITY_MODES, QUALITY_RULES};
pub use spec::{Category, FieldSpec, NodeTypeSpec, ValueType};

use crate::error::{PipelineError, Result};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Read-only catalog of node types.
#[derive(Debug, Clone, Default)]
pub struct NodeTypeRegistry {
    types: BTreeMap<String, NodeTypeSpec>,
}

impl NodeTypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in catalog.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for spec in builtin::catalog() {
            registry.types.insert(spec.id.clone(), spec);
        }
        registry
    }

    /// Create a registry from a list of specs, rejecting malformed records.
    pub fn from_specs(specs: Vec<NodeTypeSpec>) -> Result<Self> {
        let mut registry = Self::new();
        registry.extend(specs)?;
        Ok(registry)
    }

    /// Parse a YAML list of node type specs.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let specs: Vec<NodeTypeSpec> = serde_yaml::from_str(yaml)?;
        Self::from_specs(specs)
    }

    /// Parse a JSON array of node type specs.
    pub fn from_json(json: &str) -> Result<Self> {
        let specs: Vec<NodeTypeSpec> = serde_json::from_str(json)?;
        Self::from_specs(specs)
    }

    /// Load specs from a file; `.json` files are parsed as JSON, anything
    /// else as YAML.
    pub fn load_file(path: &Path) -> Result<Vec<NodeTypeSpec>> {
        let content = std::fs::read_to_string(path).map_err(|e| PipelineError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        if is_json {
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(serde_yaml::from_str(&content)?)
        }
    }

    /// Add specs to the registry.
    ///
    /// All records are checked before any is inserted, so a rejected batch
    /// leaves the registry unchanged.
    pub fn extend(&mut self, specs: Vec<NodeTypeSpec>) -> Result<()> {
        let mut batch_ids = HashSet::new();
        for spec in &specs {
            check_spec(spec)?;
            if self.types.contains_key(&spec.id) || !batch_ids.insert(spec.id.as_str()) {
                return Err(PipelineError::InvalidNodeTypeSpec {
                    type_id: spec.id.clone(),
                    cause: "duplicate type id".to_string(),
                });
            }
        }

        for spec in specs {
            tracing::debug!(type_id = %spec.id, category = %spec.category, "Registered node type");
            self.types.insert(spec.id.clone(), spec);
        }
        Ok(())
    }

    /// Look up a node type.
    pub fn lookup(&self, type_id: &str) -> Result<&NodeTypeSpec> {
        self.types
            .get(type_id)
            .ok_or_else(|| PipelineError::NodeTypeNotFound {
                type_id: type_id.to_string(),
            })
    }

    /// Get a node type if it exists.
    pub fn get(&self, type_id: &str) -> Option<&NodeTypeSpec> {
        self.types.get(type_id)
    }

    /// Check if a type exists.
    pub fn contains(&self, type_id: &str) -> bool {
        self.types.contains_key(type_id)
    }

    /// List node types in ascending ID order, optionally filtered by category.
    pub fn list(&self, category: Option<Category>) -> Vec<&NodeTypeSpec> {
        self.types
            .values()
            .filter(|spec| category.is_none_or(|c| spec.category == c))
            .collect()
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

fn check_spec(spec: &NodeTypeSpec) -> Result<()> {
    let invalid = |cause: String| PipelineError::InvalidNodeTypeSpec {
        type_id: spec.id.clone(),
        cause,
    };

    if spec.id.trim().is_empty() {
        return Err(invalid("type id cannot be empty".to_string()));
    }

    let mut seen = HashSet::new();
    for field in &spec.fields {
        if field.name.trim().is_empty() {
            return Err(invalid("field name cannot be empty".to_string()));
        }
        if !seen.insert(field.name.as_str()) {
            return Err(invalid(format!("duplicate field '{}'", field.name)));
        }
        if field.value_type == ValueType::Enum && field.options.is_empty() {
            return Err(invalid(format!(
                "enum field '{}' declares no options",
                field.name
            )));
        }
        if let Some(default) = &field.default {
            if let Some(cause) = field.check(default) {
                return Err(invalid(format!(
                    "default of field '{}' is invalid: {}",
                    field.name, cause
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ConfigValue;

    #[test]
    fn builtin_catalog() {
        let registry = NodeTypeRegistry::builtin();
        assert_eq!(registry.len(), 11);
        assert_eq!(
            registry.lookup("transform-filter").unwrap().category,
            Category::Transform
        );
        assert_eq!(registry.list(Some(Category::Source)).len(), 4);
        assert_eq!(registry.list(Some(Category::Target)).len(), 3);
        assert_eq!(registry.list(Some(Category::QualityCheck)).len(), 1);
    }

    #[test]
    fn builtin_catalog_passes_load_checks() {
        let specs: Vec<_> = NodeTypeRegistry::builtin()
            .list(None)
            .into_iter()
            .cloned()
            .collect();
        assert!(NodeTypeRegistry::from_specs(specs).is_ok());
    }

    #[test]
    fn list_is_sorted_by_id() {
        let registry = NodeTypeRegistry::builtin();
        let ids: Vec<_> = registry.list(None).iter().map(|s| s.id.as_str()).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn unknown_type_is_not_found() {
        let registry = NodeTypeRegistry::builtin();
        let err = registry.lookup("transform-pivot").unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("transform-pivot"));
    }

    #[test]
    fn reject_duplicate_type_ids() {
        let specs = vec![
            NodeTypeSpec::new("dup", Category::Source),
            NodeTypeSpec::new("dup", Category::Target),
        ];
        let err = NodeTypeRegistry::from_specs(specs).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidNodeTypeSpec { .. }));
    }

    #[test]
    fn reject_enum_without_options() {
        let spec = NodeTypeSpec::new("bad", Category::Transform)
            .with_field(FieldSpec::required("mode", ValueType::Enum));
        let err = NodeTypeRegistry::from_specs(vec![spec]).unwrap_err();
        assert!(err.to_string().contains("declares no options"));
    }

    #[test]
    fn reject_mistyped_default() {
        let spec = NodeTypeSpec::new("bad", Category::Transform)
            .with_field(FieldSpec::optional("limit", ValueType::Number).with_default("ten"));
        let err = NodeTypeRegistry::from_specs(vec![spec]).unwrap_err();
        assert!(err.to_string().contains("default of field 'limit'"));
    }

    #[test]
    fn reject_duplicate_fields() {
        let spec = NodeTypeSpec::new("bad", Category::Source)
            .with_field(FieldSpec::required("table", ValueType::String))
            .with_field(FieldSpec::optional("table", ValueType::String));
        assert!(NodeTypeRegistry::from_specs(vec![spec]).is_err());
    }

    #[test]
    fn rejected_batch_leaves_registry_unchanged() {
        let mut registry = NodeTypeRegistry::builtin();
        let before = registry.len();
        let specs = vec![
            NodeTypeSpec::new("transform-dedupe", Category::Transform),
            NodeTypeSpec::new("source-pg", Category::Source),
        ];
        assert!(registry.extend(specs).is_err());
        assert_eq!(registry.len(), before);
        assert!(!registry.contains("transform-dedupe"));
    }

    #[test]
    fn load_from_yaml() {
        let yaml = r#"
- id: transform-limit
  category: transform
  fields:
    - name: rows
      type: number
      required: true
      default: 100
"#;
        let registry = NodeTypeRegistry::from_yaml(yaml).unwrap();
        let spec = registry.lookup("transform-limit").unwrap();
        assert_eq!(spec.field("rows").unwrap().default, Some(ConfigValue::int(100)));
    }

    #[test]
    fn load_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("types.json");
        std::fs::write(
            &path,
            r#"[{"id":"target-s3","category":"target",
                 "fields":[{"name":"bucket","type":"string","required":true}]}]"#,
        )
        .unwrap();

        let specs = NodeTypeRegistry::load_file(&path).unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].category, Category::Target);
    }
}
