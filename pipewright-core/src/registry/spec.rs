//! Node type specifications.

use crate::value::ConfigValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Node category, which determines connectivity rules and code generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    /// Reads a base relation.
    Source,
    /// Derives a relation from its inputs.
    Transform,
    /// Writes its input somewhere.
    Target,
    /// Asserts a property of its input without changing rows.
    QualityCheck,
}

impl Category {
    /// The category's wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Transform => "transform",
            Self::Target => "target",
            Self::QualityCheck => "qualityCheck",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "source" => Ok(Self::Source),
            "transform" => Ok(Self::Transform),
            "target" => Ok(Self::Target),
            "qualityCheck" | "quality-check" | "quality_check" => Ok(Self::QualityCheck),
            other => Err(format!("unknown category '{}'", other)),
        }
    }
}

/// Type of a configuration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Free text.
    String,
    /// Integer or float.
    Number,
    /// True or false.
    Boolean,
    /// One of the field's `options`.
    Enum,
    /// List of strings.
    List,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Enum => "enum",
            Self::List => "list",
        };
        f.write_str(s)
    }
}

/// Descriptor of one configuration field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name as it appears in a node's config map.
    pub name: String,
    /// Expected value type.
    #[serde(rename = "type")]
    pub value_type: ValueType,
    /// Whether the field must be present and non-empty.
    #[serde(default)]
    pub required: bool,
    /// Value used when the field is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<ConfigValue>,
    /// Allowed values for `enum` fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl FieldSpec {
    /// Create a required field.
    pub fn required(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            required: true,
            default: None,
            options: Vec::new(),
        }
    }

    /// Create an optional field.
    pub fn optional(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            required: false,
            ..Self::required(name, value_type)
        }
    }

    /// Set the default value.
    pub fn with_default(mut self, value: impl Into<ConfigValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Set the enum options.
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Check a value against this field.
    ///
    /// Returns a description of the mismatch, or `None` if the value fits.
    pub fn check(&self, value: &ConfigValue) -> Option<String> {
        let fits = match (self.value_type, value) {
            (ValueType::String, ConfigValue::String(_))
            | (ValueType::Number, ConfigValue::Number(_))
            | (ValueType::Boolean, ConfigValue::Bool(_))
            | (ValueType::List, ConfigValue::List(_)) => true,
            (ValueType::Enum, ConfigValue::String(s)) => {
                if !self.options.iter().any(|o| o == s) {
                    return Some(format!(
                        "'{}' is not one of [{}]",
                        s,
                        self.options.join(", ")
                    ));
                }
                true
            }
            _ => false,
        };

        if fits {
            None
        } else {
            Some(format!("expected {}, got {}", self.value_type, value.kind()))
        }
    }
}

/// Specification of a node type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeTypeSpec {
    /// Type identifier (e.g. "transform-filter").
    pub id: String,
    /// Category of nodes of this type.
    pub category: Category,
    /// Human-readable name.
    #[serde(default)]
    pub display_name: String,
    /// What the node does.
    #[serde(default)]
    pub description: String,
    /// Ordered configuration fields.
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl NodeTypeSpec {
    /// Create a new node type spec.
    pub fn new(id: impl Into<String>, category: Category) -> Self {
        Self {
            id: id.into(),
            category,
            display_name: String::new(),
            description: String::new(),
            fields: Vec::new(),
        }
    }

    /// Set display name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// Set description.
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Append a field.
    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Find a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Required fields in declaration order.
    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.required)
    }
}
