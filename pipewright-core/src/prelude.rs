//! Prelude for convenient imports.
//!
//! ```ignore
//! use pipewright_core::prelude::*;
//! ```

// Core types
pub use crate::types::{Edge, NodeId, PipelineId};
pub use crate::value::{ConfigMap, ConfigValue};

// Error handling
pub use crate::error::{PipelineError, Result};

// Registry
pub use crate::registry::{Category, FieldSpec, NodeTypeRegistry, NodeTypeSpec, ValueType};

// Graph model
pub use crate::pipeline::{
    LoadStrategy, Node, NodeDescriptor, NodeSettings, Pipeline, PipelineDescriptor,
    QualityCheckSettings, QualityMode, QualityRule, SourceSettings, TargetSettings,
    TransformSettings,
};

// Validation
pub use crate::validation::{
    Diagnostic, PipelineValidator, RuleId, Severity, ValidationLimits, ValidationPolicy,
    ValidationReport, validate,
};
