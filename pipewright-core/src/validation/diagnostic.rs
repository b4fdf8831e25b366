//! Diagnostic types.

use crate::types::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity of a diagnostic. Only `Error` blocks compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks compilation.
    Error,
    /// Reported, never blocks.
    Warning,
    /// Informational note.
    Info,
}

impl Severity {
    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warning" | "warn" => Ok(Self::Warning),
            "info" => Ok(Self::Info),
            other => Err(format!("unknown severity '{}'", other)),
        }
    }
}

/// Validation rule identifiers, in execution order.
///
/// The derived ordering is the order diagnostics are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    /// Size limits (checked before any rule).
    Limits,
    /// Every node type resolves in the registry.
    TypeExistence,
    /// The graph has no cycles.
    Acyclicity,
    /// Nodes have the inputs and outputs their category needs.
    Connectivity,
    /// Required fields are present and all values fit their fields.
    RequiredConfig,
    /// Category-specific recommendations.
    RecommendedConfig,
    /// Every source feeds some target.
    TargetReachability,
    /// Pipeline-level summary for deployable pipelines.
    Readiness,
}

impl RuleId {
    /// All rules in execution order.
    pub const ALL: [RuleId; 8] = [
        Self::Limits,
        Self::TypeExistence,
        Self::Acyclicity,
        Self::Connectivity,
        Self::RequiredConfig,
        Self::RecommendedConfig,
        Self::TargetReachability,
        Self::Readiness,
    ];

    /// Snake-case rule name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Limits => "limits",
            Self::TypeExistence => "type_existence",
            Self::Acyclicity => "acyclicity",
            Self::Connectivity => "connectivity",
            Self::RequiredConfig => "required_config",
            Self::RecommendedConfig => "recommended_config",
            Self::TargetReachability => "target_reachability",
            Self::Readiness => "readiness",
        }
    }

    /// Whether the rule guards graph structure and must stay an error.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::Limits | Self::TypeExistence | Self::Acyclicity | Self::Connectivity
        )
    }

    /// Whether the rule must stay an error for code generation to succeed.
    ///
    /// Emitters project node configuration into typed settings, so missing or
    /// invalid required fields are as blocking as a broken graph.
    pub fn is_blocking(&self) -> bool {
        self.is_structural() || *self == Self::RequiredConfig
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|rule| rule.as_str() == s)
            .ok_or_else(|| format!("unknown rule '{}'", s))
    }
}

/// A structured validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// How serious the finding is.
    pub severity: Severity,
    /// Rule that produced it.
    pub rule: RuleId,
    /// Human-readable message.
    pub message: String,
    /// Node the finding concerns, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<NodeId>,
}

impl Diagnostic {
    /// Create a new diagnostic.
    pub fn new(severity: Severity, rule: RuleId, message: impl Into<String>) -> Self {
        Self {
            severity,
            rule,
            message: message.into(),
            node: None,
        }
    }

    /// Create an error diagnostic.
    pub fn error(rule: RuleId, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, rule, message)
    }

    /// Create a warning diagnostic.
    pub fn warning(rule: RuleId, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, rule, message)
    }

    /// Create an info diagnostic.
    pub fn info(rule: RuleId, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, rule, message)
    }

    /// Attach the node the finding concerns.
    pub fn with_node(mut self, node: impl Into<NodeId>) -> Self {
        self.node = Some(node.into());
        self
    }

    /// Check if this diagnostic blocks compilation.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.rule, self.message)
    }
}
