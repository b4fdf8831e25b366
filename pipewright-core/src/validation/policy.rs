//! Per-rule severity overrides.

use super::diagnostic::{Diagnostic, RuleId, Severity};
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Severity overrides keyed by rule.
///
/// An override replaces the severity of a rule's `error` and `warning`
/// diagnostics; `info` diagnostics are left alone. Promoting is always
/// allowed. Blocking rules (the structural ones and `required_config`)
/// cannot be demoted below `error`.
///
/// In YAML:
///
/// ```yaml
/// recommended_config: error
/// target_reachability: info
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<RuleId, Severity>", into = "BTreeMap<RuleId, Severity>")]
pub struct ValidationPolicy {
    overrides: BTreeMap<RuleId, Severity>,
}

impl ValidationPolicy {
    /// Create a policy with no overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an override.
    pub fn with_override(mut self, rule: RuleId, severity: Severity) -> Result<Self> {
        if rule.is_blocking() && severity != Severity::Error {
            return Err(PipelineError::InvalidPolicy {
                rule: rule.to_string(),
                cause: format!("blocking rule cannot be demoted to {}", severity),
            });
        }
        self.overrides.insert(rule, severity);
        Ok(self)
    }

    /// Override for a rule, if any.
    pub fn severity_for(&self, rule: RuleId) -> Option<Severity> {
        self.overrides.get(&rule).copied()
    }

    /// Check if the policy has no overrides.
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// Apply the policy to a diagnostic.
    pub fn apply(&self, mut diagnostic: Diagnostic) -> Diagnostic {
        if diagnostic.severity != Severity::Info {
            if let Some(severity) = self.severity_for(diagnostic.rule) {
                diagnostic.severity = severity;
            }
        }
        diagnostic
    }
}

impl TryFrom<BTreeMap<RuleId, Severity>> for ValidationPolicy {
    type Error = PipelineError;

    fn try_from(overrides: BTreeMap<RuleId, Severity>) -> Result<Self> {
        overrides
            .into_iter()
            .try_fold(Self::new(), |policy, (rule, severity)| {
                policy.with_override(rule, severity)
            })
    }
}

impl From<ValidationPolicy> for BTreeMap<RuleId, Severity> {
    fn from(policy: ValidationPolicy) -> Self {
        policy.overrides
    }
}
