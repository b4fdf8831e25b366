//! Pipeline validation.
//!
//! Validation runs an ordered list of independent rules over a pipeline and
//! a registry:
//!
//! 1. `type_existence`: every node type resolves
//! 2. `acyclicity`: the graph has no cycles
//! 3. `connectivity`: nodes have the edges their category needs
//! 4. `required_config`: required fields are present, values fit their fields
//! 5. `recommended_config`: category-specific heuristics (warnings)
//! 6. `target_reachability`: every source feeds a target (warnings)
//!
//! Size limits are checked first and reported under `limits`. Diagnostics are
//! ordered by rule, then by node ID within a rule. A pipeline is deployable
//! iff no diagnostic has `error` severity; deployable pipelines end the report
//! with a pipeline-level `readiness` info.

mod diagnostic;
mod limits;
mod policy;
mod rules;

pub use diagnostic::{Diagnostic, RuleId, Severity};
pub use limits::ValidationLimits;
pub use policy::ValidationPolicy;

use crate::error::{PipelineError, Result};
use crate::pipeline::Pipeline;
use crate::registry::NodeTypeRegistry;
use rules::{RULES, RuleContext};
use serde::{Deserialize, Serialize};

/// Message of the `readiness` diagnostic.
pub const READY_MESSAGE: &str = "pipeline is ready to run";

/// Outcome of a validation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
    /// All diagnostics in report order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Take ownership of the diagnostics.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Check if no diagnostic blocks compilation.
    pub fn is_deployable(&self) -> bool {
        !self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Diagnostics of one severity.
    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.severity == severity)
    }

    /// Blocking diagnostics.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.with_severity(Severity::Error)
    }

    /// Non-blocking warnings.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.with_severity(Severity::Warning)
    }

    /// Diagnostics concerning one node.
    pub fn for_node<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |d| d.node.as_ref().is_some_and(|n| n.as_str() == node_id))
    }

    /// Number of diagnostics.
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Check if the report is clean.
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Fail with `NotDeployable` if the report has errors.
    pub fn into_result(self) -> Result<Self> {
        if self.is_deployable() {
            Ok(self)
        } else {
            Err(PipelineError::NotDeployable {
                diagnostics: self.diagnostics,
            })
        }
    }
}

/// Validator for pipelines.
#[derive(Debug, Clone, Default)]
pub struct PipelineValidator {
    limits: ValidationLimits,
    policy: ValidationPolicy,
}

impl PipelineValidator {
    /// Create a validator with default limits and no overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the limits.
    pub fn with_limits(mut self, limits: ValidationLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the severity policy.
    pub fn with_policy(mut self, policy: ValidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The limits in effect.
    pub fn limits(&self) -> &ValidationLimits {
        &self.limits
    }

    /// The severity policy in effect.
    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    /// Validate a pipeline against a registry.
    pub fn validate(&self, pipeline: &Pipeline, registry: &NodeTypeRegistry) -> ValidationReport {
        let ctx = RuleContext { pipeline, registry };

        // Check structural limits first
        let mut diagnostics = self.limits.check(pipeline);

        for (rule, check) in RULES {
            let mut found = check(&ctx);
            found.sort_by(|a, b| a.node.cmp(&b.node));
            tracing::trace!(rule = %rule, count = found.len(), "Rule checked");
            diagnostics.extend(found);
        }

        let mut diagnostics: Vec<Diagnostic> = diagnostics
            .into_iter()
            .map(|d| self.policy.apply(d))
            .collect();

        if !diagnostics.iter().any(Diagnostic::is_error) {
            diagnostics.push(Diagnostic::info(RuleId::Readiness, READY_MESSAGE));
        }

        let report = ValidationReport { diagnostics };
        tracing::debug!(
            pipeline_id = %pipeline.id(),
            errors = report.errors().count(),
            warnings = report.warnings().count(),
            deployable = report.is_deployable(),
            "Pipeline validated"
        );
        report
    }
}

/// Validate with default limits and no overrides.
pub fn validate(pipeline: &Pipeline, registry: &NodeTypeRegistry) -> ValidationReport {
    PipelineValidator::new().validate(pipeline, registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Node;

    fn registry() -> NodeTypeRegistry {
        NodeTypeRegistry::builtin()
    }

    fn source(id: &str) -> Node {
        Node::new(id, "source-pg")
            .with_config("connection", "dwh")
            .with_config("table", "orders")
    }

    fn filter(id: &str) -> Node {
        Node::new(id, "transform-filter").with_config("condition", "status = 'active'")
    }

    fn check(id: &str) -> Node {
        Node::new(id, "quality-check")
            .with_config("rule", "completeness")
            .with_config("column", "order_id")
    }

    fn target(id: &str) -> Node {
        Node::new(id, "target-pg")
            .with_config("connection", "dwh")
            .with_config("table", "daily_orders")
    }

    fn build(nodes: Vec<Node>, edges: &[(&str, &str)]) -> Pipeline {
        let mut pipeline = Pipeline::new("p", "test");
        for node in nodes {
            pipeline.add_node(node).unwrap();
        }
        for (from, to) in edges {
            pipeline.add_edge(from, to).unwrap();
        }
        pipeline
    }

    fn rules_of(report: &ValidationReport) -> Vec<(RuleId, Severity, Option<&str>)> {
        report
            .diagnostics()
            .iter()
            .map(|d| (d.rule, d.severity, d.node.as_ref().map(|n| n.as_str())))
            .collect()
    }

    #[test]
    fn clean_pipeline_is_only_ready() {
        let pipeline = build(
            vec![source("A"), filter("B"), check("Q"), target("C")],
            &[("A", "B"), ("B", "Q"), ("Q", "C")],
        );
        let report = validate(&pipeline, &registry());
        assert_eq!(
            rules_of(&report),
            vec![(RuleId::Readiness, Severity::Info, None)],
            "{:?}",
            report
        );
        assert_eq!(report.diagnostics()[0].message, READY_MESSAGE);
        assert!(report.is_deployable());
    }

    #[test]
    fn blocked_pipeline_is_not_ready() {
        let pipeline = build(vec![source("A"), filter("B")], &[("A", "B")]);
        let report = validate(&pipeline, &registry());
        assert!(!report.is_deployable());
        assert!(report.diagnostics().iter().all(|d| d.rule != RuleId::Readiness));
    }

    #[test]
    fn unknown_type_reported_once() {
        let pipeline = build(
            vec![source("A"), Node::new("X", "transform-pivot"), target("C")],
            &[("A", "X"), ("X", "C")],
        );
        let report = validate(&pipeline, &registry());
        assert_eq!(
            rules_of(&report),
            vec![(RuleId::TypeExistence, Severity::Error, Some("X"))]
        );
    }

    #[test]
    fn cycle_reports_only_cycle_members() {
        let json = r#"{"id":"p","name":"loop","nodes":[
            {"id":"A","type":"source-pg","config":{"connection":"c","table":"t"}},
            {"id":"B","type":"transform-sql","config":{"query":"SELECT 1"}},
            {"id":"C","type":"transform-sql","config":{"query":"SELECT 2"}},
            {"id":"D","type":"target-pg","config":{"connection":"c","table":"t"}}],
            "edges":[{"from":"A","to":"B"},{"from":"B","to":"C"},
                     {"from":"C","to":"B"},{"from":"C","to":"D"}]}"#;
        let pipeline = Pipeline::from_json(json).unwrap();
        let report = validate(&pipeline, &registry());

        let cyclic: Vec<_> = report
            .diagnostics()
            .iter()
            .filter(|d| d.rule == RuleId::Acyclicity)
            .filter_map(|d| d.node.as_ref().map(|n| n.as_str()))
            .collect();
        assert_eq!(cyclic, vec!["B", "C"]);
        assert!(!report.is_deployable());
    }

    #[test]
    fn terminal_quality_check_is_info() {
        let pipeline = build(
            vec![source("A"), check("Q"), target("C")],
            &[("A", "Q"), ("A", "C")],
        );
        let report = validate(&pipeline, &registry());
        assert_eq!(
            rules_of(&report),
            vec![
                (RuleId::Connectivity, Severity::Info, Some("Q")),
                (RuleId::Readiness, Severity::Info, None),
            ]
        );
        assert!(report.is_deployable());
    }

    #[test]
    fn dangling_transform_has_no_outgoing() {
        let pipeline = build(vec![source("A"), filter("B")], &[("A", "B")]);
        let report = validate(&pipeline, &registry());
        let msgs: Vec<_> = report.errors().map(|d| d.message.as_str()).collect();
        assert_eq!(msgs, vec!["node B has no outgoing connections"]);
    }

    #[test]
    fn config_type_and_enum_errors() {
        let bad = target("C")
            .with_config("load_strategy", "replace")
            .with_config("table", 42_i64)
            .with_config("partition", "day");
        let pipeline = build(vec![source("A"), bad], &[("A", "C")]);
        let report = validate(&pipeline, &registry());

        let msgs: Vec<_> = report
            .errors()
            .filter(|d| d.rule == RuleId::RequiredConfig)
            .map(|d| d.message.clone())
            .collect();
        assert_eq!(msgs.len(), 3);
        assert!(msgs.iter().any(|m| m.contains("'replace' is not one of")));
        assert!(msgs.iter().any(|m| m.contains("expected string, got number")));
        assert!(msgs.iter().any(|m| m.contains("unknown field 'partition'")));
    }

    #[test]
    fn merge_without_keys_names_the_field() {
        let pipeline = build(
            vec![source("A"), target("C").with_config("load_strategy", "merge")],
            &[("A", "C")],
        );
        let report = validate(&pipeline, &registry());
        let errors: Vec<_> = report.errors().collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("'key_columns'"));
    }

    #[test]
    fn upsert_without_columns_warns() {
        let pipeline = build(
            vec![
                source("A"),
                target("C")
                    .with_config("load_strategy", "upsert")
                    .with_config("key_columns", vec!["order_id"]),
            ],
            &[("A", "C")],
        );
        let report = validate(&pipeline, &registry());
        assert!(report.is_deployable());
        assert_eq!(
            rules_of(&report),
            vec![
                (RuleId::RecommendedConfig, Severity::Warning, Some("C")),
                (RuleId::Readiness, Severity::Info, None),
            ]
        );
    }

    #[test]
    fn source_without_target_warns() {
        let pipeline = build(
            vec![source("A"), check("Q"), source("S"), target("T")],
            &[("A", "Q"), ("S", "T")],
        );
        let report = validate(&pipeline, &registry());
        let warnings: Vec<_> = report
            .warnings()
            .map(|d| (d.rule, d.node.as_ref().map(|n| n.as_str())))
            .collect();
        assert_eq!(warnings, vec![(RuleId::TargetReachability, Some("A"))]);
    }

    #[test]
    fn diagnostics_sorted_by_rule_then_node() {
        let pipeline = build(
            vec![
                Node::new("z", "transform-filter"),
                Node::new("m", "target-pg"),
                Node::new("a", "transform-filter"),
            ],
            &[],
        );
        let report = validate(&pipeline, &registry());
        let order: Vec<_> = report
            .diagnostics()
            .iter()
            .map(|d| (d.rule, d.node.as_ref().map(|n| n.as_str().to_string())))
            .collect();
        let mut sorted = order.clone();
        sorted.sort();
        assert_eq!(order, sorted);
        assert_eq!(order.first().map(|(r, _)| *r), Some(RuleId::Connectivity));
    }

    #[test]
    fn policy_promotes_warnings() {
        let pipeline = build(
            vec![source("A"), filter("B"), target("C")],
            &[("A", "B"), ("B", "C")],
        );
        let lenient = validate(&pipeline, &registry());
        assert!(lenient.is_deployable());
        assert_eq!(lenient.warnings().count(), 1);

        let policy = ValidationPolicy::new()
            .with_override(RuleId::RecommendedConfig, Severity::Error)
            .unwrap();
        let strict = PipelineValidator::new()
            .with_policy(policy)
            .validate(&pipeline, &registry());
        assert!(!strict.is_deployable());
    }

    #[test]
    fn limits_come_first() {
        let pipeline = build(vec![source("A"), target("C")], &[("A", "C")]);
        let report = PipelineValidator::new()
            .with_limits(ValidationLimits::new().with_max_node_count(1))
            .validate(&pipeline, &registry());
        assert_eq!(report.diagnostics()[0].rule, RuleId::Limits);
        assert!(report.into_result().is_err());
    }
}
