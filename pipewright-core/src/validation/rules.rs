//! Validation rules.
//!
//! Each rule is an independent pass over the pipeline. Rules never fail; they
//! only produce diagnostics. Nodes whose type does not resolve are reported
//! once by `type_existence` and skipped by every rule that needs a category.

use super::diagnostic::{Diagnostic, RuleId};
use crate::error::PipelineError;
use crate::pipeline::{LoadStrategy, Node, NodeSettings, Pipeline};
use crate::registry::{Category, NodeTypeRegistry, NodeTypeSpec};

/// Inputs shared by every rule.
pub(super) struct RuleContext<'a> {
    pub pipeline: &'a Pipeline,
    pub registry: &'a NodeTypeRegistry,
}

impl<'a> RuleContext<'a> {
    /// Nodes with a resolvable type, in ascending ID order.
    fn resolved(&self) -> impl Iterator<Item = (&'a Node, &'a NodeTypeSpec)> + use<'a> {
        let (pipeline, registry) = (self.pipeline, self.registry);
        pipeline
            .nodes()
            .filter_map(move |node| registry.get(&node.node_type).map(|spec| (node, spec)))
    }

    fn category_of(&self, node_id: &str) -> Option<Category> {
        self.pipeline
            .node(node_id)
            .and_then(|node| self.registry.get(&node.node_type))
            .map(|spec| spec.category)
    }

    fn has_descendant_of(&self, node_id: &str, category: Category) -> bool {
        self.pipeline
            .descendants(node_id)
            .into_iter()
            .any(|id| self.category_of(id.as_str()) == Some(category))
    }
}

/// A rule pass.
pub(super) type Rule = fn(&RuleContext<'_>) -> Vec<Diagnostic>;

/// Rules in execution order.
pub(super) const RULES: [(RuleId, Rule); 6] = [
    (RuleId::TypeExistence, type_existence),
    (RuleId::Acyclicity, acyclicity),
    (RuleId::Connectivity, connectivity),
    (RuleId::RequiredConfig, required_config),
    (RuleId::RecommendedConfig, recommended_config),
    (RuleId::TargetReachability, target_reachability),
];

fn type_existence(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    ctx.pipeline
        .nodes()
        .filter(|node| !ctx.registry.contains(&node.node_type))
        .map(|node| {
            Diagnostic::error(
                RuleId::TypeExistence,
                format!("node {} references unknown type '{}'", node.id, node.node_type),
            )
            .with_node(node.id.clone())
        })
        .collect()
}

fn acyclicity(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    if ctx.pipeline.topological_order().is_ok() {
        return Vec::new();
    }

    // Kahn leaves downstream nodes unsorted too; report only nodes on a cycle.
    ctx.pipeline
        .nodes()
        .filter(|node| {
            ctx.pipeline
                .successors(node.id.as_str())
                .any(|next| ctx.pipeline.can_reach(next.as_str(), node.id.as_str()))
        })
        .map(|node| {
            Diagnostic::error(RuleId::Acyclicity, format!("node {} is part of a cycle", node.id))
                .with_node(node.id.clone())
        })
        .collect()
}

fn connectivity(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for (node, spec) in ctx.resolved() {
        let id = node.id.as_str();

        if spec.category != Category::Source && ctx.pipeline.in_degree(id) == 0 {
            diagnostics.push(
                Diagnostic::error(
                    RuleId::Connectivity,
                    format!("node {} has no incoming connections", id),
                )
                .with_node(node.id.clone()),
            );
        }

        if ctx.pipeline.out_degree(id) == 0 {
            match spec.category {
                Category::Source | Category::Transform => diagnostics.push(
                    Diagnostic::error(
                        RuleId::Connectivity,
                        format!("node {} has no outgoing connections", id),
                    )
                    .with_node(node.id.clone()),
                ),
                Category::QualityCheck => diagnostics.push(
                    Diagnostic::info(
                        RuleId::Connectivity,
                        format!("quality check {} is terminal", id),
                    )
                    .with_node(node.id.clone()),
                ),
                Category::Target => {}
            }
        }
    }

    diagnostics
}

fn required_config(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for (node, spec) in ctx.resolved() {
        let before = diagnostics.len();
        let error = |message: String| {
            Diagnostic::error(RuleId::RequiredConfig, message).with_node(node.id.clone())
        };

        for field in spec.required_fields() {
            if !node.has_value(spec, &field.name) {
                diagnostics.push(error(format!(
                    "node {} is missing required field '{}'",
                    node.id, field.name
                )));
            }
        }

        for (name, value) in &node.config {
            match spec.field(name) {
                None => diagnostics.push(error(format!(
                    "node {} has unknown field '{}' for type '{}'",
                    node.id, name, spec.id
                ))),
                Some(_) if value.is_empty() => {}
                Some(field) => {
                    if let Some(cause) = field.check(value) {
                        diagnostics.push(error(format!(
                            "field '{}' of node {}: {}",
                            name, node.id, cause
                        )));
                    }
                }
            }
        }

        // Cross-field constraints only make sense once every field is sound.
        if diagnostics.len() == before {
            if let Err(err) = NodeSettings::project(node, spec) {
                let message = match err {
                    PipelineError::InvalidConfigValue { field, cause, .. } => {
                        format!("field '{}' of node {}: {}", field, node.id, cause)
                    }
                    other => other.to_string(),
                };
                diagnostics.push(error(message));
            }
        }
    }

    diagnostics
}

fn recommended_config(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for (node, spec) in ctx.resolved() {
        match spec.category {
            Category::Transform => {
                if !ctx.has_descendant_of(node.id.as_str(), Category::QualityCheck) {
                    diagnostics.push(
                        Diagnostic::warning(
                            RuleId::RecommendedConfig,
                            format!("transform {} has no downstream quality check", node.id),
                        )
                        .with_node(node.id.clone()),
                    );
                }
            }
            Category::Target => {
                let strategy = node
                    .effective(spec, "load_strategy")
                    .and_then(|v| v.as_str())
                    .and_then(|s| s.parse::<LoadStrategy>().ok());
                if strategy == Some(LoadStrategy::Upsert) && !node.has_value(spec, "columns") {
                    diagnostics.push(
                        Diagnostic::warning(
                            RuleId::RecommendedConfig,
                            format!(
                                "target {} upserts without 'columns'; \
                                 conflicting rows will be ignored",
                                node.id
                            ),
                        )
                        .with_node(node.id.clone()),
                    );
                }
            }
            Category::Source | Category::QualityCheck => {}
        }
    }

    diagnostics
}

fn target_reachability(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    ctx.resolved()
        .filter(|(_, spec)| spec.category == Category::Source)
        .filter(|(node, _)| !ctx.has_descendant_of(node.id.as_str(), Category::Target))
        .map(|(node, _)| {
            Diagnostic::warning(
                RuleId::TargetReachability,
                format!("source {} does not reach any target", node.id),
            )
            .with_node(node.id.clone())
        })
        .collect()
}
