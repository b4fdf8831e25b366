//! Validate command - report diagnostics for a pipeline descriptor.

use super::load_pipeline;
use anyhow::Result;
use pipewright_core::validation::ValidationReport;
use pipewright_core::{Diagnostic, Severity};
use pipewright_engine::config::EngineConfig;
use std::path::Path;

/// Run the validate command.
pub fn run(file: &Path, config: &EngineConfig) -> Result<()> {
    let pipeline = load_pipeline(file, config)?;
    let registry = config.build_registry()?;

    tracing::info!(file = %file.display(), pipeline_id = %pipeline.id(), "Validating pipeline");
    let report = config.validator().validate(&pipeline, &registry);

    let title = format!("Validation Results for: {}", file.display());
    println!("{}", title);
    println!("{}", "=".repeat(title.len()));
    println!();
    println!("Pipeline: {} ({})", pipeline.name(), pipeline.id());
    println!(
        "  Nodes: {}  Edges: {}",
        pipeline.node_count(),
        pipeline.edge_count()
    );
    println!();
    print!("{}", render(&report));
    println!();
    println!("{}", "=".repeat(title.len()));
    println!("{}", summary(&report));

    if !report.is_deployable() {
        anyhow::bail!("Pipeline validation failed");
    }
    Ok(())
}

fn marker(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "✗",
        Severity::Warning => "⚠",
        Severity::Info => "ℹ",
    }
}

fn render_line(diagnostic: &Diagnostic) -> String {
    format!(
        "{} {} [{}] {}\n",
        marker(diagnostic.severity),
        diagnostic.severity,
        diagnostic.rule,
        diagnostic.message
    )
}

/// One line per diagnostic, in report order.
fn render(report: &ValidationReport) -> String {
    if report.is_empty() {
        return "✓ No diagnostics\n".to_string();
    }
    report.diagnostics().iter().map(render_line).collect()
}

fn summary(report: &ValidationReport) -> String {
    let errors = report.errors().count();
    let warnings = report.warnings().count();
    match (errors, warnings) {
        (0, 0) => "✓ Validation PASSED".to_string(),
        (0, w) => format!("⚠ Validation passed with {} warning(s)", w),
        (e, w) => format!("✗ Validation FAILED: {} error(s), {} warning(s)", e, w),
    }
}
