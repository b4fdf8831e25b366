//! Types command - list the node type catalog.

use anyhow::Result;
use pipewright_core::{Category, NodeTypeSpec};
use pipewright_engine::config::EngineConfig;

/// Run the types command.
pub fn run(category: Option<Category>, config: &EngineConfig) -> Result<()> {
    let registry = config.build_registry()?;
    let specs = registry.list(category);

    tracing::info!(count = specs.len(), "Listing node types");

    println!("Node Types");
    println!("==========");
    println!();
    println!("{:<22} {:<14} {:<16} REQUIRED", "TYPE", "CATEGORY", "NAME");
    println!("{:<22} {:<14} {:<16} --------", "----", "--------", "----");
    for spec in &specs {
        println!("{}", row(spec));
    }
    println!();
    println!("{} type(s)", specs.len());

    Ok(())
}

fn row(spec: &NodeTypeSpec) -> String {
    let required: Vec<&str> = spec.required_fields().map(|f| f.name.as_str()).collect();
    format!(
        "{:<22} {:<14} {:<16} {}",
        spec.id,
        spec.category.as_str(),
        spec.display_name,
        required.join(", ")
    )
}
