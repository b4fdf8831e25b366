//! Pipewright Core Library
//!
//! This crate provides the data model and validation engine for Pipewright
//! ETL pipelines.
//!
//! # Overview
//!
//! A pipeline is a DAG of typed nodes (sources, transforms, quality checks
//! and targets). The graph is cycle-free by construction; semantic problems
//! such as missing configuration are reported as diagnostics by the
//! validation engine.
//!
//! # Key Components
//!
//! - **Registry**: catalog of node types and their configuration fields
//! - **Pipeline**: the graph model with deterministic topological ordering
//! - **Descriptor**: canonical JSON form of a pipeline
//! - **Validation**: ordered rules producing typed diagnostics
//!
//! # Example
//!
//! ```ignore
//! use pipewright_core::prelude::*;
//!
//! let registry = NodeTypeRegistry::builtin();
//! let mut pipeline = Pipeline::new("daily", "Daily orders");
//! pipeline.add_node(Node::new("A", "source-pg").with_config("table", "orders"))?;
//! pipeline.add_node(Node::new("C", "target-pg").with_config("table", "daily_orders"))?;
//! pipeline.add_edge("A", "C")?;
//!
//! let report = validate(&pipeline, &registry);
//! assert!(!report.is_deployable()); // connections are missing
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod pipeline;
pub mod prelude;
pub mod registry;
pub mod types;
pub mod validation;
pub mod value;

// Re-export key types at crate root for convenience
pub use error::{PipelineError, Result};
pub use pipeline::{Node, NodeSettings, Pipeline, PipelineDescriptor};
pub use registry::{Category, NodeTypeRegistry, NodeTypeSpec};
pub use types::{Edge, NodeId, PipelineId};
pub use validation::{Diagnostic, PipelineValidator, Severity, ValidationReport, validate};
pub use value::{ConfigMap, ConfigValue};
