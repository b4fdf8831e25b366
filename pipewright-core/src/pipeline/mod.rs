//! Pipeline graph model.
//!
//! A [`Pipeline`] is a DAG of typed [`Node`]s. Structural invariants are
//! enforced by every mutation; semantic completeness (configuration,
//! connectivity) is left to the validation engine.

mod descriptor;
mod graph;
mod node;
mod settings;

pub use descriptor::{NodeDescriptor, PipelineDescriptor};
pub use graph::Pipeline;
pub use node::Node;
pub use settings::{
    FileFormat, LoadStrategy, NodeSettings, QualityCheckSettings, QualityMode, QualityRule,
    SourceSettings, TargetSettings, TransformSettings,
};
