//! Pipeline documents: versioned, concurrently readable pipeline state.
//!
//! A [`PipelineDocument`] is the single entry point through which a pipeline
//! is observed or mutated. A [`DocumentStore`] holds many of them.

mod controller;
mod store;

pub use controller::{Edit, PipelineDocument, Snapshot};
pub use store::DocumentStore;
