//! Document store.

use super::controller::PipelineDocument;
use crate::codegen::CodeGenerator;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use pipewright_core::{Pipeline, PipelineError, PipelineId, Result};
use std::sync::Arc;

/// Holds independent pipeline documents by ID.
///
/// Documents share the generator (and so the registry) but no mutable state;
/// locking one document never blocks another.
#[derive(Debug)]
pub struct DocumentStore {
    generator: CodeGenerator,
    documents: DashMap<PipelineId, Arc<PipelineDocument>>,
}

impl DocumentStore {
    /// Create an empty store.
    pub fn new(generator: CodeGenerator) -> Self {
        Self {
            generator,
            documents: DashMap::new(),
        }
    }

    /// The generator shared by all documents.
    pub fn generator(&self) -> &CodeGenerator {
        &self.generator
    }

    /// Create an empty document.
    pub fn create(
        &self,
        id: impl Into<PipelineId>,
        name: impl Into<String>,
    ) -> Result<Arc<PipelineDocument>> {
        self.insert(Pipeline::new(id, name))
    }

    /// Load a document from a JSON descriptor.
    pub fn open(&self, json: &str) -> Result<Arc<PipelineDocument>> {
        let limits = self.generator.validator().limits();
        self.insert(Pipeline::from_json_with_limits(json, limits)?)
    }

    fn insert(&self, pipeline: Pipeline) -> Result<Arc<PipelineDocument>> {
        match self.documents.entry(pipeline.id().clone()) {
            Entry::Occupied(entry) => Err(PipelineError::DuplicatePipeline {
                pipeline_id: entry.key().clone(),
            }),
            Entry::Vacant(entry) => {
                let pipeline_id = entry.key().clone();
                let document = Arc::new(PipelineDocument::from_pipeline(
                    pipeline,
                    self.generator.clone(),
                ));
                entry.insert(Arc::clone(&document));
                tracing::info!(pipeline_id = %pipeline_id, "Pipeline document created");
                Ok(document)
            }
        }
    }

    /// Get a document.
    pub fn get(&self, id: &str) -> Option<Arc<PipelineDocument>> {
        self.documents.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Remove a document.
    pub fn remove(&self, id: &str) -> Option<Arc<PipelineDocument>> {
        let removed = self.documents.remove(id).map(|(_, document)| document);
        if removed.is_some() {
            tracing::info!(pipeline_id = id, "Pipeline document removed");
        }
        removed
    }

    /// IDs of all documents, sorted.
    pub fn list(&self) -> Vec<PipelineId> {
        let mut ids: Vec<PipelineId> = self.documents.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
