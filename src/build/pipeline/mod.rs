//! Build pipeline for document processing.
//!
//! The pipeline transforms documents through a series of stages:
//! 1. Interlink resolution (sequential, against the frozen site index)
//! 2. Markdown rendering (to HTML with TOC)
//! 3. Template rendering (page template wrapper)
//! 4. File writing (output to disk)
//!
//! Optional stages such as minification are inserted after a named stage.
//! Build-wide stages (site index page, sitemap) run after all documents are
//! written.

mod context;
mod document;
mod error;
mod stages;

pub use context::PipelineContext;
pub use document::ProcessingDocument;
pub use error::PipelineError;

pub use stages::{GENERATED_FILES, MinifyStage};
use stages::{IndexPageStage, InterlinkStage, MarkdownStage, SitemapStage, TemplateStage, WriteStage};

/// A stage in the document processing pipeline.
///
/// Stages transform documents sequentially. Each stage receives all documents
/// and can modify them in place before passing to the next stage. A stage is
/// free to process its documents in parallel; the context is shared read-only.
pub trait Stage: Send + Sync {
    /// Unique name for this stage (used for insertion points).
    fn name(&self) -> &'static str;

    /// Process documents through this stage.
    fn process(
        &self,
        docs: &mut [ProcessingDocument],
        ctx: &PipelineContext,
    ) -> Result<(), PipelineError>;
}

/// A stage that runs once after all documents are processed.
pub trait FinalizeStage: Send + Sync {
    /// Unique name for this stage.
    fn name(&self) -> &'static str;

    /// Run finalization after all documents are processed and written.
    fn finalize(&self, docs: &[ProcessingDocument], ctx: &PipelineContext) -> Result<(), PipelineError>;
}

/// The document processing pipeline.
///
/// Orchestrates document transformation through a series of stages.
/// The default pipeline is: interlink → markdown → template → write, then
/// the index page and sitemap.
///
/// # Extension Points
///
/// Insert custom stages with `insert_after`:
///
/// ```ignore
/// pipeline.insert_after("template", MinifyStage);
/// ```
pub struct Pipeline {
    /// Document processing stages (run for each document batch)
    stages: Vec<Box<dyn Stage>>,
    /// Build-wide stages (run once after all documents)
    finalize_stages: Vec<Box<dyn FinalizeStage>>,
}

impl Pipeline {
    /// Create an empty pipeline with no stages.
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            finalize_stages: Vec::new(),
        }
    }

    /// Create the default pipeline with standard stages.
    pub fn default_pipeline() -> Self {
        let mut pipeline = Self::new();
        pipeline.add_stage(InterlinkStage);
        pipeline.add_stage(MarkdownStage);
        pipeline.add_stage(TemplateStage);
        pipeline.add_stage(WriteStage);
        pipeline.add_finalize_stage(IndexPageStage);
        pipeline.add_finalize_stage(SitemapStage);
        pipeline
    }

    /// Add a stage to the end of the pipeline.
    pub fn add_stage<S: Stage + 'static>(&mut self, stage: S) -> &mut Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Insert a stage after the named stage.
    ///
    /// # Panics
    ///
    /// Panics if no stage with the given name exists.
    pub fn insert_after<S: Stage + 'static>(&mut self, name: &str, stage: S) -> &mut Self {
        let pos = self
            .stages
            .iter()
            .position(|s| s.name() == name)
            .unwrap_or_else(|| panic!("stage '{}' not found in pipeline", name));
        self.stages.insert(pos + 1, Box::new(stage));
        self
    }

    /// Add a finalize stage (runs after all documents are processed).
    pub fn add_finalize_stage<S: FinalizeStage + 'static>(&mut self, stage: S) -> &mut Self {
        self.finalize_stages.push(Box::new(stage));
        self
    }

    /// Run the pipeline on a set of documents.
    ///
    /// Stops at the first failing stage; no later stage sees the documents.
    pub fn run(
        &self,
        docs: &mut [ProcessingDocument],
        ctx: &PipelineContext,
    ) -> Result<(), PipelineError> {
        for stage in &self.stages {
            tracing::debug!(stage = stage.name(), documents = docs.len(), "running stage");
            stage.process(docs, ctx)?;
        }

        for stage in &self.finalize_stages {
            tracing::debug!(stage = stage.name(), "running finalize stage");
            stage.finalize(docs, ctx)?;
        }

        Ok(())
    }

    /// Get the names of all stages in order.
    #[cfg(test)]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::default_pipeline()
    }
}
