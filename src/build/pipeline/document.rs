//! Document types for pipeline processing.

use std::path::Path;

use crate::build::document::Document;
use crate::build::render::{PageInfo, TocEntry};

/// A document being processed through the pipeline.
///
/// Wraps the original `Document` with mutable state that evolves
/// through pipeline stages:
///
/// 1. Initially: `content` = raw markdown body, `toc` = empty
/// 2. After interlink: `content` = markdown with interlinks rewritten
/// 3. After markdown: `content` = HTML, `toc` = populated
/// 4. After template: `output_html` = final page HTML
#[derive(Debug)]
pub struct ProcessingDocument {
    /// The original document (metadata and raw body)
    pub doc: Document,

    /// Template view of the document's metadata
    pub page: PageInfo,

    /// Content being processed.
    pub content: String,

    /// Table of contents extracted during markdown rendering.
    ///
    /// Empty until the markdown stage populates it.
    pub toc: Vec<TocEntry>,

    /// Final HTML output after template rendering.
    ///
    /// None until the template stage populates it.
    pub output_html: Option<String>,
}

impl ProcessingDocument {
    pub fn new(doc: Document, page: PageInfo) -> Self {
        let content = doc.raw_body.clone();
        Self {
            doc,
            page,
            content,
            toc: Vec::new(),
            output_html: None,
        }
    }

    /// Source file this document was parsed from.
    pub fn source_path(&self) -> &Path {
        &self.doc.source_path
    }

    /// Output file relative to the output directory.
    pub fn output_path(&self) -> &Path {
        &self.doc.output_path
    }
}
