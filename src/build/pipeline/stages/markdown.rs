//! Markdown rendering stage.

use rayon::prelude::*;

use crate::build::markdown::render_markdown;
use crate::build::pipeline::{PipelineContext, PipelineError, ProcessingDocument, Stage};

/// Stage that renders markdown content to HTML.
///
/// This stage:
/// - Renders content to HTML (with syntax highlighting for code blocks)
/// - Extracts heading structure for table of contents
///
/// Documents are rendered in parallel. After this stage, `doc.content`
/// contains HTML and `doc.toc` contains the extracted headings.
pub struct MarkdownStage;

impl Stage for MarkdownStage {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn process(
        &self,
        docs: &mut [ProcessingDocument],
        ctx: &PipelineContext,
    ) -> Result<(), PipelineError> {
        docs.par_iter_mut().try_for_each(|doc| {
            let output = render_markdown(&doc.content, ctx.highlighter, ctx.markdown_config)
                .map_err(|source| PipelineError::Markdown {
                    path: doc.source_path().to_path_buf(),
                    source,
                })?;

            doc.content = output.html;
            doc.toc = output.toc;
            Ok(())
        })
    }
}
