//! Page template rendering stage.

use rayon::prelude::*;

use crate::build::pipeline::{PipelineContext, PipelineError, ProcessingDocument, Stage};
use crate::build::render::PageContext;

/// Stage that applies the page template to rendered content.
///
/// After this stage, `doc.output_html` contains the complete HTML page.
pub struct TemplateStage;

impl Stage for TemplateStage {
    fn name(&self) -> &'static str {
        "template"
    }

    fn process(
        &self,
        docs: &mut [ProcessingDocument],
        ctx: &PipelineContext,
    ) -> Result<(), PipelineError> {
        docs.par_iter_mut().try_for_each(|doc| {
            let page_context = PageContext {
                site: ctx.site,
                page: &doc.page,
                content: &doc.content,
                toc: &doc.toc,
                css: ctx.css,
                theme: ctx.theme,
                harmonique: &ctx.harmonique,
            };

            let html = ctx
                .renderer
                .render_page(&page_context)
                .map_err(|source| PipelineError::Render {
                    path: doc.source_path().to_path_buf(),
                    source,
                })?;

            doc.output_html = Some(html);
            Ok(())
        })
    }
}
