//! HTML minification stage.

use rayon::prelude::*;

use crate::build::pipeline::{PipelineContext, PipelineError, ProcessingDocument, Stage};

/// Stage that minifies each page's final HTML, inline CSS included.
///
/// Not part of the default pipeline; the builder inserts it after
/// `template` when `build.minify` is set.
pub struct MinifyStage;

impl Stage for MinifyStage {
    fn name(&self) -> &'static str {
        "minify"
    }

    fn process(
        &self,
        docs: &mut [ProcessingDocument],
        _ctx: &PipelineContext,
    ) -> Result<(), PipelineError> {
        docs.par_iter_mut().try_for_each(|doc| {
            let html = doc.output_html.take().ok_or_else(|| {
                PipelineError::stage(
                    "minify",
                    format!(
                        "document '{}' has no output HTML (was template stage run?)",
                        doc.doc.slug
                    ),
                )
            })?;
            doc.output_html = Some(minify_page(&html));
            Ok(())
        })
    }
}

/// Minify a complete HTML page.
pub fn minify_page(html: &str) -> String {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;
    cfg.minify_css = true;
    cfg.minify_js = true;
    cfg.remove_bangs = true;
    cfg.remove_processing_instructions = true;
    let minified = minify_html::minify(html.as_bytes(), &cfg);
    String::from_utf8(minified).unwrap_or_else(|_| html.to_string())
}
