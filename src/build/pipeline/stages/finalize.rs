//! Build-wide pages: the listing at the site root and the sitemap.

use std::path::Path;

use super::minify::minify_page;
use super::write::write_output;
use crate::build::pipeline::{FinalizeStage, PipelineContext, PipelineError, ProcessingDocument};
use crate::build::render::{ListingContext, RenderError};

pub const INDEX_PAGE: &str = "index.html";
pub const SITEMAP: &str = "sitemap.xml";

/// Output files no document or static file may also produce.
pub const GENERATED_FILES: &[&str] = &[INDEX_PAGE, SITEMAP];

/// Writes `index.html`, listing every rendered document newest first.
pub struct IndexPageStage;

impl FinalizeStage for IndexPageStage {
    fn name(&self) -> &'static str {
        "index"
    }

    fn finalize(&self, docs: &[ProcessingDocument], ctx: &PipelineContext) -> Result<(), PipelineError> {
        let listing = ListingContext {
            site: ctx.site,
            pages: docs.iter().map(|doc| &doc.page).collect(),
            css: ctx.css,
            theme: ctx.theme,
            harmonique: &ctx.harmonique,
        };

        let html = ctx
            .renderer
            .render_index(&listing)
            .map_err(|source| render_error(INDEX_PAGE, source))?;
        let html = if ctx.minify { minify_page(&html) } else { html };

        write_output(ctx.output_dir, Path::new(INDEX_PAGE), &html)?;
        Ok(())
    }
}

/// Writes `sitemap.xml` with the canonical URL of every published document.
///
/// Drafts never appear, even in a dev build.
pub struct SitemapStage;

impl FinalizeStage for SitemapStage {
    fn name(&self) -> &'static str {
        "sitemap"
    }

    fn finalize(&self, docs: &[ProcessingDocument], ctx: &PipelineContext) -> Result<(), PipelineError> {
        let listing = ListingContext {
            site: ctx.site,
            pages: docs
                .iter()
                .filter(|doc| !doc.page.draft)
                .map(|doc| &doc.page)
                .collect(),
            css: ctx.css,
            theme: ctx.theme,
            harmonique: &ctx.harmonique,
        };

        let xml = ctx
            .renderer
            .render_sitemap(&listing)
            .map_err(|source| render_error(SITEMAP, source))?;

        write_output(ctx.output_dir, Path::new(SITEMAP), &xml)?;
        Ok(())
    }
}

fn render_error(name: &str, source: RenderError) -> PipelineError {
    PipelineError::Render {
        path: name.into(),
        source,
    }
}
