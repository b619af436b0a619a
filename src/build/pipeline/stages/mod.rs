//! Default pipeline stages.
//!
//! The standard document processing pipeline consists of:
//!
//! 1. **InterlinkStage** - Rewrite `[il:slug][anchor]` into Markdown links
//! 2. **MarkdownStage** - Convert markdown to HTML with syntax highlighting
//! 3. **TemplateStage** - Wrap content in the page template
//! 4. **MinifyStage** - Optional, shrink the final HTML
//! 5. **WriteStage** - Write final HTML to output directory
//!
//! followed by the finalize stages **IndexPageStage** and **SitemapStage**.

mod finalize;
mod interlink;
mod markdown;
mod minify;
mod template;
mod write;

pub use finalize::{GENERATED_FILES, IndexPageStage, SitemapStage};
pub use interlink::InterlinkStage;
pub use markdown::MarkdownStage;
pub use minify::MinifyStage;
pub use template::TemplateStage;
pub use write::WriteStage;

#[cfg(test)]
pub(crate) mod fixture {
    //! Owned state behind a `PipelineContext`, for stage tests.

    use std::path::{Path, PathBuf};

    use crate::build::document::Document;
    use crate::build::highlight::SyntaxHighlighter;
    use crate::build::pipeline::{PipelineContext, ProcessingDocument};
    use crate::build::render::{HarmoniqueContext, PageInfo, Renderer, SiteContext, ThemeContext};
    use crate::build::site::{BuildMode, Site};
    use crate::config::{MarkdownConfig, SiteConfig};

    pub struct Fixture {
        pub config: SiteConfig,
        pub site: Site,
        site_context: SiteContext,
        theme: ThemeContext,
        highlighter: SyntaxHighlighter,
        renderer: Renderer,
        pub markdown_config: MarkdownConfig,
    }

    impl Fixture {
        /// `sources` are `(relative path, file contents)` pairs.
        pub fn new(sources: &[(&str, &str)], mode: BuildMode) -> Self {
            let config = SiteConfig::default();
            let docs = sources
                .iter()
                .map(|(path, content)| {
                    let path = PathBuf::from(path);
                    let slug = path.file_stem().unwrap().to_string_lossy().to_string();
                    Document::parse(slug, path, content, config.links.output_scheme).unwrap()
                })
                .collect();
            let site = Site::assemble(docs, mode, &config.links).unwrap();
            Self {
                site_context: SiteContext::from_config(&config),
                theme: ThemeContext {
                    settings: serde_json::Value::Null,
                },
                highlighter: SyntaxHighlighter::default(),
                renderer: Renderer::new(Path::new("/nonexistent-theme")).unwrap(),
                markdown_config: MarkdownConfig::default(),
                site,
                config,
            }
        }

        pub fn documents(&self) -> Vec<ProcessingDocument> {
            self.site
                .documents
                .iter()
                .map(|doc| {
                    let page = PageInfo::from_document(doc, &self.config.site.url, &self.config.links);
                    ProcessingDocument::new(doc.clone(), page)
                })
                .collect()
        }

        pub fn context<'a>(&'a self, output_dir: &'a Path) -> PipelineContext<'a> {
            PipelineContext {
                output_dir,
                site: &self.site_context,
                theme: &self.theme,
                css: "",
                markdown_config: &self.markdown_config,
                index: &self.site.index,
                highlighter: &self.highlighter,
                renderer: &self.renderer,
                harmonique: HarmoniqueContext::new(self.site.mode, false),
                minify: false,
            }
        }
    }
}
