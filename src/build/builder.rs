use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use super::document::{Document, FrontMatterError};
use super::highlight::SyntaxHighlighter;
use super::paths::{output_file, slug_from_path};
use super::pipeline::{GENERATED_FILES, MinifyStage, Pipeline, PipelineContext, PipelineError, ProcessingDocument};
use super::render::{HarmoniqueContext, PageInfo, RenderError, Renderer, SiteContext, ThemeContext};
use super::site::{BuildMode, Site, SiteError};
use super::source::{SourceError, SourceFile, discover};
use crate::config::LoadedConfig;
use crate::theme::{ThemeAssets, ThemeError};

#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error("{0}")]
    Parse(ParseFailures),

    #[error(transparent)]
    Site(#[from] SiteError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("theme error: {0}")]
    Theme(#[from] ThemeError),

    #[error("{} would be written by both {first} and {second}", output.display())]
    OutputConflict {
        output: PathBuf,
        first: String,
        second: String,
    },

    #[error("failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A source document that could not be turned into a [`Document`].
#[derive(thiserror::Error, Debug)]
pub enum ParseFailure {
    #[error("{}: {source}", path.display())]
    FrontMatter {
        path: PathBuf,
        source: FrontMatterError,
    },

    #[error("{}: failed to read: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Every parse failure of one build, in discovery order.
#[derive(Debug)]
pub struct ParseFailures(pub Vec<ParseFailure>);

impl fmt::Display for ParseFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} document(s):", self.0.len())?;
        for failure in &self.0 {
            write!(f, "\n  {failure}")?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct BuildResult {
    pub output_dir: PathBuf,
    /// Pages rendered and written
    pub published: usize,
    /// Drafts left out of a prod build
    pub excluded: usize,
    pub static_files: usize,
}

pub struct Builder {
    config: LoadedConfig,
    mode: BuildMode,
    /// Whether to inject the live reload script into pages
    live_reload: bool,
}

impl Builder {
    pub fn new(config: LoadedConfig, mode: BuildMode) -> Self {
        Self {
            config,
            mode,
            live_reload: false,
        }
    }

    /// Enable or disable the live reload script.
    pub fn with_live_reload(mut self, live_reload: bool) -> Self {
        self.live_reload = live_reload;
        self
    }

    /// Run one full build.
    ///
    /// Phases run strictly in order and every failure before the write stage
    /// leaves the output directory untouched:
    /// 1. Discover documents and static files
    /// 2. Parse every document, collecting all failures
    /// 3. Assemble the site and freeze the index
    /// 4. Run the pipeline (interlink → markdown → template → write, index, sitemap)
    /// 5. Copy static files
    /// 6. In prod, remove pages previously generated for drafts
    pub fn build(&self) -> Result<BuildResult, BuildError> {
        let config = &self.config.config;
        let source_dir = self.config.source_dir();
        let output_dir = self.config.output_dir();
        let theme_dir = self.config.theme_dir();

        // Step 1: Discover content, leaving out our own files when they sit inside the source tree
        let skip = [output_dir.clone(), theme_dir.clone(), self.config.config_path.clone()];
        let tree = discover(&source_dir, &skip)?;
        if tree.is_empty() {
            tracing::info!(source = %source_dir.display(), "nothing to build");
            return Ok(BuildResult {
                output_dir,
                published: 0,
                excluded: 0,
                static_files: 0,
            });
        }
        tracing::info!(
            mode = %self.mode,
            documents = tree.documents.len(),
            static_files = tree.static_files.len(),
            "building {}",
            source_dir.display()
        );

        // Step 2: Parse documents
        let documents = self.parse_documents(&tree.documents)?;

        // Step 3: Assemble the site
        let Site {
            mode,
            documents,
            excluded,
            index,
        } = Site::assemble(documents, self.mode, &config.links)?;
        tracing::debug!(indexed = index.len(), excluded = excluded.len(), "site assembled");
        check_output_conflicts(&documents, &excluded, &tree.static_files)?;

        // Step 4: Load theme and services
        let renderer = Renderer::new(&theme_dir)?;
        let theme_assets = ThemeAssets::load(&theme_dir)?;
        let highlighter = SyntaxHighlighter::new(&config.markdown.highlight_theme);
        let css = match highlighter.generate_css() {
            Some(highlight_css) => format!("{}\n{}", theme_assets.css, highlight_css),
            None => theme_assets.css,
        };

        let site_context = SiteContext::from_config(config);
        let theme_context = ThemeContext {
            settings: config.theme.settings.clone(),
        };

        let mut docs: Vec<ProcessingDocument> = documents
            .into_iter()
            .map(|doc| {
                let page = PageInfo::from_document(&doc, &config.site.url, &config.links);
                ProcessingDocument::new(doc, page)
            })
            .collect();

        let ctx = PipelineContext {
            output_dir: &output_dir,
            site: &site_context,
            theme: &theme_context,
            css: &css,
            markdown_config: &config.markdown,
            index: &index,
            highlighter: &highlighter,
            renderer: &renderer,
            harmonique: HarmoniqueContext::new(mode, self.live_reload),
            minify: config.build.minify,
        };

        // Step 5: Run the pipeline
        let mut pipeline = Pipeline::default_pipeline();
        if config.build.minify {
            pipeline.insert_after("template", MinifyStage);
        }
        pipeline.run(&mut docs, &ctx)?;

        // Step 6: Copy static files
        for file in &tree.static_files {
            copy_static(file, &output_dir)?;
        }

        // Step 7: Drafts must not linger from an earlier dev build
        if !mode.includes_drafts() {
            for draft in &excluded {
                remove_stale_page(draft, &output_dir)?;
            }
        }

        let result = BuildResult {
            output_dir,
            published: docs.len(),
            excluded: excluded.len(),
            static_files: tree.static_files.len(),
        };
        tracing::info!(
            published = result.published,
            excluded = result.excluded,
            static_files = result.static_files,
            "wrote site to {}",
            result.output_dir.display()
        );
        Ok(result)
    }

    /// Read and parse every document, reporting all failures at once.
    fn parse_documents(&self, files: &[SourceFile]) -> Result<Vec<Document>, BuildError> {
        let scheme = self.config.config.links.output_scheme;
        let mut documents = Vec::with_capacity(files.len());
        let mut failures = Vec::new();

        for file in files {
            let Some(slug) = slug_from_path(&file.relative) else {
                tracing::warn!(path = %file.relative.display(), "skipping document without a usable file name");
                continue;
            };

            let content = match std::fs::read_to_string(&file.path) {
                Ok(content) => content,
                Err(source) => {
                    failures.push(ParseFailure::Read {
                        path: file.relative.clone(),
                        source,
                    });
                    continue;
                }
            };

            match Document::parse(slug, file.relative.clone(), &content, scheme) {
                Ok(doc) => documents.push(doc),
                Err(source) => failures.push(ParseFailure::FrontMatter {
                    path: file.relative.clone(),
                    source,
                }),
            }
        }

        if failures.is_empty() {
            Ok(documents)
        } else {
            Err(BuildError::Parse(ParseFailures(failures)))
        }
    }
}

/// Every output file must have a single writer, or the last one silently wins.
///
/// Excluded drafts count too: in prod their old page is deleted, which must
/// never hit a file another writer produced.
fn check_output_conflicts(
    documents: &[Document],
    excluded: &[Document],
    static_files: &[SourceFile],
) -> Result<(), BuildError> {
    let mut writers: BTreeMap<PathBuf, String> = GENERATED_FILES
        .iter()
        .map(|name| (PathBuf::from(name), format!("the generated {name}")))
        .collect();

    let pages = documents
        .iter()
        .chain(excluded)
        .map(|doc| (doc.output_path.clone(), doc.source_path.display().to_string()));
    let statics = static_files
        .iter()
        .map(|file| (file.relative.clone(), file.relative.display().to_string()));

    for (output, writer) in pages.chain(statics) {
        if let Some(first) = writers.get(&output) {
            return Err(BuildError::OutputConflict {
                output,
                first: first.clone(),
                second: writer,
            });
        }
        writers.insert(output, writer);
    }
    Ok(())
}

fn copy_static(file: &SourceFile, output_dir: &Path) -> Result<(), BuildError> {
    let dest = output_file(output_dir, &file.relative);
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|source| BuildError::Io {
            action: "create directory",
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::copy(&file.path, &dest).map_err(|source| BuildError::Io {
        action: "copy",
        path: file.path.clone(),
        source,
    })?;
    Ok(())
}

/// Delete the page a draft produced in an earlier build. Nothing else is touched.
fn remove_stale_page(draft: &Document, output_dir: &Path) -> Result<(), BuildError> {
    let page = output_file(output_dir, &draft.output_path);
    if !page.is_file() {
        return Ok(());
    }
    std::fs::remove_file(&page).map_err(|source| BuildError::Io {
        action: "remove",
        path: page.clone(),
        source,
    })?;
    tracing::info!(slug = %draft.slug, "removed page of unpublished draft");
    Ok(())
}
