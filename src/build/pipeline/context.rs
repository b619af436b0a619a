//! Pipeline context for sharing state across stages.

use std::path::Path;

use crate::build::highlight::SyntaxHighlighter;
use crate::build::render::{HarmoniqueContext, Renderer, SiteContext, ThemeContext};
use crate::build::site::SiteIndex;
use crate::config::MarkdownConfig;

/// Shared context for pipeline stages.
///
/// Everything here is read-only for the duration of a build, so stages can
/// hand `&PipelineContext` to rayon workers.
pub struct PipelineContext<'a> {
    // === Output configuration ===
    /// Directory where output files are written
    pub output_dir: &'a Path,

    // === Site-level data ===
    /// Site metadata (title, URL, description)
    pub site: &'a SiteContext,

    /// Theme settings passed to templates
    pub theme: &'a ThemeContext,

    /// Theme stylesheet and highlighting rules, inlined into every page
    pub css: &'a str,

    /// Markdown processing configuration
    pub markdown_config: &'a MarkdownConfig,

    /// Frozen slug index that interlinks resolve against
    pub index: &'a SiteIndex,

    // === Services ===
    /// Syntax highlighter for code blocks
    pub highlighter: &'a SyntaxHighlighter,

    /// Template renderer
    pub renderer: &'a Renderer,

    // === Mode flags ===
    /// Build mode, live reload, version
    pub harmonique: HarmoniqueContext,

    /// Minify generated HTML pages
    pub minify: bool,
}
