//! Configuration type definitions.
//!
//! This module contains all the data structures used in `harmonique.yaml`.
//! These types are pure data - no I/O or complex logic. Every section and
//! field has a default, so an absent config file yields a working setup.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// =============================================================================
// Root config
// =============================================================================

/// The whole site configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default)]
    pub site: SiteMeta,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub theme: ThemeConfig,
    #[serde(default)]
    pub links: LinkConfig,
    #[serde(default)]
    pub markdown: MarkdownConfig,
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub server: ServerConfig,
    /// Development-specific settings (watch mode, live reload)
    #[serde(default)]
    pub dev: DevConfig,
}

// =============================================================================
// Site metadata
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteMeta {
    #[serde(default = "default_site_title")]
    pub title: String,
    /// Canonical base URL, used for sitemap and canonical links
    #[serde(default = "default_site_url")]
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_site_title() -> String {
    "My Site".to_string()
}

fn default_site_url() -> String {
    "http://example.com/".to_string()
}

impl Default for SiteMeta {
    fn default() -> Self {
        Self {
            title: default_site_title(),
            url: default_site_url(),
            description: None,
        }
    }
}

// =============================================================================
// Paths
// =============================================================================

/// Source and destination roots, relative to the config file's directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_source")]
    pub source: PathBuf,
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

fn default_source() -> PathBuf {
    PathBuf::from("source")
}

fn default_output() -> PathBuf {
    PathBuf::from("output")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            output: default_output(),
        }
    }
}

// =============================================================================
// Theme configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    /// Theme directory holding `templates/` and `css/`
    #[serde(default = "default_theme_path")]
    pub path: PathBuf,
    /// Arbitrary settings passed to templates as `theme.settings`
    #[serde(default)]
    pub settings: serde_json::Value,
}

fn default_theme_path() -> PathBuf {
    PathBuf::from("theme")
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            path: default_theme_path(),
            settings: serde_json::Value::Null,
        }
    }
}

// =============================================================================
// Links and output layout
// =============================================================================

/// How a slug maps to a file in the output directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputScheme {
    /// `slug/index.html`, served as `slug/`
    #[default]
    Pretty,
    /// `slug.html`, served as `slug.html`
    Flat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Path prefix the site is served under
    #[serde(default = "default_base_path")]
    pub base_path: String,
    /// Template for interlink targets. `{base}` is the base path and
    /// `{path}` the document's URL path under the output scheme.
    #[serde(default = "default_interlink_url_template")]
    pub interlink_url_template: String,
    #[serde(default)]
    pub output_scheme: OutputScheme,
}

fn default_base_path() -> String {
    "/".to_string()
}

fn default_interlink_url_template() -> String {
    "{base}{path}".to_string()
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            interlink_url_template: default_interlink_url_template(),
            output_scheme: OutputScheme::default(),
        }
    }
}

// =============================================================================
// Markdown configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkdownConfig {
    /// Extensions to enable for markdown processing
    #[serde(default = "default_markdown_extensions")]
    pub extensions: Vec<String>,
    /// autumnus theme used for the highlighting stylesheet
    #[serde(default = "default_highlight_theme")]
    pub highlight_theme: String,
}

fn default_markdown_extensions() -> Vec<String> {
    vec![
        "definition_lists".to_string(),
        "footnotes".to_string(),
        "gfm".to_string(),
        "heading_attributes".to_string(),
        "strikethrough".to_string(),
        "tables".to_string(),
        "tasklists".to_string(),
    ]
}

fn default_highlight_theme() -> String {
    "github_light".to_string()
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            extensions: default_markdown_extensions(),
            highlight_theme: default_highlight_theme(),
        }
    }
}

// =============================================================================
// Build configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Minify generated HTML (inline CSS included)
    #[serde(default)]
    pub minify: bool,
}

// =============================================================================
// Server configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8888
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

// =============================================================================
// Development configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevConfig {
    /// File watching configuration
    #[serde(default)]
    pub watch: WatchConfig,
    /// Enable live reload in the browser when files change (default: true)
    #[serde(default = "default_live_reload")]
    pub live_reload: bool,
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            watch: WatchConfig::default(),
            live_reload: true,
        }
    }
}

fn default_live_reload() -> bool {
    true
}

/// Configuration for file watching during development.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Use polling-based watcher instead of native file system events.
    /// Useful for network filesystems, Docker volumes, or other situations
    /// where native events are unreliable.
    #[serde(default)]
    pub poll: bool,
    /// Poll interval in milliseconds (only used if poll=true).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Debounce timeout in milliseconds.
    /// Changes within this window are batched together.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_debounce_ms() -> u64 {
    100
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll: false,
            poll_interval_ms: default_poll_interval_ms(),
            debounce_ms: default_debounce_ms(),
        }
    }
}
