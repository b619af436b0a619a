use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;
use tera::{Context, Tera};

use super::document::Document;
use super::paths::{canonical_url, interlink_url};
use super::site::BuildMode;
use crate::config::{LinkConfig, SiteConfig};
use crate::theme::BUILTIN_TEMPLATES;
use crate::util::html_escape;

pub const DETAIL_TEMPLATE: &str = "detail.html";
pub const INDEX_TEMPLATE: &str = "index.html";
pub const SITEMAP_TEMPLATE: &str = "sitemap.xml";

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] tera::Error),
}

/// The template renderer, wrapping Tera.
///
/// Templates from the theme directory take precedence; any of the three page
/// templates the theme does not provide comes from the built-in set.
pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    /// Create a new renderer loading templates from the given theme directory.
    pub fn new(theme_path: &Path) -> Result<Self, RenderError> {
        let mut builtin = Tera::default();
        builtin.add_raw_templates(BUILTIN_TEMPLATES.iter().copied())?;

        let templates_path = theme_path.join("templates");
        let mut tera = if templates_path.is_dir() {
            let glob = templates_path.join("**/*");
            let glob_str = glob.to_string_lossy();
            let mut tera = Tera::new(&glob_str)?;
            tera.extend(&builtin)?;
            tera
        } else {
            tracing::debug!(theme = %theme_path.display(), "no theme templates, using built-in set");
            builtin
        };
        // Tera's default escaper also encodes `/`, which mangles URLs
        tera.set_escape_fn(html_escape);

        Ok(Self { tera })
    }

    /// Render a document page with the given context.
    pub fn render_page(&self, context: &PageContext) -> Result<String, RenderError> {
        let mut tera_context = Context::new();
        tera_context.insert("site", &context.site);
        tera_context.insert("page", &context.page);
        tera_context.insert("content", &context.content);
        tera_context.insert("toc", &context.toc);
        tera_context.insert("css", &context.css);
        tera_context.insert("theme", &context.theme);
        tera_context.insert("harmonique", &context.harmonique);

        Ok(self.tera.render(DETAIL_TEMPLATE, &tera_context)?)
    }

    /// Render the listing page at the site root.
    pub fn render_index(&self, context: &ListingContext) -> Result<String, RenderError> {
        self.render_listing(INDEX_TEMPLATE, context)
    }

    /// Render the XML sitemap.
    pub fn render_sitemap(&self, context: &ListingContext) -> Result<String, RenderError> {
        self.render_listing(SITEMAP_TEMPLATE, context)
    }

    fn render_listing(&self, template: &str, context: &ListingContext) -> Result<String, RenderError> {
        let mut tera_context = Context::new();
        tera_context.insert("site", &context.site);
        tera_context.insert("pages", &context.pages);
        tera_context.insert("css", &context.css);
        tera_context.insert("theme", &context.theme);
        tera_context.insert("harmonique", &context.harmonique);

        Ok(self.tera.render(template, &tera_context)?)
    }
}

/// Context passed to the page template.
#[derive(Debug, Serialize)]
pub struct PageContext<'a> {
    pub site: &'a SiteContext,
    pub page: &'a PageInfo,
    pub content: &'a str,
    /// Table of contents for the current page
    pub toc: &'a [TocEntry],
    /// Theme stylesheet plus highlighting rules, inlined by the templates
    pub css: &'a str,
    /// Theme settings from config, accessible as `theme.settings.*` in templates
    pub theme: &'a ThemeContext,
    pub harmonique: &'a HarmoniqueContext,
}

/// Context passed to the index and sitemap templates.
#[derive(Debug, Serialize)]
pub struct ListingContext<'a> {
    pub site: &'a SiteContext,
    /// Published pages, newest first
    pub pages: Vec<&'a PageInfo>,
    pub css: &'a str,
    pub theme: &'a ThemeContext,
    pub harmonique: &'a HarmoniqueContext,
}

/// Site-level information.
#[derive(Debug, Clone, Serialize)]
pub struct SiteContext {
    pub title: String,
    /// Canonical base URL
    pub url: String,
    pub description: Option<String>,
    /// Path prefix the site is served under, always ending in `/`
    pub base_path: String,
}

impl SiteContext {
    pub fn from_config(config: &SiteConfig) -> Self {
        let mut base_path = config.links.base_path.clone();
        if !base_path.ends_with('/') {
            base_path.push('/');
        }
        Self {
            title: config.site.title.clone(),
            url: config.site.url.clone(),
            description: config.site.description.clone(),
            base_path,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ThemeContext {
    pub settings: serde_json::Value,
}

/// Build information exposed to templates as `harmonique.*`.
#[derive(Debug, Clone, Serialize)]
pub struct HarmoniqueContext {
    pub mode: BuildMode,
    /// Include the live reload script
    pub live_reload: bool,
    pub version: String,
}

impl HarmoniqueContext {
    pub fn new(mode: BuildMode, live_reload: bool) -> Self {
        Self {
            mode,
            live_reload,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Information about a page.
#[derive(Debug, Clone, Serialize)]
pub struct PageInfo {
    pub slug: String,
    pub title: String,
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub draft: bool,
    /// Link target within the site
    pub url: String,
    /// Absolute URL under `site.url`
    pub canonical_url: String,
    /// Custom front matter fields, kept apart from the computed ones (`page.extra.author`)
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl PageInfo {
    pub fn from_document(doc: &Document, site_url: &str, links: &LinkConfig) -> Self {
        let fm = &doc.front_matter;
        Self {
            slug: doc.slug.clone(),
            title: fm.title.clone(),
            date: fm.date,
            description: fm.description.clone(),
            location: fm.location.clone(),
            draft: fm.draft,
            url: interlink_url(&doc.url_path, links),
            canonical_url: canonical_url(site_url, &doc.url_path),
            extra: fm.extra.clone(),
        }
    }
}

/// A table of contents entry for the current page.
#[derive(Debug, Clone, Serialize)]
pub struct TocEntry {
    /// The heading text
    pub text: String,
    /// The heading id (for anchor links)
    pub id: String,
    /// The heading level (1-6)
    pub level: u8,
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::OutputScheme;

    fn page() -> PageInfo {
        let doc = Document::parse(
            "hello-world".to_string(),
            PathBuf::from("hello-world.md"),
            "---\ntitle: Hello <World>\ndate: 2018-01-01\nmood: sunny\n---\nBody\n",
            OutputScheme::Pretty,
        )
        .unwrap();
        PageInfo::from_document(&doc, "http://example.com/", &LinkConfig::default())
    }

    fn site() -> SiteContext {
        SiteContext::from_config(&SiteConfig::default())
    }

    fn theme() -> ThemeContext {
        ThemeContext {
            settings: serde_json::json!({ "accent": "teal" }),
        }
    }

    #[test]
    fn test_builtin_detail_template() {
        let renderer = Renderer::new(Path::new("/nonexistent-theme")).unwrap();
        let (site, page, theme) = (site(), page(), theme());
        let harmonique = HarmoniqueContext::new(BuildMode::Prod, false);
        let html = renderer
            .render_page(&PageContext {
                site: &site,
                page: &page,
                content: "<p>Rendered <em>body</em></p>",
                toc: &[],
                css: "body {}",
                theme: &theme,
                harmonique: &harmonique,
            })
            .unwrap();

        // Content is inserted as-is, front matter text is escaped
        assert!(html.contains("<p>Rendered <em>body</em></p>"));
        assert!(html.contains("Hello &lt;World&gt;"));
        assert!(html.contains("2018-01-01"));
        assert!(html.contains("http://example.com/hello-world/"));
        assert!(!html.contains("live-reload"));
    }

    #[test]
    fn test_live_reload_script() {
        let renderer = Renderer::new(Path::new("/nonexistent-theme")).unwrap();
        let (site, page, theme) = (site(), page(), theme());
        let harmonique = HarmoniqueContext::new(BuildMode::Dev, true);
        let html = renderer
            .render_page(&PageContext {
                site: &site,
                page: &page,
                content: "",
                toc: &[],
                css: "",
                theme: &theme,
                harmonique: &harmonique,
            })
            .unwrap();
        assert!(html.contains("/_harmonique/live-reload"));
    }

    #[test]
    fn test_theme_template_overrides_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let templates = dir.path().join("templates");
        std::fs::create_dir_all(&templates).unwrap();
        std::fs::write(
            templates.join("detail.html"),
            "{{ page.title }}|{{ page.extra.mood }}|{{ theme.settings.accent }}|{{ content | safe }}",
        )
        .unwrap();

        let renderer = Renderer::new(dir.path()).unwrap();
        let (site, page, theme) = (site(), page(), theme());
        let harmonique = HarmoniqueContext::new(BuildMode::Prod, false);
        let html = renderer
            .render_page(&PageContext {
                site: &site,
                page: &page,
                content: "<p>x</p>",
                toc: &[],
                css: "",
                theme: &theme,
                harmonique: &harmonique,
            })
            .unwrap();
        assert_eq!(html, "Hello &lt;World&gt;|sunny|teal|<p>x</p>");

        // The index template was not overridden
        let index = renderer
            .render_index(&ListingContext {
                site: &site,
                pages: vec![&page],
                css: "",
                theme: &theme,
                harmonique: &harmonique,
            })
            .unwrap();
        assert!(index.contains("<a href=\"/hello-world/\">"));
    }

    #[test]
    fn test_extra_keys_cannot_replace_computed_fields() {
        let doc = Document::parse(
            "moved".to_string(),
            PathBuf::from("moved.md"),
            "---\ntitle: Moved\ndate: 2018-01-01\nurl: http://old.example/moved\nslug: legacy\n---\nBody\n",
            OutputScheme::Pretty,
        )
        .unwrap();
        let page = PageInfo::from_document(&doc, "http://example.com/", &LinkConfig::default());

        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(value["url"], "/moved/");
        assert_eq!(value["slug"], "moved");
        assert_eq!(value["canonical_url"], "http://example.com/moved/");
        assert_eq!(value["extra"]["url"], "http://old.example/moved");
        assert_eq!(value["extra"]["slug"], "legacy");
    }

    #[test]
    fn test_sitemap() {
        let renderer = Renderer::new(Path::new("/nonexistent-theme")).unwrap();
        let (site, page, theme) = (site(), page(), theme());
        let harmonique = HarmoniqueContext::new(BuildMode::Prod, false);
        let xml = renderer
            .render_sitemap(&ListingContext {
                site: &site,
                pages: vec![&page],
                css: "",
                theme: &theme,
                harmonique: &harmonique,
            })
            .unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<loc>http://example.com/hello-world/</loc>"));
        assert!(xml.contains("<lastmod>2018-01-01</lastmod>"));
    }
}
