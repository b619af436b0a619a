//! Path and URL conversion utilities.
//!
//! This module handles conversions between:
//! - Slugs (the identity of a document, taken from its file stem)
//! - URL paths (the site-relative URL at which a document is served)
//! - Output file paths (where files are written in the output directory)
//!
//! All of these depend on the slug and the output scheme only, so editing a
//! document's title or date never moves it.

use std::path::{Path, PathBuf};

use crate::config::{LinkConfig, OutputScheme};

/// Derive a document's slug from its source path (the file stem).
pub fn slug_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Relative output file for a slug.
///
/// # Examples
/// ```ignore
/// output_path_for("hello-world", OutputScheme::Pretty) => "hello-world/index.html"
/// output_path_for("hello-world", OutputScheme::Flat) => "hello-world.html"
/// ```
pub fn output_path_for(slug: &str, scheme: OutputScheme) -> PathBuf {
    match scheme {
        OutputScheme::Pretty => PathBuf::from(slug).join("index.html"),
        OutputScheme::Flat => PathBuf::from(format!("{slug}.html")),
    }
}

/// Site-relative URL path for a slug (no leading slash).
///
/// # Examples
/// ```ignore
/// url_path_for("hello-world", OutputScheme::Pretty) => "hello-world/"
/// url_path_for("hello-world", OutputScheme::Flat) => "hello-world.html"
/// ```
pub fn url_path_for(slug: &str, scheme: OutputScheme) -> String {
    match scheme {
        OutputScheme::Pretty => format!("{slug}/"),
        OutputScheme::Flat => format!("{slug}.html"),
    }
}

/// Expand the interlink URL template for a document URL path.
///
/// `{base}` is replaced with the configured base path (always ending in `/`),
/// `{path}` with the document's URL path.
pub fn interlink_url(url_path: &str, links: &LinkConfig) -> String {
    let mut base = links.base_path.clone();
    if !base.ends_with('/') {
        base.push('/');
    }
    links
        .interlink_url_template
        .replace("{base}", &base)
        .replace("{path}", url_path)
}

/// Absolute canonical URL for a document URL path.
pub fn canonical_url(site_url: &str, url_path: &str) -> String {
    format!("{}/{}", site_url.trim_end_matches('/'), url_path)
}

/// Convert a relative output path to a file path in the output directory.
pub fn output_file(output_dir: &Path, relative: &Path) -> PathBuf {
    output_dir.join(relative)
}
