//! Theme files: page templates and stylesheets.
//!
//! A theme directory looks like
//!
//! ```text
//! theme/
//!   templates/detail.html   one page per document
//!   templates/index.html    the listing at the site root
//!   templates/sitemap.xml
//!   css/*.css               concatenated in file name order
//! ```
//!
//! Everything is optional. Missing templates and a missing `css/` directory
//! fall back to the defaults compiled into the binary.

use std::path::{Path, PathBuf};

/// Templates shipped with the binary, by template name.
pub const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    ("detail.html", include_str!("../theme/templates/detail.html")),
    ("index.html", include_str!("../theme/templates/index.html")),
    ("sitemap.xml", include_str!("../theme/templates/sitemap.xml")),
];

/// Stylesheets shipped with the binary, by file name.
pub const BUILTIN_CSS: &[(&str, &str)] = &[("site.css", include_str!("../theme/css/site.css"))];

#[derive(thiserror::Error, Debug)]
pub enum ThemeError {
    #[error("failed to read theme file {0}: {1}")]
    Io(PathBuf, std::io::Error),
}

/// Stylesheets of a theme, resolved for one build.
#[derive(Debug, Clone)]
pub struct ThemeAssets {
    /// All CSS chunks joined, in file name order
    pub css: String,
}

impl ThemeAssets {
    /// Load the CSS of the theme at `theme_dir`.
    /// Returns the built-in stylesheet if the theme has no `css/` directory.
    pub fn load(theme_dir: &Path) -> Result<Self, ThemeError> {
        let css_dir = theme_dir.join("css");
        if !css_dir.is_dir() {
            return Ok(Self::builtin());
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(&css_dir)
            .map_err(|e| ThemeError::Io(css_dir.clone(), e))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "css"))
            .collect();
        files.sort();

        let mut chunks = Vec::with_capacity(files.len());
        for path in files {
            let chunk = std::fs::read_to_string(&path).map_err(|e| ThemeError::Io(path.clone(), e))?;
            chunks.push(chunk);
        }

        tracing::debug!(dir = %css_dir.display(), chunks = chunks.len(), "loaded theme css");
        Ok(Self {
            css: chunks.join("\n"),
        })
    }

    fn builtin() -> Self {
        Self {
            css: BUILTIN_CSS
                .iter()
                .map(|(_, css)| *css)
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Write the built-in theme into `theme_dir`, leaving existing files alone.
///
/// Returns the files that were created.
pub fn scaffold(theme_dir: &Path) -> Result<Vec<PathBuf>, ThemeError> {
    let files = BUILTIN_TEMPLATES
        .iter()
        .map(|(name, body)| (theme_dir.join("templates").join(name), *body))
        .chain(
            BUILTIN_CSS
                .iter()
                .map(|(name, body)| (theme_dir.join("css").join(name), *body)),
        );

    let mut created = Vec::new();
    for (path, body) in files {
        if path.exists() {
            continue;
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ThemeError::Io(parent.to_path_buf(), e))?;
        }
        std::fs::write(&path, body).map_err(|e| ThemeError::Io(path.clone(), e))?;
        created.push(path);
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_theme_uses_builtin_css() {
        let dir = tempfile::tempdir().unwrap();
        let assets = ThemeAssets::load(&dir.path().join("nope")).unwrap();
        assert!(assets.css.contains(".page-list"));
    }

    #[test]
    fn test_css_chunks_in_file_name_order() {
        let dir = tempfile::tempdir().unwrap();
        let css = dir.path().join("css");
        std::fs::create_dir_all(&css).unwrap();
        std::fs::write(css.join("b.css"), "b {}").unwrap();
        std::fs::write(css.join("a.css"), "a {}").unwrap();
        std::fs::write(css.join("notes.txt"), "ignored").unwrap();

        let assets = ThemeAssets::load(dir.path()).unwrap();
        assert_eq!(assets.css, "a {}\nb {}");
    }

    #[test]
    fn test_scaffold_keeps_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let templates = dir.path().join("templates");
        std::fs::create_dir_all(&templates).unwrap();
        std::fs::write(templates.join("detail.html"), "mine").unwrap();

        let created = scaffold(dir.path()).unwrap();
        assert_eq!(created.len(), BUILTIN_TEMPLATES.len() + BUILTIN_CSS.len() - 1);
        assert_eq!(
            std::fs::read_to_string(templates.join("detail.html")).unwrap(),
            "mine"
        );
        assert!(dir.path().join("css/site.css").exists());
    }
}
