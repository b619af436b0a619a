//! The site model: the full set of parsed documents for one build.
//!
//! Assembling a [`Site`] enforces slug uniqueness, applies the draft policy
//! of the selected [`BuildMode`] and freezes the [`SiteIndex`] that interlinks
//! resolve against. The index is a plain value created per build and handed
//! to the pipeline by reference.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;

use super::document::Document;
use super::paths::interlink_url;
use crate::config::LinkConfig;

#[derive(thiserror::Error, Debug)]
pub enum SiteError {
    #[error(
        "duplicate slug '{slug}': defined by both {} and {}",
        first.display(),
        second.display()
    )]
    DuplicateSlug {
        slug: String,
        first: PathBuf,
        second: PathBuf,
    },
}

// =============================================================================
// Build mode
// =============================================================================

/// Which documents a build publishes. Chosen once per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Drafts are rendered and can be linked to
    Dev,
    /// Drafts are left out entirely
    Prod,
}

impl BuildMode {
    pub fn includes_drafts(self) -> bool {
        matches!(self, BuildMode::Dev)
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildMode::Dev => write!(f, "dev"),
            BuildMode::Prod => write!(f, "prod"),
        }
    }
}

// =============================================================================
// Site index
// =============================================================================

/// What the index knows about a linkable document.
#[derive(Debug, Clone, Serialize)]
pub struct IndexEntry {
    pub title: String,
    pub date: Option<NaiveDate>,
    /// Resolved link target (interlink URL template applied)
    pub url: String,
    /// Output file relative to the output directory
    pub output_path: PathBuf,
}

/// Slug to document mapping used to resolve interlinks.
#[derive(Debug, Default)]
pub struct SiteIndex {
    entries: BTreeMap<String, IndexEntry>,
}

impl SiteIndex {
    fn from_documents<'a>(docs: impl IntoIterator<Item = &'a Document>, links: &LinkConfig) -> Self {
        let entries = docs
            .into_iter()
            .map(|doc| {
                let entry = IndexEntry {
                    title: doc.title().to_string(),
                    date: doc.date(),
                    url: interlink_url(&doc.url_path, links),
                    output_path: doc.output_path.clone(),
                };
                (doc.slug.clone(), entry)
            })
            .collect();
        Self { entries }
    }

    /// Look up a slug (exact match).
    pub fn get(&self, slug: &str) -> Option<&IndexEntry> {
        self.entries.get(slug)
    }

    #[cfg(test)]
    pub fn contains(&self, slug: &str) -> bool {
        self.entries.contains_key(slug)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

// =============================================================================
// Site
// =============================================================================

/// All documents of one build, split by the draft policy.
#[derive(Debug)]
pub struct Site {
    pub mode: BuildMode,
    /// Documents to render, newest first
    pub documents: Vec<Document>,
    /// Drafts left out of a prod build
    pub excluded: Vec<Document>,
    /// Index over `documents`
    pub index: SiteIndex,
}

impl Site {
    /// Assemble the site from every parsed document.
    ///
    /// Slug uniqueness is checked across all documents, drafts included,
    /// before the draft policy is applied.
    pub fn assemble(
        documents: Vec<Document>,
        mode: BuildMode,
        links: &LinkConfig,
    ) -> Result<Self, SiteError> {
        check_unique_slugs(&documents)?;

        let (mut published, excluded): (Vec<Document>, Vec<Document>) = documents
            .into_iter()
            .partition(|doc| mode.includes_drafts() || !doc.is_draft());

        sort_for_listing(&mut published);
        let index = SiteIndex::from_documents(&published, links);

        Ok(Self {
            mode,
            documents: published,
            excluded,
            index,
        })
    }
}

fn check_unique_slugs(documents: &[Document]) -> Result<(), SiteError> {
    let mut seen: BTreeMap<&str, &Document> = BTreeMap::new();
    for doc in documents {
        if let Some(first) = seen.insert(&doc.slug, doc) {
            return Err(SiteError::DuplicateSlug {
                slug: doc.slug.clone(),
                first: first.source_path.clone(),
                second: doc.source_path.clone(),
            });
        }
    }
    Ok(())
}

/// Newest first, undated documents last, ties broken by slug.
fn sort_for_listing(documents: &mut [Document]) {
    documents.sort_by(|a, b| match (a.date(), b.date()) {
        (Some(x), Some(y)) => y.cmp(&x).then_with(|| a.slug.cmp(&b.slug)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.slug.cmp(&b.slug),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputScheme;

    fn doc(path: &str, date: &str, draft: bool) -> Document {
        let slug = std::path::Path::new(path)
            .file_stem()
            .unwrap()
            .to_string_lossy()
            .to_string();
        let content = format!("---\ntitle: {slug}\ndate: {date}\ndraft: {draft}\n---\nBody\n");
        Document::parse(slug, PathBuf::from(path), &content, OutputScheme::Pretty).unwrap()
    }

    #[test]
    fn test_duplicate_slug_lists_both_paths() {
        let docs = vec![
            doc("essays/hello-world.md", "2018-01-01", false),
            doc("notes/hello-world.md", "2018-02-01", false),
        ];
        let err = Site::assemble(docs, BuildMode::Prod, &LinkConfig::default()).unwrap_err();
        let SiteError::DuplicateSlug {
            slug,
            first,
            second,
        } = &err;
        assert_eq!(slug, "hello-world");
        assert_eq!(first, &PathBuf::from("essays/hello-world.md"));
        assert_eq!(second, &PathBuf::from("notes/hello-world.md"));
        let message = err.to_string();
        assert!(message.contains("essays/hello-world.md"));
        assert!(message.contains("notes/hello-world.md"));
    }

    #[test]
    fn test_duplicate_slug_with_draft_still_fails() {
        let docs = vec![
            doc("a/post.md", "2018-01-01", true),
            doc("b/post.md", "2018-01-01", false),
        ];
        assert!(Site::assemble(docs, BuildMode::Prod, &LinkConfig::default()).is_err());
    }

    #[test]
    fn test_prod_excludes_drafts_from_index() {
        let docs = vec![
            doc("published.md", "2018-01-01", false),
            doc("secret.md", "2018-01-02", true),
        ];
        let site = Site::assemble(docs, BuildMode::Prod, &LinkConfig::default()).unwrap();
        assert_eq!(site.documents.len(), 1);
        assert_eq!(site.excluded.len(), 1);
        assert!(site.index.contains("published"));
        assert!(!site.index.contains("secret"));
    }

    #[test]
    fn test_dev_includes_drafts() {
        let docs = vec![
            doc("published.md", "2018-01-01", false),
            doc("secret.md", "2018-01-02", true),
        ];
        let site = Site::assemble(docs, BuildMode::Dev, &LinkConfig::default()).unwrap();
        assert_eq!(site.documents.len(), 2);
        assert!(site.excluded.is_empty());
        assert!(site.index.contains("secret"));
        assert_eq!(site.index.len(), 2);
    }

    #[test]
    fn test_index_entry_url() {
        let docs = vec![doc("hello-world.md", "2018-01-01", false)];
        let site = Site::assemble(docs, BuildMode::Prod, &LinkConfig::default()).unwrap();
        let entry = site.index.get("hello-world").unwrap();
        assert_eq!(entry.url, "/hello-world/");
        assert_eq!(entry.output_path, PathBuf::from("hello-world/index.html"));
        assert!(site.index.get("Hello-World").is_none());
    }

    #[test]
    fn test_documents_sorted_newest_first() {
        let undated = Document::parse(
            "about".to_string(),
            PathBuf::from("about.md"),
            "No front matter",
            OutputScheme::Pretty,
        )
        .unwrap();
        let docs = vec![
            undated,
            doc("old.md", "2017-06-01", false),
            doc("new.md", "2019-06-01", false),
            doc("also-new.md", "2019-06-01", false),
        ];
        let site = Site::assemble(docs, BuildMode::Prod, &LinkConfig::default()).unwrap();
        let slugs: Vec<&str> = site.documents.iter().map(|d| d.slug.as_str()).collect();
        assert_eq!(slugs, vec!["also-new", "new", "old", "about"]);
    }
}
