//! Discovery of the source tree.
//!
//! Every file under the source root is either a document (`.md`,
//! `.markdown`) or a static asset that is copied verbatim. Hidden files and
//! directories are skipped, and so are the paths the caller asks to skip
//! (the output directory when it sits inside the source tree). Entries come
//! back sorted by path so repeated builds see the same order.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

/// Extensions that mark a file as a document.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Files to ignore during directory traversal
const IGNORED_FILES: &[&str] = &["Thumbs.db"];

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("source path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("source path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("failed to walk source directory {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
}

/// A file found in the source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute path on disk
    pub path: PathBuf,
    /// Path relative to the source root
    pub relative: PathBuf,
}

/// Everything found under the source root.
#[derive(Debug, Default)]
pub struct SourceTree {
    pub documents: Vec<SourceFile>,
    pub static_files: Vec<SourceFile>,
}

impl SourceTree {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty() && self.static_files.is_empty()
    }
}

/// Whether a path names a document.
pub fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| DOCUMENT_EXTENSIONS.contains(&ext))
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|name| name.starts_with('.'))
}

/// Whether an entry is one of the (canonicalized) `skip` paths.
fn is_skipped(entry: &DirEntry, skip: &[PathBuf]) -> bool {
    skip.iter().any(|skipped| {
        skipped.file_name() == Some(entry.file_name())
            && entry.path().canonicalize().is_ok_and(|path| &path == skipped)
    })
}

/// Walk the source root and split its files into documents and static assets.
///
/// Files and directories in `skip` are left out, whether or not they exist.
pub fn discover(source_dir: &Path, skip: &[PathBuf]) -> Result<SourceTree, SourceError> {
    if !source_dir.exists() {
        return Err(SourceError::PathNotFound(source_dir.to_path_buf()));
    }
    if !source_dir.is_dir() {
        return Err(SourceError::NotADirectory(source_dir.to_path_buf()));
    }

    let skip: Vec<PathBuf> = skip.iter().filter_map(|p| p.canonicalize().ok()).collect();

    let mut tree = SourceTree::default();
    let walker = WalkDir::new(source_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !(is_hidden(e.file_name()) || is_skipped(e, &skip)));

    for entry in walker {
        let entry = entry.map_err(|e| SourceError::Walk {
            path: source_dir.to_path_buf(),
            source: e,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_str().unwrap_or_default();
        if IGNORED_FILES.contains(&name) {
            continue;
        }

        let path = entry.into_path();
        let relative = path.strip_prefix(source_dir).unwrap_or(&path).to_path_buf();
        let file = SourceFile { path, relative };
        if is_document(&file.relative) {
            tree.documents.push(file);
        } else {
            tree.static_files.push(file);
        }
    }

    tracing::debug!(
        documents = tree.documents.len(),
        static_files = tree.static_files.len(),
        "discovered source tree"
    );
    Ok(tree)
}
