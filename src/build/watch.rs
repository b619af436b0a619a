//! File watching for automatic rebuilds.
//!
//! Uses `notify-debouncer-full` to watch the source and theme directories
//! (and the config file) for changes. Rebuilds are driven by a single
//! consumer calling [`FileWatcher::recv_batch`], which folds everything that
//! queued up during the previous build into one batch.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::Duration;

use notify::event::{MetadataKind, ModifyKind};
use notify::{
    Config as NotifyConfig, EventKind, PollWatcher, RecommendedWatcher, RecursiveMode, Watcher,
};
use notify_debouncer_full::{
    DebounceEventResult, Debouncer, RecommendedCache, new_debouncer, new_debouncer_opt,
};

use super::source::is_document;
use crate::config::WatchConfig;

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum WatchError {
    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),
}

// =============================================================================
// Watch events
// =============================================================================

/// A single relevant change on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// A document (markdown file) was added, modified, or deleted.
    Document { path: PathBuf, deleted: bool },
    /// A static file was added, modified, or deleted.
    StaticFile { path: PathBuf, deleted: bool },
    /// A template or stylesheet of the theme changed.
    Theme { path: PathBuf },
    /// The config file changed. It is only read at startup.
    Config,
}

/// Events sent from the file watcher.
#[derive(Debug)]
pub enum WatchEvent {
    /// Files changed, rebuild needed.
    FilesChanged(Vec<ChangeKind>),
    /// Watcher error occurred.
    Error(String),
}

// =============================================================================
// Path classification
// =============================================================================

/// Paths to watch for changes.
#[derive(Debug, Clone)]
pub struct WatchPaths {
    pub source_dir: PathBuf,
    /// Theme directory (for template and CSS changes).
    pub theme_dir: PathBuf,
    pub config_path: PathBuf,
    /// Output directory, never a trigger (it may sit inside a watched tree).
    pub output_dir: PathBuf,
}

/// Classifies file paths into change types.
#[derive(Debug, Clone)]
pub struct PathClassifier {
    paths: WatchPaths,
}

impl PathClassifier {
    /// Create a new path classifier.
    pub fn new(paths: WatchPaths) -> Self {
        Self { paths }
    }

    /// Classify a changed path into a ChangeKind.
    pub fn classify(&self, path: &Path, deleted: bool) -> Option<ChangeKind> {
        let paths = &self.paths;

        if path.starts_with(&paths.output_dir) {
            return None;
        }

        // Check if it's the main config
        if path == paths.config_path {
            return Some(ChangeKind::Config);
        }

        // Skip hidden files and directories below the watched roots
        let relative = path
            .strip_prefix(&paths.theme_dir)
            .or_else(|_| path.strip_prefix(&paths.source_dir))
            .ok()?;
        if relative
            .components()
            .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
        {
            return None;
        }

        if path.starts_with(&paths.theme_dir) {
            return Some(ChangeKind::Theme {
                path: path.to_path_buf(),
            });
        }

        let path = path.to_path_buf();
        if is_document(&path) {
            Some(ChangeKind::Document { path, deleted })
        } else {
            Some(ChangeKind::StaticFile { path, deleted })
        }
    }
}

// =============================================================================
// File watcher
// =============================================================================

/// A file watcher that can use either native or polling backend.
pub enum FileWatcher {
    /// Native file system watcher (recommended for local development).
    Native {
        _debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
        rx: Receiver<WatchEvent>,
    },
    /// Polling-based watcher (for network filesystems, Docker, etc.).
    Polling {
        _debouncer: Debouncer<PollWatcher, RecommendedCache>,
        rx: Receiver<WatchEvent>,
    },
}

impl FileWatcher {
    /// Create a new file watcher.
    pub fn new(config: &WatchConfig, classifier: PathClassifier) -> Result<Self, WatchError> {
        let debounce_timeout = Duration::from_millis(config.debounce_ms);
        let paths = classifier.paths.clone();

        // Create channel for events
        let (tx, rx) = mpsc::channel();

        // Callback to convert notify events to our WatchEvent type
        let callback = move |result: DebounceEventResult| match result {
            Ok(events) => {
                let changes: Vec<ChangeKind> = events
                    .iter()
                    .filter(|event| is_relevant_event(&event.kind))
                    .flat_map(|event| {
                        let deleted = matches!(event.kind, EventKind::Remove(_));
                        event
                            .paths
                            .iter()
                            .filter_map(|p| classifier.classify(p, deleted))
                            .collect::<Vec<_>>()
                    })
                    .collect();

                if !changes.is_empty() {
                    let _ = tx.send(WatchEvent::FilesChanged(changes));
                }
            }
            Err(errors) => {
                for e in errors {
                    let _ = tx.send(WatchEvent::Error(e.to_string()));
                }
            }
        };

        if config.poll {
            // Use polling watcher
            let poll_interval = Duration::from_millis(config.poll_interval_ms);
            let notify_config = NotifyConfig::default().with_poll_interval(poll_interval);

            let mut debouncer = new_debouncer_opt::<_, PollWatcher, RecommendedCache>(
                debounce_timeout,
                None,
                callback,
                RecommendedCache::default(),
                notify_config,
            )?;

            add_watch_paths_to_debouncer(&mut debouncer, &paths)?;

            Ok(FileWatcher::Polling {
                _debouncer: debouncer,
                rx,
            })
        } else {
            // Use native watcher
            let mut debouncer = new_debouncer(debounce_timeout, None, callback)?;

            add_watch_paths_to_debouncer(&mut debouncer, &paths)?;

            Ok(FileWatcher::Native {
                _debouncer: debouncer,
                rx,
            })
        }
    }

    fn rx(&self) -> &Receiver<WatchEvent> {
        match self {
            FileWatcher::Native { rx, .. } => rx,
            FileWatcher::Polling { rx, .. } => rx,
        }
    }

    /// Block for the next event, then fold in everything already queued.
    ///
    /// Returns `None` once the watcher is gone.
    pub fn recv_batch(&self) -> Option<WatchEvent> {
        let first = self.rx().recv().ok()?;
        Some(coalesce(first, self.rx()))
    }
}

/// Merge all pending change events into `first`, dropping duplicates.
///
/// Errors that were queued behind a change are logged, not returned, so a
/// flaky watcher never swallows a rebuild.
fn coalesce(first: WatchEvent, rx: &Receiver<WatchEvent>) -> WatchEvent {
    let WatchEvent::FilesChanged(mut changes) = first else {
        return first;
    };

    loop {
        match rx.try_recv() {
            Ok(WatchEvent::FilesChanged(more)) => changes.extend(more),
            Ok(WatchEvent::Error(e)) => tracing::warn!("watch error: {e}"),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
        }
    }

    let mut seen = HashSet::new();
    changes.retain(|change| seen.insert(change.clone()));
    WatchEvent::FilesChanged(changes)
}

/// Add watch paths to a debouncer.
fn add_watch_paths_to_debouncer<W: Watcher, C: notify_debouncer_full::FileIdCache>(
    debouncer: &mut Debouncer<W, C>,
    paths: &WatchPaths,
) -> Result<(), WatchError> {
    if paths.source_dir.exists() {
        debouncer.watch(&paths.source_dir, RecursiveMode::Recursive)?;
    }

    // Watch theme directory for template changes
    if paths.theme_dir.exists() {
        debouncer.watch(&paths.theme_dir, RecursiveMode::Recursive)?;
    }

    // Watch config file's parent directory (to catch config changes)
    if let Some(parent) = paths.config_path.parent()
        && parent.exists()
    {
        debouncer.watch(parent, RecursiveMode::NonRecursive)?;
    }

    Ok(())
}

/// Check if an event kind is relevant for rebuilds.
fn is_relevant_event(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_)
            | EventKind::Remove(_)
            | EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Name(_))
            | EventKind::Modify(ModifyKind::Any)
            // What the polling backend reports for a content change
            | EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime))
    )
}
