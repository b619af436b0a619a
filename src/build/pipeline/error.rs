//! Pipeline error types.

use std::path::PathBuf;

use crate::build::interlink::InterlinkError;
use crate::build::markdown::MarkdownError;
use crate::build::render::RenderError;

/// Errors that can occur during pipeline processing.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    DanglingInterlink(#[from] InterlinkError),

    #[error("failed to render markdown of {}: {source}", path.display())]
    Markdown {
        path: PathBuf,
        source: MarkdownError,
    },

    #[error("failed to render {}: {source}", path.display())]
    Render { path: PathBuf, source: RenderError },

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("stage '{stage}' failed: {message}")]
    Stage { stage: String, message: String },
}

impl PipelineError {
    /// Create a stage-specific error.
    pub fn stage(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Stage {
            stage: stage.into(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
