//! File writing stage.
//!
//! Writes the final HTML output to the filesystem.

use std::path::{Path, PathBuf};

use crate::build::paths::output_file;
use crate::build::pipeline::{PipelineContext, PipelineError, ProcessingDocument, Stage};

/// Stage that writes rendered documents to the output directory.
///
/// This stage takes the final HTML from `doc.output_html` and writes
/// it to the document's output path, creating any necessary parent
/// directories.
pub struct WriteStage;

impl Stage for WriteStage {
    fn name(&self) -> &'static str {
        "write"
    }

    fn process(
        &self,
        docs: &mut [ProcessingDocument],
        ctx: &PipelineContext,
    ) -> Result<(), PipelineError> {
        for doc in docs {
            let html = doc.output_html.as_ref().ok_or_else(|| {
                PipelineError::stage(
                    "write",
                    format!(
                        "document '{}' has no output HTML (was template stage run?)",
                        doc.doc.slug
                    ),
                )
            })?;

            let path = write_output(ctx.output_dir, doc.output_path(), html)?;
            tracing::debug!(path = %path.display(), "wrote page");
        }

        Ok(())
    }
}

/// Write `contents` to `relative` under the output directory.
pub(super) fn write_output(
    output_dir: &Path,
    relative: &Path,
    contents: &str,
) -> Result<PathBuf, PipelineError> {
    let path = output_file(output_dir, relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
    }
    std::fs::write(&path, contents).map_err(|e| PipelineError::io(&path, e))?;
    Ok(path)
}
