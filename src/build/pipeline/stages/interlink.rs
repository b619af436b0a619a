//! Interlink resolution stage.

use crate::build::interlink::resolve_interlinks;
use crate::build::markdown::parser_options;
use crate::build::pipeline::{PipelineContext, PipelineError, ProcessingDocument, Stage};

/// Stage that rewrites interlinks into ordinary Markdown links.
///
/// Runs sequentially in site order so the first dangling interlink reported
/// is the same on every build. Nothing has been written when it fails.
pub struct InterlinkStage;

impl Stage for InterlinkStage {
    fn name(&self) -> &'static str {
        "interlink"
    }

    fn process(
        &self,
        docs: &mut [ProcessingDocument],
        ctx: &PipelineContext,
    ) -> Result<(), PipelineError> {
        for doc in docs {
            let options =
                parser_options(ctx.markdown_config).map_err(|source| PipelineError::Markdown {
                    path: doc.source_path().to_path_buf(),
                    source,
                })?;
            doc.content = resolve_interlinks(
                &doc.content,
                doc.source_path(),
                doc.doc.body_line,
                ctx.index,
                options,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::interlink::InterlinkError;
    use crate::build::pipeline::stages::fixture::Fixture;
    use crate::build::site::BuildMode;

    #[test]
    fn test_rewrites_interlinks() {
        let fixture = Fixture::new(
            &[
                ("a.md", "---\ntitle: A\ndate: 2018-01-02\n---\nSee [il:b][B].\n"),
                ("b.md", "---\ntitle: B\ndate: 2018-01-01\n---\nBack to [il:a] [A].\n"),
            ],
            BuildMode::Prod,
        );
        let mut docs = fixture.documents();
        let dir = tempfile::tempdir().unwrap();

        InterlinkStage.process(&mut docs, &fixture.context(dir.path())).unwrap();
        assert_eq!(docs[0].content, "See [B](/b/).\n");
        assert_eq!(docs[1].content, "Back to [A](/a/).\n");
    }

    #[test]
    fn test_uses_configured_markdown_extensions() {
        let mut fixture = Fixture::new(
            &[("a.md", "---\ntitle: A\ndate: 2018-01-02\n---\nSee [il:a][A].\n")],
            BuildMode::Prod,
        );
        fixture.markdown_config.extensions = vec!["no_such_extension".to_string()];
        let mut docs = fixture.documents();
        let dir = tempfile::tempdir().unwrap();

        let err = InterlinkStage
            .process(&mut docs, &fixture.context(dir.path()))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Markdown { .. }));
    }

    #[test]
    fn test_link_to_excluded_draft_is_dangling() {
        let fixture = Fixture::new(
            &[
                ("a.md", "---\ntitle: A\ndate: 2018-01-02\n---\nSee [il:secret][the secret].\n"),
                ("secret.md", "---\ntitle: S\ndate: 2018-01-01\ndraft: true\n---\nHidden\n"),
            ],
            BuildMode::Prod,
        );
        let mut docs = fixture.documents();
        let dir = tempfile::tempdir().unwrap();

        let err = InterlinkStage
            .process(&mut docs, &fixture.context(dir.path()))
            .unwrap_err();
        let PipelineError::DanglingInterlink(InterlinkError::Dangling { slug, line, .. }) = err else {
            panic!("expected a dangling interlink");
        };
        assert_eq!(slug, "secret");
        assert_eq!(line, 5);
    }

    #[test]
    fn test_link_to_draft_resolves_in_dev() {
        let fixture = Fixture::new(
            &[
                ("a.md", "---\ntitle: A\ndate: 2018-01-02\n---\nSee [il:secret][the secret].\n"),
                ("secret.md", "---\ntitle: S\ndate: 2018-01-01\ndraft: true\n---\nHidden\n"),
            ],
            BuildMode::Dev,
        );
        let mut docs = fixture.documents();
        let dir = tempfile::tempdir().unwrap();

        InterlinkStage.process(&mut docs, &fixture.context(dir.path())).unwrap();
        assert_eq!(docs[0].content, "See [the secret](/secret/).\n");
    }
}
