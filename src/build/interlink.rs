//! Interlinks between documents.
//!
//! An interlink is written `[il:<slug>][<anchor>]`, with zero to three
//! spaces allowed between the two bracket pairs (tabs never match). The
//! slug may carry a fragment, `[il:hello-world#setup][setup notes]`.
//!
//! Resolution turns every interlink into an ordinary Markdown link,
//! `[anchor](url)`, using the frozen [`SiteIndex`]. Interlinks inside code
//! blocks and inline code spans are left alone, as is everything else in
//! the body.

use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use pulldown_cmark::{Event, Options, Parser, Tag};
use regex::Regex;

use super::site::SiteIndex;

#[derive(thiserror::Error, Debug)]
pub enum InterlinkError {
    #[error(
        "dangling interlink [il:{slug}] in {} (line {line}): no document with slug '{slug}'",
        document.display()
    )]
    Dangling {
        slug: String,
        document: PathBuf,
        line: usize,
    },
}

static INTERLINK_REGEX: OnceLock<Regex> = OnceLock::new();

fn interlink_regex() -> &'static Regex {
    INTERLINK_REGEX.get_or_init(|| {
        Regex::new(r"\[il:(?P<slug>[^\]\s#]+)(?:#(?P<fragment>[^\]\s]*))?\] {0,3}\[(?P<anchor>[^\]\n]+)\]")
            .expect("interlink pattern is valid")
    })
}

/// Rewrite all interlinks in `body` into standard Markdown links.
///
/// `options` must be the parser options the body is later rendered with, so
/// code is recognized the same way in both passes. `document` and
/// `body_line` are only used to report where a dangling interlink was found.
pub fn resolve_interlinks(
    body: &str,
    document: &Path,
    body_line: usize,
    index: &SiteIndex,
    options: Options,
) -> Result<String, InterlinkError> {
    let code = code_ranges(body, options);
    let mut output = String::with_capacity(body.len());
    let mut last = 0;

    for caps in interlink_regex().captures_iter(body) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if code.iter().any(|r| overlaps(r, &whole.range())) {
            continue;
        }

        let slug = &caps["slug"];
        let anchor = &caps["anchor"];
        let entry = index.get(slug).ok_or_else(|| InterlinkError::Dangling {
            slug: slug.to_string(),
            document: document.to_path_buf(),
            line: body_line + body[..whole.start()].matches('\n').count(),
        })?;

        let mut url = entry.url.clone();
        if let Some(fragment) = caps.name("fragment").filter(|f| !f.as_str().is_empty()) {
            url.push('#');
            url.push_str(fragment.as_str());
        }

        output.push_str(&body[last..whole.start()]);
        output.push_str(&markdown_link(anchor, &url));
        last = whole.end();
    }

    output.push_str(&body[last..]);
    Ok(output)
}

fn markdown_link(anchor: &str, url: &str) -> String {
    if url.contains(char::is_whitespace) {
        format!("[{anchor}](<{url}>)")
    } else {
        format!("[{anchor}]({url})")
    }
}

/// Byte ranges of code blocks and inline code spans in `body`.
fn code_ranges(body: &str, options: Options) -> Vec<Range<usize>> {
    Parser::new_ext(body, options)
        .into_offset_iter()
        .filter_map(|(event, range)| match event {
            Event::Start(Tag::CodeBlock(_)) | Event::Code(_) => Some(range),
            _ => None,
        })
        .collect()
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::document::Document;
    use crate::build::markdown::parser_options;
    use crate::build::site::{BuildMode, Site};
    use crate::config::{LinkConfig, MarkdownConfig, OutputScheme};

    fn options() -> Options {
        parser_options(&MarkdownConfig::default()).unwrap()
    }

    fn index_of(slugs: &[&str]) -> SiteIndex {
        let docs = slugs
            .iter()
            .map(|slug| {
                Document::parse(
                    slug.to_string(),
                    PathBuf::from(format!("{slug}.md")),
                    &format!("---\ntitle: {slug}\ndate: 2018-01-01\n---\n"),
                    OutputScheme::Pretty,
                )
                .unwrap()
            })
            .collect();
        Site::assemble(docs, BuildMode::Prod, &LinkConfig::default())
            .unwrap()
            .index
    }

    fn resolve(body: &str) -> Result<String, InterlinkError> {
        resolve_interlinks(body, Path::new("source.md"), 1, &index_of(&["hello-world"]), options())
    }

    #[test]
    fn test_zero_one_and_three_spaces_resolve_identically() {
        let expected = "See [the intro](/hello-world/).";
        assert_eq!(resolve("See [il:hello-world][the intro].").unwrap(), expected);
        assert_eq!(resolve("See [il:hello-world] [the intro].").unwrap(), expected);
        assert_eq!(resolve("See [il:hello-world]   [the intro].").unwrap(), expected);
    }

    #[test]
    fn test_four_spaces_or_tab_is_left_alone() {
        let four = "See [il:hello-world]    [the intro].";
        assert_eq!(resolve(four).unwrap(), four);

        let tab = "See [il:hello-world]\t[the intro].";
        assert_eq!(resolve(tab).unwrap(), tab);
    }

    #[test]
    fn test_fragment_is_appended() {
        assert_eq!(
            resolve("[il:hello-world#setup][setup]").unwrap(),
            "[setup](/hello-world/#setup)"
        );
    }

    #[test]
    fn test_dangling_interlink() {
        let body = "First line\n\nLink to [il:nowhere][somewhere].";
        let index = index_of(&["hello-world"]);
        let err = resolve_interlinks(body, Path::new("posts/a.md"), 5, &index, options()).unwrap_err();
        let InterlinkError::Dangling {
            slug,
            document,
            line,
        } = err;
        assert_eq!(slug, "nowhere");
        assert_eq!(document, PathBuf::from("posts/a.md"));
        assert_eq!(line, 7);
    }

    #[test]
    fn test_code_is_untouched() {
        let body = "Inline `[il:missing][x]` code.\n\n```\n[il:missing][x]\n```\n\n    [il:missing][x]\n";
        assert_eq!(resolve(body).unwrap(), body);
    }

    #[test]
    fn test_other_markdown_is_untouched() {
        let body = "# Title\n\n[a link](https://example.com) and [il:hello-world][ours], *emphasis*.\n\n[ref]: https://example.com\n";
        assert_eq!(
            resolve(body).unwrap(),
            "# Title\n\n[a link](https://example.com) and [ours](/hello-world/), *emphasis*.\n\n[ref]: https://example.com\n"
        );
    }

    #[test]
    fn test_multiple_interlinks_on_one_line() {
        assert_eq!(
            resolve("[il:hello-world][one] and [il:hello-world][two]").unwrap(),
            "[one](/hello-world/) and [two](/hello-world/)"
        );
    }

    #[test]
    fn test_slug_match_is_exact() {
        assert!(resolve("[il:Hello-World][x]").is_err());
    }
}
