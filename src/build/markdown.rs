//! Markdown rendering with syntax highlighting, footnotes and TOC extraction.
//!
//! The event stream from pulldown-cmark is rewritten in a few places:
//! - headings get a unique id and a permalink, and feed the table of contents
//! - fenced code is handed to the syntax highlighter, never evaluated
//! - footnote markers and definitions link to each other in both directions
//! - table columns without an explicit alignment are left-aligned
//!
//! Interlinks are already plain links by the time a body gets here.

use std::collections::{HashMap, HashSet};

use pulldown_cmark::{Alignment, CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd, html};

use super::highlight::SyntaxHighlighter;
use super::render::TocEntry;
use crate::config::MarkdownConfig;
use crate::util::html_escape;

#[derive(thiserror::Error, Debug)]
pub enum MarkdownError {
    #[error("invalid markdown extension: {0}")]
    InvalidExtension(String),
}

/// Result of rendering markdown, containing both HTML and table of contents.
pub struct MarkdownOutput {
    pub html: String,
    pub toc: Vec<TocEntry>,
}

/// Build parser options from the configured extension names.
pub fn parser_options(markdown_config: &MarkdownConfig) -> Result<Options, MarkdownError> {
    let mut options = Options::empty();
    for extension in &markdown_config.extensions {
        match extension.as_str() {
            "definition_lists" => options.insert(Options::ENABLE_DEFINITION_LIST),
            "footnotes" => options.insert(Options::ENABLE_FOOTNOTES),
            "gfm" => options.insert(Options::ENABLE_GFM),
            "heading_attributes" => options.insert(Options::ENABLE_HEADING_ATTRIBUTES),
            "strikethrough" => options.insert(Options::ENABLE_STRIKETHROUGH),
            "tables" => options.insert(Options::ENABLE_TABLES),
            "tasklists" => options.insert(Options::ENABLE_TASKLISTS),
            other => return Err(MarkdownError::InvalidExtension(other.to_string())),
        }
    }
    Ok(options)
}

/// Render markdown to HTML using pulldown-cmark with syntax highlighting.
pub fn render_markdown(
    markdown: &str,
    highlighter: &SyntaxHighlighter,
    markdown_config: &MarkdownConfig,
) -> Result<MarkdownOutput, MarkdownError> {
    let options = parser_options(markdown_config)?;
    let parser = Parser::new_ext(markdown, options);

    // Process events, intercepting code blocks for syntax highlighting
    let mut in_code_block = false;
    let mut code_language = String::new();
    let mut code_content = String::new();

    // Intercept headings to add id attributes for permalinks
    struct HeadingState {
        level: HeadingLevel,
        classes: Vec<String>,
        attrs: Vec<(String, Option<String>)>,
    }
    let mut in_heading: Option<HeadingState> = None;
    let mut used_heading_ids: HashSet<String> = HashSet::new();
    let mut heading_text = String::new();
    let mut heading_events: Vec<Event> = Vec::new();
    let mut toc_entries: Vec<TocEntry> = Vec::new();

    let mut footnotes = FootnoteNumbers::default();

    let events: Vec<Event> = parser
        .flat_map(|event| match event {
            Event::Start(Tag::Heading {
                level,
                ref id,
                ref classes,
                ref attrs,
            }) => {
                // If heading already has an id, just pass it through
                if let Some(existing_id) = id {
                    used_heading_ids.insert(existing_id.to_string());
                    return vec![event];
                }
                // Otherwise, capture the heading to generate an id
                in_heading = Some(HeadingState {
                    level,
                    classes: classes.iter().map(|c| c.to_string()).collect(),
                    attrs: attrs
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.as_ref().map(|v| v.to_string())))
                        .collect(),
                });
                heading_text.clear();
                heading_events.clear();
                vec![]
            }
            Event::End(TagEnd::Heading(_)) if in_heading.is_some() => {
                let Some(state) = in_heading.take() else {
                    return vec![];
                };

                // Generate a unique id from the heading text
                let base_id = match slugify(&heading_text) {
                    id if id.is_empty() => "section".to_string(),
                    id => id,
                };
                let mut id = base_id.clone();
                let mut suffix = 1;
                while used_heading_ids.contains(&id) {
                    id = format!("{}-{}", base_id, suffix);
                    suffix += 1;
                }
                used_heading_ids.insert(id.clone());

                toc_entries.push(TocEntry {
                    text: heading_text.clone(),
                    id: id.clone(),
                    level: state.level as u8,
                });

                let class_attr = if state.classes.is_empty() {
                    String::new()
                } else {
                    format!(" class=\"{}\"", html_escape(&state.classes.join(" ")))
                };

                let extra_attrs = state
                    .attrs
                    .iter()
                    .map(|(k, v)| match v {
                        Some(val) => format!(" {}=\"{}\"", html_escape(k), html_escape(val)),
                        None => format!(" {}", html_escape(k)),
                    })
                    .collect::<String>();

                let mut heading_html = String::new();
                html::push_html(&mut heading_html, heading_events.drain(..));

                let permalink = format!(
                    "<a class=\"header-anchor\" href=\"#{}\" aria-label=\"Link to this heading\">#</a>",
                    id
                );
                vec![Event::Html(
                    format!(
                        "<h{} id=\"{}\"{}{}>{} {}</h{}>\n",
                        state.level as usize,
                        id,
                        class_attr,
                        extra_attrs,
                        heading_html,
                        permalink,
                        state.level as usize,
                    )
                    .into(),
                )]
            }
            Event::FootnoteReference(label) if in_heading.is_some() => {
                heading_events.push(Event::Html(footnotes.reference(&label).into()));
                vec![]
            }
            // Inline markup stays inside the heading; only its text feeds the id and TOC
            event if in_heading.is_some() => {
                match &event {
                    Event::Text(text) | Event::Code(text) => heading_text.push_str(text),
                    Event::SoftBreak | Event::HardBreak => heading_text.push(' '),
                    _ => {}
                }
                heading_events.push(event);
                vec![]
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                in_code_block = true;
                code_language = match kind {
                    CodeBlockKind::Fenced(lang) => fence_language(&lang),
                    CodeBlockKind::Indented => String::new(),
                };
                code_content.clear();
                vec![] // Don't emit the start tag yet
            }
            Event::End(TagEnd::CodeBlock) => {
                in_code_block = false;
                let highlighted = highlighter.highlight(&code_content, &code_language);
                vec![Event::Html(code_block_html(&highlighted, &code_language).into())]
            }
            Event::Text(text) if in_code_block => {
                code_content.push_str(&text);
                vec![]
            }
            Event::Start(Tag::Table(alignments)) => {
                vec![Event::Start(Tag::Table(left_align_by_default(alignments)))]
            }
            Event::FootnoteReference(label) => {
                vec![Event::Html(footnotes.reference(&label).into())]
            }
            Event::Start(Tag::FootnoteDefinition(label)) => {
                vec![Event::Html(footnotes.definition_start(&label).into())]
            }
            Event::End(TagEnd::FootnoteDefinition) => {
                vec![Event::Html(footnotes.definition_end().into())]
            }
            _ => vec![event],
        })
        .collect();

    let mut html_output = String::new();
    html::push_html(&mut html_output, events.into_iter());

    Ok(MarkdownOutput {
        html: html_output,
        toc: toc_entries,
    })
}

/// The language of a code fence is its first word (`python title="x"` -> `python`).
fn fence_language(info: &CowStr) -> String {
    info.split_whitespace().next().unwrap_or_default().to_string()
}

/// Wrap highlighted code, keeping the declared language as markup.
fn code_block_html(highlighted: &str, language: &str) -> String {
    if language.is_empty() {
        format!("<div class=\"highlight\">{}</div>\n", highlighted)
    } else {
        format!(
            "<div class=\"highlight\" data-lang=\"{}\">{}</div>\n",
            html_escape(language),
            highlighted
        )
    }
}

fn left_align_by_default(alignments: Vec<Alignment>) -> Vec<Alignment> {
    alignments
        .into_iter()
        .map(|a| match a {
            Alignment::None => Alignment::Left,
            other => other,
        })
        .collect()
}

/// Footnote numbering and anchors.
///
/// Numbers are assigned in order of first appearance of a label, whether that
/// is a marker or a definition. Markers get `fnref-<n>` ids (with a `-k`
/// suffix for repeated markers), definitions get `fn-<n>`.
#[derive(Default)]
struct FootnoteNumbers {
    numbers: HashMap<String, usize>,
    references: HashMap<usize, usize>,
    open_definition: Option<usize>,
}

impl FootnoteNumbers {
    fn number(&mut self, label: &str) -> usize {
        let next = self.numbers.len() + 1;
        *self.numbers.entry(label.to_string()).or_insert(next)
    }

    fn reference(&mut self, label: &str) -> String {
        let n = self.number(label);
        let count = self.references.entry(n).or_insert(0);
        *count += 1;
        let id = if *count == 1 {
            format!("fnref-{n}")
        } else {
            format!("fnref-{n}-{count}")
        };
        format!(
            "<sup class=\"footnote-reference\" id=\"{id}\"><a href=\"#fn-{n}\">{n}</a></sup>"
        )
    }

    fn definition_start(&mut self, label: &str) -> String {
        let n = self.number(label);
        self.open_definition = Some(n);
        format!(
            "<div class=\"footnote-definition\" id=\"fn-{n}\"><sup class=\"footnote-definition-label\">{n}</sup>\n"
        )
    }

    fn definition_end(&mut self) -> String {
        match self.open_definition.take() {
            Some(n) => format!(
                "<a href=\"#fnref-{n}\" class=\"footnote-backref\" aria-label=\"Back to reference {n}\">↩</a></div>\n"
            ),
            None => "</div>\n".to_string(),
        }
    }
}

/// Convert a string to a slug suitable for use as an HTML id.
fn slugify(s: &str) -> String {
    s.to_lowercase()
        .replace(' ', "-")
        .replace(|c: char| !c.is_alphanumeric() && c != '-', "")
}
