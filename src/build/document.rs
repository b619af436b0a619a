use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::paths::{output_path_for, url_path_for};
use crate::config::OutputScheme;
use crate::util::title_case;

/// Delimiter line opening and closing a front matter block.
const DELIMITER: &str = "---";

/// Expected shape of the `date` field.
const DATE_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum FrontMatterError {
    #[error("malformed front matter{}: {message}", line_suffix(.line))]
    Malformed { line: Option<usize>, message: String },

    #[error("missing required front matter field `{0}`")]
    MissingRequiredField(&'static str),

    #[error("invalid date `{value}`{}, expected YYYY-MM-DD", line_suffix(.line))]
    InvalidDate { value: String, line: Option<usize> },
}

impl FrontMatterError {
    fn malformed(line: Option<usize>, message: impl Into<String>) -> Self {
        Self::Malformed {
            line,
            message: message.into(),
        }
    }
}

fn line_suffix(line: &Option<usize>) -> String {
    line.map(|l| format!(" (line {l})")).unwrap_or_default()
}

// =============================================================================
// Front matter
// =============================================================================

/// Front matter exactly as written in the YAML block.
#[derive(Debug, Default, Deserialize)]
struct RawFrontMatter {
    title: Option<String>,
    description: Option<String>,
    date: Option<serde_yaml::Value>,
    location: Option<String>,
    #[serde(default)]
    draft: bool,
    #[serde(flatten)]
    extra: BTreeMap<String, serde_yaml::Value>,
}

/// Validated front matter metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrontMatter {
    pub title: String,
    /// Page description for SEO/previews
    pub description: Option<String>,
    /// Publication date; only absent for documents without front matter
    pub date: Option<NaiveDate>,
    /// Where the piece was written
    pub location: Option<String>,
    /// Excluded from prod builds
    pub draft: bool,
    /// Unrecognized keys, kept for templates (e.g. `page.extra.tags`)
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl FrontMatter {
    /// Metadata for a file without a front matter block.
    pub fn untitled(slug: &str) -> Self {
        Self {
            title: title_case(slug),
            description: None,
            date: None,
            location: None,
            draft: false,
            extra: BTreeMap::new(),
        }
    }

    fn from_raw(raw: RawFrontMatter, date_line: Option<usize>) -> Result<Self, FrontMatterError> {
        let title = raw
            .title
            .ok_or(FrontMatterError::MissingRequiredField("title"))?;
        let date = raw
            .date
            .ok_or(FrontMatterError::MissingRequiredField("date"))?;
        let date = parse_date(&date, date_line)?;

        Ok(Self {
            title,
            description: raw.description,
            date: Some(date),
            location: raw.location,
            draft: raw.draft,
            extra: raw.extra,
        })
    }
}

fn parse_date(value: &serde_yaml::Value, line: Option<usize>) -> Result<NaiveDate, FrontMatterError> {
    let text = match value {
        serde_yaml::Value::String(s) => s.trim().to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    };
    // chrono also takes unpadded months and days; only YYYY-MM-DD is accepted
    if !is_iso_date_shape(&text) {
        return Err(FrontMatterError::InvalidDate { value: text, line });
    }
    NaiveDate::parse_from_str(&text, DATE_FORMAT)
        .map_err(|_| FrontMatterError::InvalidDate { value: text, line })
}

fn is_iso_date_shape(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Result of splitting a source file into front matter and body.
#[derive(Debug)]
pub struct ParsedContent {
    /// The parsed front matter, `None` if the file has no front matter block
    pub front_matter: Option<FrontMatter>,
    /// The markdown content without the front matter block
    pub body: String,
    /// 1-based line of the source file where `body` starts
    pub body_line: usize,
}

/// Parse front matter from markdown content.
///
/// Front matter is a YAML block delimited by `---` lines at the very start of the file:
///
/// ```markdown
/// ---
/// title: Hello World
/// date: 2018-01-01
/// draft: false
/// ---
///
/// # Content starts here
/// ```
///
/// `title` and `date` are required once a block is present. Leading blank
/// lines of the body are stripped.
pub fn parse_front_matter(content: &str) -> Result<ParsedContent, FrontMatterError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut lines = content.split_inclusive('\n');
    let opening = lines.next().map(trim_eol);
    if opening != Some(DELIMITER) {
        return Ok(ParsedContent {
            front_matter: None,
            body: content.to_string(),
            body_line: 1,
        });
    }

    // Find the closing delimiter, tracking byte offsets and line numbers
    let yaml_start = content.split_inclusive('\n').next().map_or(0, str::len);
    let mut offset = yaml_start;
    let mut line_no = 1;
    let mut closing = None;
    for line in lines {
        line_no += 1;
        if trim_eol(line) == DELIMITER {
            closing = Some((offset, offset + line.len(), line_no));
            break;
        }
        offset += line.len();
    }

    let Some((yaml_end, body_start, closing_line)) = closing else {
        return Err(FrontMatterError::malformed(
            Some(1),
            "opening `---` has no matching closing `---`",
        ));
    };

    let yaml = &content[yaml_start..yaml_end];
    let raw = if yaml.trim().is_empty() {
        RawFrontMatter::default()
    } else {
        serde_yaml::from_str::<RawFrontMatter>(yaml).map_err(|e| {
            // The YAML block starts on line 2 of the file
            let line = e.location().map(|loc| loc.line() + 1);
            FrontMatterError::malformed(line, e.to_string())
        })?
    };

    let date_line = find_key_line(yaml, "date").map(|l| l + 1);
    let front_matter = FrontMatter::from_raw(raw, date_line)?;

    // Strip leading blank lines from the body
    let mut body = &content[body_start..];
    let mut body_line = closing_line + 1;
    while let Some(newline) = body.find('\n') {
        if !body[..newline].trim().is_empty() {
            break;
        }
        body = &body[newline + 1..];
        body_line += 1;
    }

    Ok(ParsedContent {
        front_matter: Some(front_matter),
        body: body.to_string(),
        body_line,
    })
}

fn trim_eol(line: &str) -> &str {
    line.trim_end_matches('\n').trim_end_matches('\r')
}

/// 1-based line within `yaml` of a top-level key.
fn find_key_line(yaml: &str, key: &str) -> Option<usize> {
    yaml.lines()
        .position(|line| {
            line.strip_prefix(key)
                .is_some_and(|rest| rest.trim_start().starts_with(':'))
        })
        .map(|idx| idx + 1)
}

// =============================================================================
// Documents
// =============================================================================

/// One parsed source document.
///
/// Constructed once per build from a single source file and never mutated
/// afterwards; rendered output lives in the pipeline's processing record.
#[derive(Debug, Clone)]
pub struct Document {
    /// Identity of the document, the file stem of its source
    pub slug: String,
    /// Path relative to the source root (e.g., "essays/hello-world.md")
    pub source_path: PathBuf,
    /// Front matter metadata
    pub front_matter: FrontMatter,
    /// Markdown body with the front matter stripped
    pub raw_body: String,
    /// 1-based line of the source file where the body starts
    pub body_line: usize,
    /// Output file relative to the output directory (e.g., "hello-world/index.html")
    pub output_path: PathBuf,
    /// Site-relative URL (e.g., "hello-world/")
    pub url_path: String,
}

impl Document {
    /// Parse a document from the contents of its source file.
    pub fn parse(
        slug: String,
        source_path: PathBuf,
        content: &str,
        scheme: OutputScheme,
    ) -> Result<Self, FrontMatterError> {
        let parsed = parse_front_matter(content)?;
        let front_matter = parsed
            .front_matter
            .unwrap_or_else(|| FrontMatter::untitled(&slug));

        Ok(Self {
            output_path: output_path_for(&slug, scheme),
            url_path: url_path_for(&slug, scheme),
            slug,
            source_path,
            front_matter,
            raw_body: parsed.body,
            body_line: parsed.body_line,
        })
    }

    pub fn title(&self) -> &str {
        &self.front_matter.title
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.front_matter.date
    }

    pub fn is_draft(&self) -> bool {
        self.front_matter.draft
    }
}
