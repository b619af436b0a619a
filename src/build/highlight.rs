use autumnus::{HtmlLinkedBuilder, formatter::Formatter, languages::Language, themes};

use crate::util::html_escape;

/// Theme used when the configured one is not known to autumnus.
pub const DEFAULT_HIGHLIGHT_THEME: &str = "github_light";

/// A syntax highlighter using autumnus (tree-sitter based).
///
/// Output uses CSS classes only; the matching stylesheet comes from
/// [`SyntaxHighlighter::generate_css`]. Code is only ever tokenized.
pub struct SyntaxHighlighter {
    theme_name: String,
}

impl SyntaxHighlighter {
    /// Create a new syntax highlighter with the given theme.
    pub fn new(theme_name: &str) -> Self {
        Self {
            theme_name: theme_name.to_string(),
        }
    }

    /// Highlight code and return HTML with CSS classes.
    /// Returns the original code wrapped in a plain `<code>` if the language is not supported.
    pub fn highlight(&self, code: &str, language: &str) -> String {
        // Use Language::guess which handles language detection from name or extension
        let lang = Language::guess(language, code);

        // Check if it's the Plaintext/unknown fallback
        if matches!(lang, Language::PlainText)
            && !language.is_empty()
            && language != "plaintext"
            && language != "text"
        {
            tracing::debug!(language, "no grammar for code block, emitting plain text");
            return Self::plain_code_block(code, language);
        }

        let formatter = HtmlLinkedBuilder::new().source(code).lang(lang).build();

        match formatter {
            Ok(f) => {
                let mut output: Vec<u8> = Vec::new();
                if f.format(&mut output).is_ok() {
                    String::from_utf8(output)
                        .unwrap_or_else(|_| Self::plain_code_block(code, language))
                } else {
                    Self::plain_code_block(code, language)
                }
            }
            Err(_) => Self::plain_code_block(code, language),
        }
    }

    /// Stylesheet for the configured theme, falling back to the default theme.
    pub fn generate_css(&self) -> Option<String> {
        let theme = match themes::get(&self.theme_name) {
            Ok(theme) => theme,
            Err(_) => {
                tracing::warn!(
                    theme = %self.theme_name,
                    "unknown highlight theme, using {}",
                    DEFAULT_HIGHLIGHT_THEME
                );
                themes::get(DEFAULT_HIGHLIGHT_THEME).ok()?
            }
        };
        Some(theme.css(false)) // false = don't enable italic
    }

    /// Create a plain code block without highlighting.
    fn plain_code_block(code: &str, language: &str) -> String {
        let escaped = html_escape(code);
        if language.is_empty() {
            format!("<pre><code>{}</code></pre>", escaped)
        } else {
            format!(
                "<pre><code class=\"language-{}\">{}</code></pre>",
                html_escape(language),
                escaped
            )
        }
    }
}

impl Default for SyntaxHighlighter {
    fn default() -> Self {
        Self::new(DEFAULT_HIGHLIGHT_THEME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_python() {
        let highlighter = SyntaxHighlighter::default();
        let result = highlighter.highlight("print('hello')\n", "python");
        assert!(result.contains("<pre"));
        assert!(result.contains("</pre>"));
        assert!(result.contains("print"));
    }

    #[test]
    fn test_highlight_unknown_language() {
        let highlighter = SyntaxHighlighter::default();
        let result = highlighter.highlight("some <code>", "unknown_lang_xyz");
        // Should fall back to plain code block
        assert!(result.contains("<pre><code class=\"language-unknown_lang_xyz\">"));
        assert!(result.contains("some &lt;code&gt;"));
    }

    #[test]
    fn test_generate_css() {
        let highlighter = SyntaxHighlighter::new("dracula");
        let css = highlighter.generate_css().unwrap();
        assert!(!css.is_empty());
    }

    #[test]
    fn test_generate_css_unknown_theme_falls_back() {
        let highlighter = SyntaxHighlighter::new("no-such-theme");
        assert!(highlighter.generate_css().is_some());
    }
}
