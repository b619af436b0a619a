//! Shared utility functions.

/// Turn a file stem into a display title.
///
/// Splits on `-`, `_` and spaces, drops empty words and capitalizes the rest.
/// "hello-world" -> "Hello World"
/// "2018_notes--draft" -> "2018 Notes Draft"
pub fn title_case(s: &str) -> String {
    s.split(['-', '_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Escape HTML special characters.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("hello-world"), "Hello World");
        assert_eq!(title_case("installation"), "Installation");
        assert_eq!(title_case("api_reference"), "Api Reference");
        assert_eq!(title_case("README"), "README");
        assert_eq!(title_case("2018_notes--draft"), "2018 Notes Draft");
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("<div>&</div>"), "&lt;div&gt;&amp;&lt;/div&gt;");
        assert_eq!(html_escape("say \"hi\""), "say &quot;hi&quot;");
    }
}
