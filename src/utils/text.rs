//! Text cleanup for titles and summaries.

use std::sync::OnceLock;

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<[^>]*>").expect("static regex"))
}

/// Collapse runs of whitespace (including NBSP) into single spaces and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drop tags, decode HTML entities, collapse whitespace.
///
/// Tags are stripped before decoding so escaped brackets stay as text.
pub fn clean_text(s: &str) -> String {
    let stripped = tag_regex().replace_all(s, " ");
    let decoded = html_escape::decode_html_entities(&stripped);
    collapse_whitespace(&decoded)
}

/// Truncate to at most `max` graphemes, appending an ellipsis when cut.
pub fn truncate(s: &str, max: usize) -> String {
    let graphemes: Vec<&str> = s.graphemes(true).collect();
    if graphemes.len() <= max {
        return s.to_string();
    }
    let mut out: String = graphemes[..max].concat();
    out.truncate(out.trim_end().len());
    out.push('…');
    out
}

/// Case-insensitive check whether `haystack` contains any of `terms`.
///
/// `terms` must already be lower-cased.
pub fn contains_any(haystack: &str, terms: &[String]) -> bool {
    let lower = haystack.to_lowercase();
    terms.iter().any(|t| lower.contains(t.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_decodes_and_strips() {
        assert_eq!(
            clean_text("<b>Senior&nbsp;PHP</b>\n\t Developer &amp; Lead"),
            "Senior PHP Developer & Lead"
        );
    }

    #[test]
    fn test_clean_text_keeps_escaped_brackets() {
        assert_eq!(clean_text("PHP Developer &lt;Remote&gt;"), "PHP Developer <Remote>");
        assert_eq!(clean_text("&lt;PHP&gt; Developer"), "<PHP> Developer");
        assert_eq!(
            clean_text("PHP &lt; 8 migration &gt; Laravel lead"),
            "PHP < 8 migration > Laravel lead"
        );
    }

    #[test]
    fn test_clean_text_decodes_once() {
        assert_eq!(clean_text("R&amp;amp;D PHP"), "R&amp;D PHP");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \u{00A0}\n b  "), "a b");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("PHP developer wanted", 13), "PHP developer…");
        assert_eq!(truncate("héllo wörld", 5), "héllo…");
    }

    #[test]
    fn test_contains_any() {
        let terms = vec!["php".to_string()];
        assert!(contains_any("Senior PHP Engineer", &terms));
        assert!(!contains_any("Python Engineer", &terms));
    }
}
