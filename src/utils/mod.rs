//! Utility functions and helpers.

pub mod http;
pub mod text;
pub mod time;

use url::Url;

/// Resolve a potentially relative URL against a base URL.
///
/// Returns `None` for empty links, bare fragments, non-navigable schemes
/// (`javascript:`, `mailto:`, `tel:`, `data:`) and links that do not
/// resolve to an http(s) URL.
pub fn resolve_url(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }
    base.join(href)
        .ok()
        .filter(|u| matches!(u.scheme(), "http" | "https"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(base: &str, href: &str) -> Option<String> {
        resolve_url(&Url::parse(base).unwrap(), href).map(|u| u.to_string())
    }

    #[test]
    fn test_resolve_url() {
        assert_eq!(
            resolved("https://example.com", "/job/123"),
            Some("https://example.com/job/123".to_string())
        );
        assert_eq!(
            resolved("https://example.com/path/", "page.html"),
            Some("https://example.com/path/page.html".to_string())
        );
        assert_eq!(
            resolved("https://example.com/path/", "https://other.com/x"),
            Some("https://other.com/x".to_string())
        );
    }

    #[test]
    fn test_resolve_url_rejects_unusable_links() {
        assert_eq!(resolved("https://example.com", ""), None);
        assert_eq!(resolved("https://example.com", "#top"), None);
        assert_eq!(resolved("https://example.com", "javascript:void(0)"), None);
        assert_eq!(resolved("https://example.com", "mailto:jobs@example.com"), None);
        assert_eq!(resolved("https://example.com", "ftp://example.com/file"), None);
    }
}
