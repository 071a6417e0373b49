//! Raw and canonical listing records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A record as extracted by a source adapter, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    /// Title text as found in the page or feed
    pub title: String,

    /// Link as found, possibly relative
    pub link: String,

    /// Employer name, when the source exposes one
    pub employer: Option<String>,

    /// Unparsed publication timestamp
    pub published: Option<String>,

    /// Summary or description, may contain markup
    pub summary: Option<String>,
}

impl RawRecord {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            ..Self::default()
        }
    }

    pub fn with_employer(mut self, employer: impl Into<String>) -> Self {
        self.employer = Some(employer.into());
        self
    }

    pub fn with_published(mut self, published: impl Into<String>) -> Self {
        self.published = Some(published.into());
        self
    }
}

/// A normalized job posting, ready for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Listing {
    /// Short stable identifier derived from `dedup_key`
    pub id: String,

    /// Cleaned, non-empty title
    pub title: String,

    /// Absolute URL of the original posting
    pub url: String,

    /// Name of the adapter this listing came from
    pub source_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Identity used to merge the same job across sources
    pub dedup_key: String,
}

impl Listing {
    /// Build a listing, deriving `dedup_key` and `id` from title and employer.
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        source_name: impl Into<String>,
        employer: Option<String>,
        published_at: Option<DateTime<Utc>>,
    ) -> Self {
        let title = title.into();
        let dedup_key = dedup_key(&title, employer.as_deref());
        Self {
            id: listing_id(&dedup_key),
            title,
            url: url.into(),
            source_name: source_name.into(),
            employer,
            published_at,
            summary: None,
            dedup_key,
        }
    }

    /// Format listing for display using a template.
    ///
    /// Supported placeholders:
    /// `{title}`, `{url}`, `{source}`, `{employer}`, `{date}`
    pub fn format(&self, template: &str) -> String {
        let date = self
            .published_at
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        template
            .replace("{title}", &self.title)
            .replace("{url}", &self.url)
            .replace("{source}", &self.source_name)
            .replace("{employer}", self.employer.as_deref().unwrap_or(""))
            .replace("{date}", &date)
    }
}

/// Derive the dedup key for a title and optional employer.
///
/// Lower-cased, punctuation folded to spaces, whitespace collapsed.
/// Title and employer are joined with `" @ "`.
pub fn dedup_key(title: &str, employer: Option<&str>) -> String {
    let title = fold(title);
    match employer.map(fold).filter(|e| !e.is_empty()) {
        Some(employer) => format!("{title} @ {employer}"),
        None => title,
    }
}

fn fold(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// First 16 hex chars of the SHA-256 of a dedup key.
pub fn listing_id(dedup_key: &str) -> String {
    let digest = Sha256::digest(dedup_key.as_bytes());
    hex::encode(&digest[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_key_collapses_case_and_whitespace() {
        assert_eq!(
            dedup_key("  Senior   PHP\tDeveloper ", None),
            "senior php developer"
        );
    }

    #[test]
    fn test_dedup_key_includes_employer() {
        assert_eq!(
            dedup_key("PHP Developer", Some("Acme  Corp")),
            "php developer @ acme corp"
        );
        assert_eq!(dedup_key("PHP Developer", Some("  ")), "php developer");
    }

    #[test]
    fn test_dedup_key_folds_punctuation() {
        assert_eq!(
            dedup_key("PHP Developer - Remote", None),
            dedup_key("PHP Developer (Remote)", None)
        );
    }

    #[test]
    fn test_listing_id_is_stable() {
        let a = Listing::new("PHP Dev", "https://a.com/1", "a", None, None);
        let b = Listing::new("php  dev", "https://b.com/2", "b", None, None);
        assert_eq!(a.id, b.id);
        assert_eq!(a.id.len(), 16);
    }

    #[test]
    fn test_format() {
        let listing = Listing::new(
            "PHP Developer",
            "https://example.com/job/1",
            "remoteok",
            Some("Acme".to_string()),
            None,
        );
        assert_eq!(
            listing.format("[{source}] {title} @ {employer}"),
            "[remoteok] PHP Developer @ Acme"
        );
    }
}
