//! Raw record to canonical listing.

use url::Url;

use crate::models::{CleaningConfig, Config, Listing, RawRecord};
use crate::utils::resolve_url;
use crate::utils::text::{clean_text, contains_any};
use crate::utils::time::parse_timestamp;

/// Longest summary kept on a listing.
const MAX_SUMMARY: usize = 280;

/// Outcome of normalizing one raw record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    Accepted(Listing),
    Rejected(RejectReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    EmptyTitle,
    InvalidUrl,
    MissingKeyword,
}

/// Converts adapter records into listings and applies the keyword filter.
#[derive(Debug, Clone)]
pub struct Normalizer {
    terms: Vec<String>,
    cleaning: CleaningConfig,
}

impl Normalizer {
    /// `terms` are matched case-insensitively as substrings of the title.
    pub fn new(terms: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        Self {
            terms: terms
                .into_iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            cleaning: CleaningConfig::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            terms: config.keyword_terms(),
            cleaning: config.cleaning.clone(),
        }
    }

    pub fn with_cleaning(mut self, cleaning: CleaningConfig) -> Self {
        self.cleaning = cleaning;
        self
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Normalize a record from `source_name`, resolving links against `base`.
    pub fn normalize(&self, raw: RawRecord, source_name: &str, base: &Url) -> Normalized {
        let title = self.cleaning.clean_title(&clean_text(&raw.title));
        if title.is_empty() {
            return Normalized::Rejected(RejectReason::EmptyTitle);
        }
        if !contains_any(&title, &self.terms) {
            return Normalized::Rejected(RejectReason::MissingKeyword);
        }
        let Some(url) = resolve_url(base, &raw.link) else {
            return Normalized::Rejected(RejectReason::InvalidUrl);
        };

        let employer = raw
            .employer
            .as_deref()
            .map(clean_text)
            .filter(|e| !e.is_empty());
        let published_at = raw.published.as_deref().and_then(parse_timestamp);

        let mut listing = Listing::new(title, url, source_name, employer, published_at);
        listing.summary = raw
            .summary
            .as_deref()
            .map(clean_text)
            .filter(|s| !s.is_empty())
            .map(|s| crate::utils::text::truncate(&s, MAX_SUMMARY));
        Normalized::Accepted(listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com").unwrap()
    }

    fn accepted(n: Normalized) -> Listing {
        match n {
            Normalized::Accepted(l) => l,
            Normalized::Rejected(r) => panic!("rejected: {r:?}"),
        }
    }

    #[test]
    fn test_relative_link_resolves_against_base() {
        let normalizer = Normalizer::new(["php"]);
        let listing = accepted(normalizer.normalize(
            RawRecord::new("PHP Developer", "/job/123"),
            "a",
            &base(),
        ));
        assert_eq!(listing.url, "https://example.com/job/123");
        assert_eq!(listing.source_name, "a");
    }

    #[test]
    fn test_titles_without_keyword_are_rejected() {
        let normalizer = Normalizer::new(["php"]);
        for title in ["Python Engineer", "Go / Rust developer", "Hypertext Preprocessor", ""] {
            let result = normalizer.normalize(RawRecord::new(title, "/x"), "a", &base());
            assert!(
                matches!(result, Normalized::Rejected(_)),
                "{title:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        let normalizer = Normalizer::new(["PHP"]);
        let listing = accepted(normalizer.normalize(
            RawRecord::new("Senior php/Laravel engineer", "https://jobs.io/1"),
            "a",
            &base(),
        ));
        assert_eq!(listing.title, "Senior php/Laravel engineer");
    }

    #[test]
    fn test_keyword_only_in_link_is_rejected() {
        let normalizer = Normalizer::new(["php"]);
        let result = normalizer.normalize(RawRecord::new("Backend dev", "/php/1"), "a", &base());
        assert_eq!(result, Normalized::Rejected(RejectReason::MissingKeyword));
    }

    #[test]
    fn test_title_cleanup() {
        let normalizer = Normalizer::new(["php"]).with_cleaning(CleaningConfig {
            title_remove_patterns: vec!["New!".into()],
        });
        let listing = accepted(normalizer.normalize(
            RawRecord::new("  New!  <b>PHP</b>&nbsp;&amp; MySQL\n Dev ", "/j"),
            "a",
            &base(),
        ));
        assert_eq!(listing.title, "PHP & MySQL Dev");
        assert_eq!(listing.dedup_key, "php mysql dev");
    }

    #[test]
    fn test_escaped_brackets_keep_keyword() {
        let normalizer = Normalizer::new(["php"]);
        let listing = accepted(normalizer.normalize(
            RawRecord::new("&lt;PHP&gt; Developer", "/j"),
            "a",
            &base(),
        ));
        assert_eq!(listing.title, "<PHP> Developer");
    }

    #[test]
    fn test_invalid_link_rejected() {
        let normalizer = Normalizer::new(["php"]);
        let result =
            normalizer.normalize(RawRecord::new("PHP Dev", "javascript:apply()"), "a", &base());
        assert_eq!(result, Normalized::Rejected(RejectReason::InvalidUrl));
    }

    #[test]
    fn test_optional_fields() {
        let normalizer = Normalizer::new(["php"]);
        let mut raw = RawRecord::new("PHP Dev", "/j")
            .with_employer(" Acme &amp; Co ")
            .with_published("2025-03-01");
        raw.summary = Some("<p>Great&nbsp;team</p>".into());

        let listing = accepted(normalizer.normalize(raw, "a", &base()));
        assert_eq!(listing.employer.as_deref(), Some("Acme & Co"));
        assert_eq!(listing.dedup_key, "php dev @ acme co");
        assert_eq!(
            listing.published_at.map(|d| d.to_rfc3339()).as_deref(),
            Some("2025-03-01T00:00:00+00:00")
        );
        assert_eq!(listing.summary.as_deref(), Some("Great team"));
    }

    #[test]
    fn test_unparseable_date_is_absent() {
        let normalizer = Normalizer::new(["php"]);
        let raw = RawRecord::new("PHP Dev", "/j").with_published("yesterday");
        assert_eq!(accepted(normalizer.normalize(raw, "a", &base())).published_at, None);
    }

    #[test]
    fn test_from_config_uses_synonyms() {
        let mut config = Config::default();
        config.keyword_synonyms = vec!["Laravel".into()];
        let normalizer = Normalizer::from_config(&config);
        assert_eq!(normalizer.terms(), ["php", "laravel"]);
    }
}
