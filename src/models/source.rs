//! Source definitions and CSS selectors for HTML job boards.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// How a source is fetched and extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// HTML page, structural selectors or anchor scan
    Html,
    /// RSS 2.0, RSS 1.0 or Atom feed
    Feed,
}

/// A configured job source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Unique source identifier (e.g., "remoteok")
    pub name: String,

    pub kind: SourceKind,

    /// Page or feed URL; `https://` is assumed when the scheme is missing
    pub url: String,

    /// Overrides the global per-source timeout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Structural selectors; HTML sources without them use anchor scan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selectors: Option<HtmlSelectors>,
}

impl SourceConfig {
    pub fn html(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: SourceKind::Html,
            url: url.into(),
            timeout_secs: None,
            selectors: None,
        }
    }

    pub fn feed(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            kind: SourceKind::Feed,
            ..Self::html(name, url)
        }
    }

    pub fn with_selectors(mut self, selectors: HtmlSelectors) -> Self {
        self.selectors = Some(selectors);
        self
    }

    /// Parse the configured URL, prepending `https://` when no scheme is given.
    pub fn parsed_url(&self) -> Result<Url> {
        let raw = self.url.trim();
        if raw.is_empty() {
            return Err(AppError::validation(format!(
                "source '{}' has an empty url",
                self.name
            )));
        }
        let with_scheme = if raw.contains("://") {
            raw.to_string()
        } else {
            format!("https://{raw}")
        };
        Ok(Url::parse(&with_scheme)?)
    }
}

/// CSS selectors for scraping a job board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HtmlSelectors {
    /// Selector for each listing row/card
    pub row: String,

    /// Selector for the title element within a row
    pub title: String,

    /// Selector for the link element (defaults to the title element)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    /// HTML attribute holding the link
    #[serde(default = "default_link_attr")]
    pub link_attr: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Attribute holding the date (e.g. `datetime`); element text otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_attr: Option<String>,
}

fn default_link_attr() -> String {
    "href".to_string()
}

impl HtmlSelectors {
    pub fn new(row: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            row: row.into(),
            title: title.into(),
            link: None,
            link_attr: default_link_attr(),
            employer: None,
            date: None,
            date_attr: None,
        }
    }

    /// All selector strings that must parse.
    pub fn all(&self) -> impl Iterator<Item = &str> {
        [Some(&self.row), Some(&self.title)]
            .into_iter()
            .chain([self.link.as_ref(), self.employer.as_ref(), self.date.as_ref()])
            .flatten()
            .map(String::as_str)
    }
}
