//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{HtmlSelectors, SourceConfig};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Technology token a title must contain (case-insensitive)
    #[serde(default = "defaults::target_keyword")]
    pub target_keyword: String,

    /// Extra accepted tokens, e.g. "php developer"
    #[serde(default)]
    pub keyword_synonyms: Vec<String>,

    /// Source names to run; empty means every configured source
    #[serde(default)]
    pub enabled_sources: Vec<String>,

    /// Time budget for each source in seconds
    #[serde(default = "defaults::per_source_timeout")]
    pub per_source_timeout_secs: u64,

    /// Refresh period for `watch`, in seconds
    #[serde(default = "defaults::refresh_interval")]
    pub refresh_interval_secs: u64,

    /// HTTP client behavior
    #[serde(default)]
    pub http: HttpConfig,

    /// Title preprocessing
    #[serde(default)]
    pub cleaning: CleaningConfig,

    /// Source definitions, in registration order
    #[serde(default = "defaults::default_sources")]
    pub sources: Vec<SourceConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Keyword plus synonyms, lower-cased, without blanks or repeats.
    pub fn keyword_terms(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        std::iter::once(&self.target_keyword)
            .chain(self.keyword_synonyms.iter())
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty() && seen.insert(t.clone()))
            .collect()
    }

    pub fn per_source_timeout(&self) -> Duration {
        Duration::from_secs(self.per_source_timeout_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// Sources selected by `enabled_sources`, in registration order.
    pub fn active_sources(&self) -> Vec<&SourceConfig> {
        self.sources
            .iter()
            .filter(|s| {
                self.enabled_sources.is_empty()
                    || self
                        .enabled_sources
                        .iter()
                        .any(|e| e.eq_ignore_ascii_case(&s.name))
            })
            .collect()
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.target_keyword.trim().is_empty() {
            return Err(AppError::validation("target_keyword is empty"));
        }
        if self.per_source_timeout_secs == 0 {
            return Err(AppError::validation("per_source_timeout_secs must be > 0"));
        }
        if self.refresh_interval_secs == 0 {
            return Err(AppError::validation("refresh_interval_secs must be > 0"));
        }
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.max_concurrent == 0 {
            return Err(AppError::validation("http.max_concurrent must be > 0"));
        }
        if self.http.max_records_per_source == 0 {
            return Err(AppError::validation(
                "http.max_records_per_source must be > 0",
            ));
        }
        if self.sources.is_empty() {
            return Err(AppError::validation("No sources defined"));
        }

        let mut names = HashSet::new();
        for source in &self.sources {
            if source.name.trim().is_empty() {
                return Err(AppError::validation("source with empty name"));
            }
            if !names.insert(source.name.to_lowercase()) {
                return Err(AppError::validation(format!(
                    "duplicate source name '{}'",
                    source.name
                )));
            }
            source.parsed_url()?;
            if source.timeout_secs == Some(0) {
                return Err(AppError::validation(format!(
                    "source '{}': timeout_secs must be > 0",
                    source.name
                )));
            }
            if let Some(selectors) = &source.selectors {
                validate_selectors(selectors)?;
            }
        }

        for enabled in &self.enabled_sources {
            if !names.contains(&enabled.to_lowercase()) {
                return Err(AppError::validation(format!(
                    "enabled source '{enabled}' is not defined"
                )));
            }
        }
        Ok(())
    }
}

fn validate_selectors(selectors: &HtmlSelectors) -> Result<()> {
    for s in selectors.all() {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))?;
    }
    Ok(())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_keyword: defaults::target_keyword(),
            keyword_synonyms: Vec::new(),
            enabled_sources: Vec::new(),
            per_source_timeout_secs: defaults::per_source_timeout(),
            refresh_interval_secs: defaults::refresh_interval(),
            http: HttpConfig::default(),
            cleaning: CleaningConfig::default(),
            sources: defaults::default_sources(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Maximum sources fetched at the same time
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Cap on raw records kept per source
    #[serde(default = "defaults::max_records")]
    pub max_records_per_source: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            max_concurrent: defaults::max_concurrent(),
            max_records_per_source: defaults::max_records(),
        }
    }
}

/// Text cleaning/preprocessing settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CleaningConfig {
    /// Literal fragments removed from titles (e.g. "New!", "Featured")
    #[serde(default)]
    pub title_remove_patterns: Vec<String>,
}

impl CleaningConfig {
    /// Remove configured fragments and re-collapse whitespace.
    pub fn clean_title(&self, text: &str) -> String {
        let mut result = text.to_string();
        for pattern in self.title_remove_patterns.iter().filter(|p| !p.is_empty()) {
            result = result.replace(pattern.as_str(), "");
        }
        crate::utils::text::collapse_whitespace(&result)
    }
}

mod defaults {
    use crate::models::{HtmlSelectors, SourceConfig};

    pub fn target_keyword() -> String {
        "php".into()
    }
    pub fn per_source_timeout() -> u64 {
        12
    }
    pub fn refresh_interval() -> u64 {
        30 * 60
    }

    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; job-aggregator/0.1)".into()
    }
    pub fn max_concurrent() -> usize {
        8
    }
    pub fn max_records() -> usize {
        200
    }

    pub fn default_sources() -> Vec<SourceConfig> {
        vec![
            SourceConfig::html("remoteok", "https://remoteok.com/remote-php-jobs").with_selectors(
                HtmlSelectors {
                    link: Some("a.preventLink".into()),
                    employer: Some("h3[itemprop=name]".into()),
                    date: Some("time".into()),
                    date_attr: Some("datetime".into()),
                    ..HtmlSelectors::new("tr.job", "h2[itemprop=title]")
                },
            ),
            SourceConfig::feed(
                "weworkremotely",
                "https://weworkremotely.com/categories/remote-programming-jobs.rss",
            ),
            SourceConfig::html("indeed", "https://www.indeed.com/jobs?q=php&l="),
            SourceConfig::html("wuzzuf", "https://wuzzuf.net/search/jobs/?a=hpb&q=php"),
            SourceConfig::html("forasna", "https://forasna.com/jobs?q=php"),
        ]
    }
}
