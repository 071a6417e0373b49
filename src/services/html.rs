//! HTML page adapter.
//!
//! Fetches a single page and extracts listing rows either with configured
//! CSS selectors or, when none are configured, by scanning anchors whose
//! text, href or surrounding element mention a keyword term.

use std::time::Duration;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, FetchError, Result};
use crate::models::{HtmlSelectors, RawRecord, SourceResult};
use crate::services::{SourceAdapter, SourceTarget, finish_records};
use crate::utils::resolve_url;
use crate::utils::text::{collapse_whitespace, contains_any, truncate};

/// Longest title taken from a surrounding element during anchor scan.
const MAX_CONTEXT_TITLE: usize = 160;

/// Adapter for HTML job boards.
pub struct HtmlAdapter {
    target: SourceTarget,
    selectors: Option<HtmlSelectors>,
    terms: Vec<String>,
    request_timeout: Duration,
}

impl HtmlAdapter {
    /// Create an adapter, checking that every selector parses.
    pub fn new(
        target: SourceTarget,
        selectors: Option<HtmlSelectors>,
        terms: Vec<String>,
        request_timeout: Duration,
    ) -> Result<Self> {
        if let Some(selectors) = &selectors {
            for s in selectors.all() {
                Self::parse_selector(s)?;
            }
        }
        Ok(Self {
            target,
            selectors,
            terms,
            request_timeout,
        })
    }

    /// Extract raw records from a page body.
    pub fn extract(&self, body: &str) -> std::result::Result<Vec<RawRecord>, FetchError> {
        let document = Html::parse_document(body);
        let records = match &self.selectors {
            Some(selectors) => self.extract_structured(&document, selectors)?,
            None => self.extract_anchors(&document),
        };
        Ok(finish_records(records, self.target.max_records))
    }

    fn extract_structured(
        &self,
        document: &Html,
        selectors: &HtmlSelectors,
    ) -> std::result::Result<Vec<RawRecord>, FetchError> {
        let compile = |s: &str| Self::parse_selector(s).map_err(FetchError::parse);
        let row_sel = compile(&selectors.row)?;
        let title_sel = compile(&selectors.title)?;
        let link_sel = selectors.link.as_deref().map(compile).transpose()?;
        let employer_sel = selectors.employer.as_deref().map(compile).transpose()?;
        let date_sel = selectors.date.as_deref().map(compile).transpose()?;
        let any_link = compile("a[href]")?;

        let mut matched_rows = 0usize;
        let mut records = Vec::new();

        for row in document.select(&row_sel) {
            matched_rows += 1;

            let Some(title_elem) = row.select(&title_sel).next() else {
                continue;
            };
            let title = element_text(&title_elem);
            if title.is_empty() {
                continue;
            }

            let link = match &link_sel {
                Some(sel) => row
                    .select(sel)
                    .next()
                    .and_then(|e| e.value().attr(&selectors.link_attr)),
                None => title_elem
                    .value()
                    .attr(&selectors.link_attr)
                    .or_else(|| row.select(&any_link).next().and_then(|e| e.value().attr("href"))),
            };
            let Some(link) = link.filter(|l| resolve_url(&self.target.url, l).is_some()) else {
                continue;
            };

            let mut record = RawRecord::new(title, link.trim());
            record.employer = employer_sel
                .as_ref()
                .and_then(|sel| row.select(sel).next())
                .map(|e| element_text(&e))
                .filter(|e| !e.is_empty());
            record.published = date_sel
                .as_ref()
                .and_then(|sel| row.select(sel).next())
                .and_then(|e| match &selectors.date_attr {
                    Some(attr) => e.value().attr(attr).map(str::to_string),
                    None => Some(element_text(&e)),
                })
                .filter(|d| !d.trim().is_empty());
            records.push(record);
        }

        if matched_rows == 0 {
            return Err(FetchError::parse(format!(
                "row selector '{}' matched nothing",
                selectors.row
            )));
        }
        Ok(records)
    }

    fn extract_anchors(&self, document: &Html) -> Vec<RawRecord> {
        let Ok(anchor_sel) = Selector::parse("a[href]") else {
            return Vec::new();
        };

        let mut records = Vec::new();
        for anchor in document.select(&anchor_sel) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            if resolve_url(&self.target.url, href).is_none() {
                continue;
            }

            let text = element_text(&anchor);
            let title = if contains_any(&text, &self.terms) || contains_any(href, &self.terms) {
                if text.is_empty() { href.trim().to_string() } else { text }
            } else {
                let context = anchor
                    .parent()
                    .and_then(ElementRef::wrap)
                    .map(|p| element_text(&p))
                    .unwrap_or_default();
                if !contains_any(&context, &self.terms) {
                    continue;
                }
                truncate(&context, MAX_CONTEXT_TITLE)
            };

            records.push(RawRecord::new(title, href.trim()));
        }
        records
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }
}

fn element_text(elem: &ElementRef<'_>) -> String {
    collapse_whitespace(&elem.text().collect::<Vec<_>>().join(" "))
}

#[async_trait]
impl SourceAdapter for HtmlAdapter {
    fn name(&self) -> &str {
        &self.target.name
    }

    fn base_url(&self) -> &Url {
        &self.target.url
    }

    fn timeout(&self) -> Option<Duration> {
        self.target.timeout
    }

    async fn fetch(&self) -> SourceResult {
        let timeout = self.target.request_timeout(self.request_timeout);
        let result = match self.target.transport.get_text(&self.target.url, timeout).await {
            Ok(body) => self.extract(&body),
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            log::debug!("{}: {}", self.target.name, e);
        }
        result.into()
    }
}
