//! RSS 2.0, RSS 1.0 (RDF) and Atom feed adapter.

use std::borrow::Cow;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::{Captures, Regex};
use serde::Deserialize;
use url::Url;

use crate::error::FetchError;
use crate::models::{RawRecord, SourceResult};
use crate::services::{SourceAdapter, SourceTarget, finish_records};
use crate::utils::resolve_url;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

/// RSS 1.0 puts items next to the channel, not inside it.
#[derive(Debug, Deserialize)]
struct Rdf {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
    guid: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    // Namespace prefixes are dropped before field matching.
    #[serde(rename = "date", alias = "dc:date")]
    dc_date: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<AtomText>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    published: Option<String>,
    updated: Option<String>,
    author: Option<AtomAuthor>,
    summary: Option<AtomText>,
}

#[derive(Debug, Deserialize)]
struct AtomText {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomAuthor {
    name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FeedFormat {
    Rss,
    Rdf,
    Atom,
}

/// Adapter for syndication feeds.
pub struct FeedAdapter {
    target: SourceTarget,
    request_timeout: Duration,
}

impl FeedAdapter {
    pub fn new(target: SourceTarget, request_timeout: Duration) -> Self {
        Self {
            target,
            request_timeout,
        }
    }

    /// Parse a feed body into raw records.
    pub fn extract(&self, body: &str) -> Result<Vec<RawRecord>, FetchError> {
        let xml = scrub_html_entities_for_xml(body);
        let records: Vec<RawRecord> = match detect_format(&xml)? {
            FeedFormat::Rss => {
                let rss: Rss = quick_xml::de::from_str(&xml).map_err(FetchError::parse)?;
                rss.channel.items.into_iter().filter_map(rss_record).collect()
            }
            FeedFormat::Rdf => {
                let rdf: Rdf = quick_xml::de::from_str(&xml).map_err(FetchError::parse)?;
                rdf.items.into_iter().filter_map(rss_record).collect()
            }
            FeedFormat::Atom => {
                let feed: AtomFeed = quick_xml::de::from_str(&xml).map_err(FetchError::parse)?;
                feed.entries.into_iter().filter_map(atom_record).collect()
            }
        };

        let records = records
            .into_iter()
            .filter(|r| resolve_url(&self.target.url, &r.link).is_some())
            .collect();
        Ok(finish_records(records, self.target.max_records))
    }
}

/// Identify the feed dialect from its root element.
fn detect_format(xml: &str) -> Result<FeedFormat, FetchError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return match e.local_name().as_ref() {
                    b"rss" => Ok(FeedFormat::Rss),
                    b"RDF" => Ok(FeedFormat::Rdf),
                    b"feed" => Ok(FeedFormat::Atom),
                    other => Err(FetchError::parse(format!(
                        "unknown feed root <{}>",
                        String::from_utf8_lossy(other)
                    ))),
                };
            }
            Ok(Event::Eof) => return Err(FetchError::parse("empty document")),
            Ok(_) => {}
            Err(e) => return Err(FetchError::parse(e)),
        }
    }
}

fn rss_record(item: RssItem) -> Option<RawRecord> {
    // Some feeds only carry a permalink guid.
    let link = item
        .link
        .filter(|l| !l.trim().is_empty())
        .or_else(|| item.guid.filter(|g| g.starts_with("http")))?;
    let title = item.title.unwrap_or_default();
    if title.trim().is_empty() {
        return None;
    }
    Some(RawRecord {
        title,
        link: link.trim().to_string(),
        employer: None,
        published: item.pub_date.or(item.dc_date),
        summary: item.description,
    })
}

fn atom_record(entry: AtomEntry) -> Option<RawRecord> {
    let link = entry
        .links
        .iter()
        .find(|l| l.rel.as_deref().is_none_or(|r| r == "alternate"))
        .or_else(|| entry.links.first())
        .and_then(|l| l.href.clone())?;
    let title = entry.title.map(|t| t.value).unwrap_or_default();
    if title.trim().is_empty() {
        return None;
    }
    Some(RawRecord {
        title,
        link: link.trim().to_string(),
        employer: entry.author.and_then(|a| a.name),
        published: entry.published.or(entry.updated),
        summary: entry.summary.map(|s| s.value),
    })
}

fn entity_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"&([A-Za-z][A-Za-z0-9]*);").expect("static regex"))
}

/// Rewrite HTML named entities as numeric references so the XML parser
/// accepts them. The five XML entities are left alone; unknown names are
/// escaped so they survive as literal text.
fn scrub_html_entities_for_xml(s: &str) -> Cow<'_, str> {
    entity_regex().replace_all(s, |caps: &Captures| {
        let name = &caps[1];
        if matches!(name, "amp" | "lt" | "gt" | "quot" | "apos") {
            return caps[0].to_string();
        }
        let decoded = html_escape::decode_html_entities(&caps[0]);
        if decoded == caps[0] {
            return format!("&amp;{name};");
        }
        decoded.chars().map(|c| format!("&#{};", c as u32)).collect::<String>()
    })
}

#[async_trait]
impl SourceAdapter for FeedAdapter {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FailureReason;
    use crate::services::testing::{target, target_with};

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Remote Programming Jobs</title>
    <link>https://weworkremotely.com</link>
    <item>
      <title>Acme: Senior PHP Developer&nbsp;(Remote)</title>
      <link>https://weworkremotely.com/remote-jobs/acme-php</link>
      <pubDate>Sat, 01 Mar 2025 10:00:00 +0000</pubDate>
      <description><![CDATA[<p>Laravel shop</p>]]></description>
    </item>
    <item>
      <title><![CDATA[Go Engineer]]></title>
      <link>/remote-jobs/go</link>
    </item>
    <item>
      <title>No link at all</title>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Jobs</title>
  <entry>
    <title type="text">PHP Engineer</title>
    <link rel="self" href="https://jobs.example.com/api/1"/>
    <link rel="alternate" href="https://jobs.example.com/job/1"/>
    <updated>2025-03-02T08:00:00Z</updated>
    <author><name>Initech</name></author>
  </entry>
  <entry>
    <title>Symfony Developer</title>
    <link href="/job/2"/>
  </entry>
</feed>"#;

    const RDF: &str = r#"<?xml version="1.0"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns="http://purl.org/rss/1.0/">
  <channel rdf:about="https://example.com/"><title>x</title></channel>
  <item rdf:about="https://example.com/job/7">
    <title>PHP Support Engineer</title>
    <link>https://example.com/job/7</link>
  </item>
</rdf:RDF>"#;

    fn adapter(body: &str) -> FeedAdapter {
        FeedAdapter::new(
            target("https://weworkremotely.com/feed.rss", body),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_rss_items() {
        let records = adapter(RSS).extract(RSS).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "Acme: Senior PHP Developer\u{a0}(Remote)");
        assert_eq!(
            records[0].link,
            "https://weworkremotely.com/remote-jobs/acme-php"
        );
        assert_eq!(
            records[0].published.as_deref(),
            Some("Sat, 01 Mar 2025 10:00:00 +0000")
        );
        assert_eq!(records[0].summary.as_deref(), Some("<p>Laravel shop</p>"));
        assert_eq!(records[1].title, "Go Engineer");
        assert_eq!(records[1].link, "/remote-jobs/go");
    }

    #[test]
    fn test_atom_entries() {
        let records = adapter(ATOM).extract(ATOM).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "PHP Engineer");
        assert_eq!(records[0].link, "https://jobs.example.com/job/1");
        assert_eq!(records[0].employer.as_deref(), Some("Initech"));
        assert_eq!(records[0].published.as_deref(), Some("2025-03-02T08:00:00Z"));
        assert_eq!(records[1].link, "/job/2");
    }

    #[test]
    fn test_rdf_items() {
        let records = adapter(RDF).extract(RDF).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "PHP Support Engineer");
    }

    #[test]
    fn test_rdf_dc_date() {
        let body = r#"<?xml version="1.0"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns:dc="http://purl.org/dc/elements/1.1/"
         xmlns="http://purl.org/rss/1.0/">
  <item rdf:about="https://example.com/job/8">
    <title>PHP Backend Developer</title>
    <link>https://example.com/job/8</link>
    <dc:date>2025-03-01T00:00:00Z</dc:date>
  </item>
</rdf:RDF>"#;
        let records = adapter(body).extract(body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].published.as_deref(), Some("2025-03-01T00:00:00Z"));
    }

    #[test]
    fn test_rss_items_split_by_other_elements() {
        let body = r#"<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">
  <channel>
    <item><title>PHP Dev One</title><link>https://example.com/1</link></item>
    <atom:link href="https://example.com/feed" rel="self"/>
    <item><title>PHP Dev Two</title><link>https://example.com/2</link></item>
  </channel>
</rss>"#;
        let records = adapter(body).extract(body).unwrap();
        let titles: Vec<_> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["PHP Dev One", "PHP Dev Two"]);
    }

    #[test]
    fn test_html_named_entities_in_feed() {
        let body = r#"<rss version="2.0"><channel>
  <item>
    <title>PHP D&eacute;veloppeur &copy; &amp; Co &bogus;</title>
    <link>https://example.com/fr</link>
  </item>
</channel></rss>"#;
        let records = adapter(body).extract(body).unwrap();
        assert_eq!(records[0].title, "PHP Développeur © & Co &bogus;");
    }

    #[test]
    fn test_scrub_keeps_xml_entities() {
        assert_eq!(
            scrub_html_entities_for_xml("a &lt;b&gt; &amp; &nbsp;&hellip;"),
            "a &lt;b&gt; &amp; &#160;&#8230;"
        );
    }

    #[test]
    fn test_html_page_is_parse_error() {
        let body = "<html><body>Service unavailable</body></html>";
        let err = adapter(body).extract(body).unwrap_err();
        assert_eq!(err.reason(), FailureReason::ParseError);
    }

    #[test]
    fn test_garbage_is_parse_error() {
        assert!(adapter("").extract("").is_err());
        assert!(adapter("").extract("not xml at all").is_err());
    }

    #[tokio::test]
    async fn test_fetch_empty_channel_is_no_results() {
        let body = r#"<rss version="2.0"><channel><title>t</title></channel></rss>"#;
        match adapter(body).fetch().await {
            SourceResult::Failure(f) => assert_eq!(f.reason, FailureReason::NoResults),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_timeout_reason() {
        let adapter = FeedAdapter::new(
            target_with("https://example.com/feed", Err(FetchError::Timeout)),
            Duration::from_secs(5),
        );
        match adapter.fetch().await {
            SourceResult::Failure(f) => assert_eq!(f.reason, FailureReason::Timeout),
            other => panic!("unexpected {other:?}"),
        }
    }
}
