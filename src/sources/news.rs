// src/sources/news.rs
//! News connector: fetches and parses a static list of RSS feeds.
//!
//! One feed failing is logged and skipped; the connector as a whole only
//! reports what it could parse. Zero fresh, relevant items is an empty
//! success, not an error.

use std::collections::HashSet;
use std::time::Duration as StdDuration;

use ::metrics::{counter, histogram};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use quick_xml::de::from_str;
use serde::Deserialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};
use tracing::warn;

use crate::error::FetchError;
use crate::filter::{filter_and_score, TopicKeywords};
use crate::sources::types::{NewsItem, SourceConnector, SourceItem};
use crate::sources::{normalize_text, truncate_chars};

pub const SUMMARY_MAX_CHARS: usize = 500;
pub const DEFAULT_TOP_N: usize = 12;
pub const FRESHNESS_DAYS: i64 = 7;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

fn parse_rfc2822(ts: &str) -> Option<DateTime<Utc>> {
    OffsetDateTime::parse(ts, &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC))
        .and_then(|dt| Utc.timestamp_opt(dt.unix_timestamp(), 0).single())
}

/// One configured feed endpoint.
#[derive(Debug, Clone)]
pub struct Feed {
    pub name: String,
    pub source: FeedSource,
}

#[derive(Debug, Clone)]
pub enum FeedSource {
    Http(String),
    /// Raw XML injected directly; used by tests and offline runs.
    Fixture(String),
}

pub struct NewsConnector {
    feeds: Vec<Feed>,
    keywords: TopicKeywords,
    freshness: Duration,
    /// Pause between feed requests so we don't trip upstream rate limits.
    inter_request_delay: StdDuration,
    top_n: usize,
    client: reqwest::Client,
}

impl NewsConnector {
    pub fn new(feeds: Vec<Feed>, keywords: TopicKeywords, inter_request_delay: StdDuration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("postsmith/0.1")
            .connect_timeout(StdDuration::from_secs(4))
            .timeout(StdDuration::from_secs(10))
            .build()
            .expect("reqwest client");
        Self {
            feeds,
            keywords,
            freshness: Duration::days(FRESHNESS_DAYS),
            inter_request_delay,
            top_n: DEFAULT_TOP_N,
            client,
        }
    }

    pub fn with_top_n(mut self, n: usize) -> Self {
        self.top_n = n;
        self
    }

    pub fn with_freshness(mut self, window: Duration) -> Self {
        self.freshness = window;
        self
    }

    /// Fixture-only connector with no delay, for tests.
    pub fn from_fixtures(fixtures: Vec<(&str, &str)>, keywords: TopicKeywords) -> Self {
        let feeds = fixtures
            .into_iter()
            .map(|(name, xml)| Feed {
                name: name.to_string(),
                source: FeedSource::Fixture(xml.to_string()),
            })
            .collect();
        Self::new(feeds, keywords, StdDuration::ZERO)
    }

    /// Parse one feed body into normalized items. Freshness and relevance are
    /// applied afterwards, uniformly, by [`crate::filter::filter_and_score`].
    fn parse_feed(&self, feed_name: &str, xml: &str) -> Result<Vec<NewsItem>, FetchError> {
        let t0 = std::time::Instant::now();
        let rss: Rss = from_str(xml).map_err(|e| FetchError::InvalidResponse {
            source: "news",
            reason: format!("{feed_name}: {e}"),
        })?;

        let mut out = Vec::with_capacity(rss.channel.item.len());
        for it in rss.channel.item {
            let title = normalize_text(it.title.as_deref().unwrap_or_default());
            if title.is_empty() {
                continue;
            }
            let Some(url) = it.link.filter(|l| !l.trim().is_empty()) else {
                // no canonical URL means no identity for dedup/verification
                continue;
            };
            let Some(published_at) = it.pub_date.as_deref().and_then(parse_rfc2822) else {
                continue;
            };

            out.push(NewsItem {
                title,
                summary: truncate_chars(
                    &normalize_text(it.description.as_deref().unwrap_or_default()),
                    SUMMARY_MAX_CHARS,
                ),
                url: url.trim().to_string(),
                source: feed_name.to_string(),
                published_at,
                relevance: None,
                verification: None,
            });
        }

        histogram!("source_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(out)
    }

    async fn fetch_feed_body(&self, feed: &Feed) -> Result<String, FetchError> {
        match &feed.source {
            FeedSource::Fixture(xml) => Ok(xml.clone()),
            FeedSource::Http(url) => {
                let resp = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| FetchError::from_reqwest("news", e))?;
                if resp.status().as_u16() == 429 {
                    return Err(FetchError::RateLimited { source: "news" });
                }
                if !resp.status().is_success() {
                    return Err(FetchError::InvalidResponse {
                        source: "news",
                        reason: format!("{} returned {}", feed.name, resp.status()),
                    });
                }
                resp.text()
                    .await
                    .map_err(|e| FetchError::from_reqwest("news", e))
            }
        }
    }
}

#[async_trait]
impl SourceConnector for NewsConnector {
    async fn fetch(&self) -> Result<Vec<SourceItem>, FetchError> {
        let now = Utc::now();
        let mut all: Vec<NewsItem> = Vec::new();

        for (i, feed) in self.feeds.iter().enumerate() {
            if i > 0 && !self.inter_request_delay.is_zero() {
                tokio::time::sleep(self.inter_request_delay).await;
            }
            let body = match self.fetch_feed_body(feed).await {
                Ok(b) => b,
                Err(e) => {
                    warn!(error = %e, feed = %feed.name, "feed fetch failed, skipping");
                    counter!("source_connector_errors_total").increment(1);
                    continue;
                }
            };
            match self.parse_feed(&feed.name, &body) {
                Ok(mut items) => all.append(&mut items),
                Err(e) => {
                    warn!(error = %e, feed = %feed.name, "feed parse failed, skipping");
                    counter!("source_connector_errors_total").increment(1);
                }
            }
        }

        // Dedup by canonical URL across feeds, keeping the first occurrence.
        let mut seen: HashSet<String> = HashSet::new();
        all.retain(|n| seen.insert(n.url.clone()));

        let kept = filter_and_score(
            now,
            all.into_iter().map(SourceItem::News).collect(),
            self.freshness,
            &self.keywords,
        );
        let mut fresh: Vec<NewsItem> = kept
            .into_iter()
            .filter_map(|it| match it {
                SourceItem::News(n) => Some(n),
                _ => None,
            })
            .collect();

        fresh.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        fresh.truncate(self.top_n);

        Ok(fresh.into_iter().map(SourceItem::News).collect())
    }

    fn name(&self) -> &'static str {
        "news"
    }
}
