// src/sources/types.rs
//! Normalized source records and the connector trait.
//!
//! Upstream payloads (RSS XML, timeline JSON, analytics JSON) are loosely
//! typed; connectors validate them at the boundary and emit only these strict
//! variants. Every item carries enough identity (URL, post id, or
//! subject+timestamp) to be deduplicated and independently re-verified later.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Outcome of a post-generation URL reachability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Verified,
    Unverified,
    Broken,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub summary: String,
    /// Canonical article URL; identity for dedup and re-verification.
    pub url: String,
    /// Originating feed name, e.g. "The Block".
    pub source: String,
    pub published_at: DateTime<Utc>,
    /// Keyword-based topical match strength in [0, 1].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification: Option<VerificationStatus>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    pub likes: u64,
    pub reshares: u64,
    pub replies: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialPost {
    /// Upstream post id; identity for dedup.
    pub id: String,
    pub author_name: String,
    pub author_handle: String,
    pub text: String,
    pub posted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engagement: Option<Engagement>,
}

/// Point-in-time on-chain metrics for one subject (network).
///
/// Sources are partial, so every metric is independently optional: a failed
/// sub-query omits its field rather than failing the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    /// Subject identifier, e.g. the network name.
    pub subject: String,
    pub captured_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tvl_usd: Option<f64>,
    /// Percentage change over the last 24h / 7d, e.g. -3.2 for -3.2%.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tvl_change_24h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tvl_change_7d: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_count_24h: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_addresses: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_24h_usd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fees_24h_usd: Option<f64>,
}

/// Union of heterogeneous provenance records flowing out of connectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceItem {
    News(NewsItem),
    Social(SocialPost),
    Metrics(MetricSnapshot),
}

impl SourceItem {
    /// Stable identity used for deduplication.
    pub fn identity(&self) -> String {
        match self {
            SourceItem::News(n) => n.url.clone(),
            SourceItem::Social(p) => p.id.clone(),
            SourceItem::Metrics(m) => format!("{}@{}", m.subject, m.captured_at.timestamp()),
        }
    }

    pub fn published_at(&self) -> DateTime<Utc> {
        match self {
            SourceItem::News(n) => n.published_at,
            SourceItem::Social(p) => p.posted_at,
            SourceItem::Metrics(m) => m.captured_at,
        }
    }

    /// Text surface used by the uniform relevance scorer.
    pub fn text(&self) -> String {
        match self {
            SourceItem::News(n) => format!("{} {}", n.title, n.summary),
            SourceItem::Social(p) => p.text.clone(),
            SourceItem::Metrics(m) => m.subject.clone(),
        }
    }
}

#[async_trait::async_trait]
pub trait SourceConnector: Send + Sync {
    /// Fetch and normalize the latest items from this source category.
    async fn fetch(&self) -> Result<Vec<SourceItem>, FetchError>;
    /// Connector name for diagnostics.
    fn name(&self) -> &'static str;
}
