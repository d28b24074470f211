// src/model.rs
//! Draft and batch models persisted by the output store.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::sources::types::{MetricSnapshot, NewsItem, SocialPost, SourceItem};

/// Which data category a draft was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    News,
    Social,
    Onchain,
    #[default]
    Mixed,
}

/// Pointers back to the specific inputs a draft used, for verification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub news_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub id: String,
    /// Post text, bounded by the configured character limit (default 280).
    pub content: String,
    #[serde(default)]
    pub source: SourceKind,
    /// Free-text provenance note, e.g. which headline prompted the draft.
    #[serde(default)]
    pub context: String,
    /// Model-reported confidence in [0, 1].
    pub confidence: f32,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DraftMetadata>,
    /// Embedded copies of the source items referenced, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_items: Option<Vec<SourceItem>>,
}

/// The exact material shown to the generator for one batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub news: Option<Vec<NewsItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social: Option<Vec<SocialPost>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricSnapshot>,
}

impl GenerationInput {
    pub fn is_empty(&self) -> bool {
        self.news.as_ref().map_or(true, |n| n.is_empty())
            && self.social.as_ref().map_or(true, |s| s.is_empty())
            && self.metrics.is_none()
    }
}

/// One generation run's output, keyed by calendar date. A second run on the
/// same day replaces this batch, keeping "today's drafts" singular.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub drafts: Vec<Draft>,
    pub input: GenerationInput,
}
