// src/filter.rs
//! Relevance filter & scorer.
//!
//! Two independent knobs, both pure: a freshness predicate (timestamp within
//! window) and a keyword relevance score. They are applied identically to any
//! source item so the filtering logic is not duplicated per connector.

use chrono::{DateTime, Duration, Utc};

use crate::sources::types::SourceItem;

/// Topic keywords with primary terms weighted above secondary ones.
#[derive(Debug, Clone, Default)]
pub struct TopicKeywords {
    pub primary: Vec<String>,
    pub secondary: Vec<String>,
}

pub const PRIMARY_WEIGHT: f32 = 0.3;
pub const SECONDARY_WEIGHT: f32 = 0.15;

impl TopicKeywords {
    pub fn new<S: Into<String>>(
        primary: impl IntoIterator<Item = S>,
        secondary: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            primary: primary.into_iter().map(Into::into).collect(),
            secondary: secondary.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.secondary.is_empty()
    }
}

/// True when `ts` falls within `window` of `now`. Items dated in the future
/// (clock skew, bad feed metadata) count as fresh.
pub fn is_fresh(now: DateTime<Utc>, ts: DateTime<Utc>, window: Duration) -> bool {
    now.signed_duration_since(ts) <= window
}

/// Case-insensitive keyword gate: at least one primary or secondary term
/// appears in the text.
pub fn matches_topic(text: &str, keywords: &TopicKeywords) -> bool {
    if keywords.is_empty() {
        return true;
    }
    let haystack = text.to_lowercase();
    keywords
        .primary
        .iter()
        .chain(keywords.secondary.iter())
        .any(|k| haystack.contains(&k.to_lowercase()))
}

/// Weighted keyword presence, capped at 1.0. Primary hits are worth
/// [`PRIMARY_WEIGHT`], secondary hits [`SECONDARY_WEIGHT`].
pub fn relevance_score(text: &str, keywords: &TopicKeywords) -> f32 {
    let haystack = text.to_lowercase();
    let mut score = 0.0f32;
    for k in &keywords.primary {
        if haystack.contains(&k.to_lowercase()) {
            score += PRIMARY_WEIGHT;
        }
    }
    for k in &keywords.secondary {
        if haystack.contains(&k.to_lowercase()) {
            score += SECONDARY_WEIGHT;
        }
    }
    score.min(1.0)
}

/// Apply freshness + keyword gates uniformly over heterogeneous items and
/// attach a relevance score where the item carries one (news).
pub fn filter_and_score(
    now: DateTime<Utc>,
    items: Vec<SourceItem>,
    window: Duration,
    keywords: &TopicKeywords,
) -> Vec<SourceItem> {
    items
        .into_iter()
        .filter(|it| is_fresh(now, it.published_at(), window))
        .filter(|it| matches_topic(&it.text(), keywords))
        .map(|mut it| {
            if let SourceItem::News(ref mut n) = it {
                let text = format!("{} {}", n.title, n.summary);
                n.relevance = Some(relevance_score(&text, keywords));
            }
            it
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn kw() -> TopicKeywords {
        TopicKeywords::new(vec!["rollup", "mainnet"], vec!["gas", "bridge"])
    }

    #[test]
    fn freshness_window_is_inclusive() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        let window = Duration::days(7);
        assert!(is_fresh(now, now - Duration::days(7), window));
        assert!(!is_fresh(now, now - Duration::days(7) - Duration::seconds(1), window));
        // future-dated items pass
        assert!(is_fresh(now, now + Duration::hours(2), window));
    }

    #[test]
    fn keyword_gate_is_case_insensitive() {
        assert!(matches_topic("Mainnet launch confirmed", &kw()));
        assert!(matches_topic("cheaper GAS on L2", &kw()));
        assert!(!matches_topic("weather report", &kw()));
    }

    #[test]
    fn score_weights_primary_over_secondary_and_caps() {
        let k = kw();
        let one_primary = relevance_score("rollup news", &k);
        let one_secondary = relevance_score("bridge news", &k);
        assert!(one_primary > one_secondary);
        assert_eq!(one_primary, PRIMARY_WEIGHT);
        assert_eq!(one_secondary, SECONDARY_WEIGHT);

        let all = relevance_score("rollup mainnet gas bridge rollup mainnet gas bridge", &k);
        assert!(all <= 1.0);

        let many = TopicKeywords::new(
            vec!["a", "b", "c", "d", "e"],
            Vec::<&str>::new(),
        );
        assert_eq!(relevance_score("a b c d e", &many), 1.0);
    }

    #[test]
    fn filter_and_score_is_uniform_across_item_kinds() {
        use crate::sources::types::{NewsItem, SocialPost, SourceItem};

        let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        let items = vec![
            SourceItem::News(NewsItem {
                title: "Rollup fees drop".into(),
                summary: "gas down again".into(),
                url: "https://example.com/a".into(),
                source: "Feed".into(),
                published_at: now - Duration::days(1),
                relevance: None,
                verification: None,
            }),
            SourceItem::News(NewsItem {
                title: "Rollup retrospective".into(),
                summary: String::new(),
                url: "https://example.com/old".into(),
                source: "Feed".into(),
                published_at: now - Duration::days(10),
                relevance: None,
                verification: None,
            }),
            SourceItem::Social(SocialPost {
                id: "1".into(),
                author_name: "Dev".into(),
                author_handle: "@dev".into(),
                text: "unrelated lunch photo".into(),
                posted_at: now - Duration::hours(3),
                engagement: None,
            }),
        ];

        let kept = filter_and_score(now, items, Duration::days(7), &kw());
        // stale news dropped, off-topic social dropped, fresh news scored
        assert_eq!(kept.len(), 1);
        let SourceItem::News(n) = &kept[0] else {
            panic!("expected the fresh news item");
        };
        let score = n.relevance.expect("score attached");
        assert!((0.0..=1.0).contains(&score));
        assert_eq!(score, PRIMARY_WEIGHT + SECONDARY_WEIGHT);
    }

    #[test]
    fn empty_keyword_list_passes_everything() {
        let k = TopicKeywords::default();
        assert!(matches_topic("anything at all", &k));
        assert_eq!(relevance_score("anything at all", &k), 0.0);
    }
}
