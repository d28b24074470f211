// src/sources/mod.rs
pub mod metrics;
pub mod news;
pub mod social;
pub mod types;

// Leading `::` keeps the metrics facade distinct from our metrics connector module.
use ::metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use tracing::warn;

use crate::error::FetchError;
use crate::sources::types::{MetricSnapshot, NewsItem, SocialPost, SourceItem};

/// One-time metrics registration so series have help text.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("source_items_total", "Items parsed from connectors.");
        describe_counter!("source_connector_errors_total", "Connector fetch/parse errors.");
        describe_histogram!("source_fetch_ms", "Connector fetch time in milliseconds.");
        describe_histogram!("source_parse_ms", "Feed parse time in milliseconds.");
        describe_gauge!("source_last_run_ts", "Unix ts when connectors last ran.");
    });
}

/// Normalize feed/post text: entity decode, tag strip, whitespace collapse.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Fold smart quotes to ASCII
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out.trim().to_string()
}

/// Truncate to at most `max` characters, appending an ellipsis when cut.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Everything the three connectors produced for one generation request.
#[derive(Debug, Default)]
pub struct FetchedSources {
    pub news: Option<Vec<NewsItem>>,
    pub social: Option<Vec<SocialPost>>,
    pub metrics: Option<MetricSnapshot>,
}

/// Run the enabled connectors concurrently and collect what succeeded.
///
/// A connector failure is logged and that source is omitted; the pipeline
/// proceeds with whatever remains. The connectors are independent, but each
/// one internally serializes its own per-endpoint requests.
pub async fn fetch_all(
    news: Option<&news::NewsConnector>,
    social: Option<&social::SocialConnector>,
    metrics: Option<&metrics::MetricsConnector>,
) -> FetchedSources {
    ensure_metrics_described();

    async fn run_opt<C: types::SourceConnector + ?Sized>(
        c: Option<&C>,
    ) -> Option<Result<Vec<SourceItem>, FetchError>> {
        match c {
            Some(c) => Some(c.fetch().await),
            None => None,
        }
    }

    let t0 = std::time::Instant::now();
    let (news_res, social_res, metrics_res) = tokio::join!(
        run_opt(news.map(|c| c as &dyn types::SourceConnector)),
        run_opt(social.map(|c| c as &dyn types::SourceConnector)),
        run_opt(metrics.map(|c| c as &dyn types::SourceConnector)),
    );
    histogram!("source_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    gauge!("source_last_run_ts").set(chrono::Utc::now().timestamp() as f64);

    let mut out = FetchedSources::default();

    if let Some(res) = news_res {
        match res {
            Ok(items) => {
                counter!("source_items_total").increment(items.len() as u64);
                out.news = Some(
                    items
                        .into_iter()
                        .filter_map(|it| match it {
                            SourceItem::News(n) => Some(n),
                            _ => None,
                        })
                        .collect(),
                );
            }
            Err(e) => {
                warn!(error = %e, connector = "news", "connector failed, omitting source");
                counter!("source_connector_errors_total").increment(1);
            }
        }
    }

    if let Some(res) = social_res {
        match res {
            Ok(items) => {
                counter!("source_items_total").increment(items.len() as u64);
                out.social = Some(
                    items
                        .into_iter()
                        .filter_map(|it| match it {
                            SourceItem::Social(p) => Some(p),
                            _ => None,
                        })
                        .collect(),
                );
            }
            Err(e) => {
                warn!(error = %e, connector = "social", "connector failed, omitting source");
                counter!("source_connector_errors_total").increment(1);
            }
        }
    }

    if let Some(res) = metrics_res {
        match res {
            Ok(items) => {
                counter!("source_items_total").increment(items.len() as u64);
                out.metrics = items.into_iter().find_map(|it| match it {
                    SourceItem::Metrics(m) => Some(m),
                    _ => None,
                });
            }
            Err(e) => {
                warn!(error = %e, connector = "metrics", "connector failed, omitting source");
                counter!("source_connector_errors_total").increment(1);
            }
        }
    }

    out
}
