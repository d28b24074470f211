// src/sources/metrics.rs
//! Metrics connector: current on-chain level plus a short history from an
//! analytics backend, with 24h/7d deltas computed here.
//!
//! The TVL query is primary: if it fails, the connector fails. Volume and
//! fees are independently optional sub-queries; either failing only omits
//! that field.

use std::time::Duration as StdDuration;

use ::metrics::counter;
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tracing::warn;

use crate::error::FetchError;
use crate::sources::types::{MetricSnapshot, SourceConnector, SourceItem};

const DEFAULT_BASE_URL: &str = "https://api.llama.fi";

/// One daily TVL observation, oldest first as the backend returns them.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TvlPoint {
    #[allow(dead_code)]
    pub date: u64,
    pub tvl: f64,
}

#[derive(Debug, Deserialize)]
struct Overview {
    #[serde(rename = "total24h")]
    total_24h: Option<f64>,
}

enum Mode {
    Http { base_url: String, client: reqwest::Client },
    /// Injected sub-query results; used by tests.
    Fixture {
        tvl: Option<f64>,
        history: Vec<TvlPoint>,
        volume: Option<f64>,
        fees: Option<f64>,
    },
}

pub struct MetricsConnector {
    subject: String,
    mode: Mode,
}

impl MetricsConnector {
    pub fn new(subject: String) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("postsmith/0.1")
            .connect_timeout(StdDuration::from_secs(4))
            .timeout(StdDuration::from_secs(10))
            .build()
            .expect("reqwest client");
        Self {
            subject,
            mode: Mode::Http {
                base_url: DEFAULT_BASE_URL.to_string(),
                client,
            },
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        if let Mode::Http { ref mut base_url, .. } = self.mode {
            *base_url = url.trim_end_matches('/').to_string();
        }
        self
    }

    pub fn from_fixture(
        subject: &str,
        tvl: Option<f64>,
        history: Vec<TvlPoint>,
        volume: Option<f64>,
        fees: Option<f64>,
    ) -> Self {
        Self {
            subject: subject.to_string(),
            mode: Mode::Fixture {
                tvl,
                history,
                volume,
                fees,
            },
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        client: &reqwest::Client,
        url: &str,
    ) -> Result<T, FetchError> {
        let resp = client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest("metrics", e))?;
        let status = resp.status();
        if status.as_u16() == 429 {
            return Err(FetchError::RateLimited { source: "metrics" });
        }
        if !status.is_success() {
            return Err(FetchError::InvalidResponse {
                source: "metrics",
                reason: format!("{url} returned {status}"),
            });
        }
        resp.json::<T>()
            .await
            .map_err(|e| FetchError::from_reqwest("metrics", e))
    }
}

/// Percentage change of `current` against the history point `points_back`
/// observations ago. Falls back to the current value as baseline when the
/// history is too short, which also sidesteps a zero baseline.
pub fn percent_change(current: f64, history: &[TvlPoint], points_back: usize) -> Option<f64> {
    let baseline = if history.len() > points_back {
        history[history.len() - 1 - points_back].tvl
    } else {
        current
    };
    if baseline == 0.0 {
        return None;
    }
    Some((current - baseline) / baseline * 100.0)
}

/// Assemble a snapshot from whatever sub-queries succeeded. Pure, so the
/// partial-failure policy is testable without a network.
pub fn build_snapshot(
    subject: &str,
    tvl: f64,
    history: &[TvlPoint],
    volume: Option<f64>,
    fees: Option<f64>,
) -> MetricSnapshot {
    MetricSnapshot {
        subject: subject.to_string(),
        captured_at: Utc::now(),
        tvl_usd: Some(tvl),
        tvl_change_24h: percent_change(tvl, history, 1),
        tvl_change_7d: percent_change(tvl, history, 7),
        tx_count_24h: None,
        active_addresses: None,
        volume_24h_usd: volume,
        fees_24h_usd: fees,
    }
}

#[async_trait]
impl SourceConnector for MetricsConnector {
    async fn fetch(&self) -> Result<Vec<SourceItem>, FetchError> {
        let (tvl, history, volume, fees) = match &self.mode {
            Mode::Fixture {
                tvl,
                history,
                volume,
                fees,
            } => {
                let tvl = tvl.ok_or(FetchError::NoData { source: "metrics" })?;
                (tvl, history.clone(), *volume, *fees)
            }
            Mode::Http { base_url, client } => {
                // Primary: current TVL. Failure here fails the connector.
                let tvl: f64 =
                    Self::get_json(client, &format!("{base_url}/tvl/{}", self.subject)).await?;

                // History for deltas; a failure only costs us the deltas.
                let history: Vec<TvlPoint> = match Self::get_json(
                    client,
                    &format!("{base_url}/v2/historicalChainTvl/{}", self.subject),
                )
                .await
                {
                    Ok(h) => h,
                    Err(e) => {
                        warn!(error = %e, "tvl history fetch failed, omitting deltas");
                        counter!("source_connector_errors_total").increment(1);
                        Vec::new()
                    }
                };

                // Secondary metrics, each independently optional.
                let volume = match Self::get_json::<Overview>(
                    client,
                    &format!("{base_url}/overview/dexs/{}?excludeTotalDataChart=true", self.subject),
                )
                .await
                {
                    Ok(o) => o.total_24h,
                    Err(e) => {
                        warn!(error = %e, "volume fetch failed, omitting field");
                        counter!("source_connector_errors_total").increment(1);
                        None
                    }
                };
                let fees = match Self::get_json::<Overview>(
                    client,
                    &format!("{base_url}/overview/fees/{}?excludeTotalDataChart=true", self.subject),
                )
                .await
                {
                    Ok(o) => o.total_24h,
                    Err(e) => {
                        warn!(error = %e, "fees fetch failed, omitting field");
                        counter!("source_connector_errors_total").increment(1);
                        None
                    }
                };

                (tvl, history, volume, fees)
            }
        };

        let snapshot = build_snapshot(&self.subject, tvl, &history, volume, fees);
        Ok(vec![SourceItem::Metrics(snapshot)])
    }

    fn name(&self) -> &'static str {
        "metrics"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hist(vals: &[f64]) -> Vec<TvlPoint> {
        vals.iter()
            .enumerate()
            .map(|(i, v)| TvlPoint {
                date: 1_700_000_000 + i as u64 * 86_400,
                tvl: *v,
            })
            .collect()
    }

    #[test]
    fn percent_change_uses_points_back() {
        let h = hist(&[100.0, 110.0, 120.0, 130.0, 140.0, 150.0, 160.0, 200.0]);
        // 24h: against second-to-last point (160.0)
        let d24 = percent_change(200.0, &h, 1).unwrap();
        assert!((d24 - 25.0).abs() < 1e-9);
        // 7d: against the point 7 back (100.0)
        let d7 = percent_change(200.0, &h, 7).unwrap();
        assert!((d7 - 100.0).abs() < 1e-9);
    }

    #[test]
    fn percent_change_falls_back_on_short_history() {
        let d = percent_change(200.0, &hist(&[190.0]), 7).unwrap();
        assert_eq!(d, 0.0);
        assert_eq!(percent_change(0.0, &[], 1), None);
    }
}
