// src/sources/social.rs
//! Social connector: recent posts from a fixed roster of monitored accounts.
//!
//! Each handle is resolved to an internal user id, then its latest posts are
//! fetched, with a delay between account requests. A missing bearer token is
//! its own failure kind. Unlike news, an empty overall result is a failure:
//! callers that asked for social input depend on it being present.

use std::time::Duration as StdDuration;

use ::metrics::counter;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use crate::error::FetchError;
use crate::sources::types::{Engagement, SocialPost, SourceConnector, SourceItem};
use crate::sources::normalize_text;

pub const ENV_BEARER_TOKEN: &str = "SOCIAL_BEARER_TOKEN";
pub const DEFAULT_POSTS_PER_ACCOUNT: usize = 5;
const DEFAULT_BASE_URL: &str = "https://api.twitter.com";

#[derive(Debug, Deserialize)]
struct UserLookup {
    data: UserData,
}
#[derive(Debug, Deserialize)]
struct UserData {
    id: String,
    name: String,
    username: String,
}

#[derive(Debug, Deserialize)]
struct Timeline {
    #[serde(default)]
    data: Vec<Tweet>,
}
#[derive(Debug, Deserialize)]
struct Tweet {
    id: String,
    text: String,
    created_at: Option<DateTime<Utc>>,
    public_metrics: Option<PublicMetrics>,
}
#[derive(Debug, Deserialize)]
struct PublicMetrics {
    #[serde(default)]
    like_count: u64,
    #[serde(default)]
    retweet_count: u64,
    #[serde(default)]
    reply_count: u64,
}

enum Mode {
    Http { base_url: String, client: reqwest::Client },
    /// Pre-normalized posts injected directly; used by tests.
    Fixture(Vec<SocialPost>),
}

pub struct SocialConnector {
    accounts: Vec<String>,
    bearer_token: Option<String>,
    posts_per_account: usize,
    inter_request_delay: StdDuration,
    mode: Mode,
}

impl SocialConnector {
    /// `bearer_token` is typically read from [`ENV_BEARER_TOKEN`]; passing it
    /// explicitly keeps tests independent of process env.
    pub fn new(
        accounts: Vec<String>,
        bearer_token: Option<String>,
        inter_request_delay: StdDuration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("postsmith/0.1")
            .connect_timeout(StdDuration::from_secs(4))
            .timeout(StdDuration::from_secs(10))
            .build()
            .expect("reqwest client");
        Self {
            accounts,
            bearer_token,
            posts_per_account: DEFAULT_POSTS_PER_ACCOUNT,
            inter_request_delay,
            mode: Mode::Http {
                base_url: DEFAULT_BASE_URL.to_string(),
                client,
            },
        }
    }

    pub fn from_env(accounts: Vec<String>, inter_request_delay: StdDuration) -> Self {
        let token = std::env::var(ENV_BEARER_TOKEN).ok().filter(|t| !t.is_empty());
        Self::new(accounts, token, inter_request_delay)
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        if let Mode::Http { ref mut base_url, .. } = self.mode {
            *base_url = url.trim_end_matches('/').to_string();
        }
        self
    }

    pub fn with_posts_per_account(mut self, n: usize) -> Self {
        self.posts_per_account = n;
        self
    }

    /// Fixture connector for tests: still enforces the credential and
    /// empty-result policies.
    pub fn from_fixture(posts: Vec<SocialPost>, bearer_token: Option<String>) -> Self {
        Self {
            accounts: Vec::new(),
            bearer_token,
            posts_per_account: DEFAULT_POSTS_PER_ACCOUNT,
            inter_request_delay: StdDuration::ZERO,
            mode: Mode::Fixture(posts),
        }
    }

    async fn fetch_account(
        &self,
        base_url: &str,
        client: &reqwest::Client,
        token: &str,
        handle: &str,
    ) -> Result<Vec<SocialPost>, FetchError> {
        // 1) handle -> user id
        let lookup_url = format!("{base_url}/2/users/by/username/{handle}");
        let resp = client
            .get(&lookup_url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest("social", e))?;
        let user = check_status(resp, handle)
            .await?
            .json::<UserLookup>()
            .await
            .map_err(|e| FetchError::from_reqwest("social", e))?
            .data;

        // 2) latest posts for the id
        let timeline_url = format!(
            "{base_url}/2/users/{}/tweets?max_results={}&tweet.fields=created_at,public_metrics",
            user.id, self.posts_per_account
        );
        let resp = client
            .get(&timeline_url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest("social", e))?;
        let timeline = check_status(resp, handle)
            .await?
            .json::<Timeline>()
            .await
            .map_err(|e| FetchError::from_reqwest("social", e))?;

        Ok(timeline
            .data
            .into_iter()
            .map(|t| SocialPost {
                id: t.id,
                author_name: user.name.clone(),
                author_handle: format!("@{}", user.username),
                text: normalize_text(&t.text),
                posted_at: t.created_at.unwrap_or_else(Utc::now),
                engagement: t.public_metrics.map(|m| Engagement {
                    likes: m.like_count,
                    reshares: m.retweet_count,
                    replies: m.reply_count,
                }),
            })
            .collect())
    }
}

async fn check_status(
    resp: reqwest::Response,
    handle: &str,
) -> Result<reqwest::Response, FetchError> {
    let status = resp.status().as_u16();
    match status {
        429 => Err(FetchError::RateLimited { source: "social" }),
        s if !resp.status().is_success() => Err(FetchError::InvalidResponse {
            source: "social",
            reason: format!("{handle}: upstream returned {s}"),
        }),
        _ => Ok(resp),
    }
}

#[async_trait]
impl SourceConnector for SocialConnector {
    async fn fetch(&self) -> Result<Vec<SourceItem>, FetchError> {
        // Credential check first: it is the most common misconfiguration and
        // must never surface as a network error.
        let token = self
            .bearer_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(FetchError::MissingCredential(ENV_BEARER_TOKEN))?;

        let mut all: Vec<SocialPost> = Vec::new();
        match &self.mode {
            Mode::Fixture(posts) => all.extend(posts.iter().cloned()),
            Mode::Http { base_url, client } => {
                for (i, handle) in self.accounts.iter().enumerate() {
                    if i > 0 && !self.inter_request_delay.is_zero() {
                        tokio::time::sleep(self.inter_request_delay).await;
                    }
                    match self.fetch_account(base_url, client, token, handle).await {
                        Ok(mut posts) => all.append(&mut posts),
                        Err(e @ FetchError::RateLimited { .. }) => return Err(e),
                        Err(e) => {
                            warn!(error = %e, handle = %handle, "account fetch failed, skipping");
                            counter!("source_connector_errors_total").increment(1);
                        }
                    }
                }
            }
        }

        if all.is_empty() {
            // The caller asked for social input; nothing at all is a failure.
            return Err(FetchError::NoData { source: "social" });
        }

        all.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));
        Ok(all.into_iter().map(SourceItem::Social).collect())
    }

    fn name(&self) -> &'static str {
        "social"
    }
}
