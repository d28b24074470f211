// src/pipeline.rs
//! The generation pipeline: connectors → filter → prompt → backend → store.
//!
//! This is the narrow contract the CLI and dashboard call into. Connector
//! failures degrade to omitted sources; generation failures propagate with
//! their classified kind; a failed save is logged but never discards an
//! otherwise-successful generation.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::GenerationError;
use crate::generation::{Backend, GenerationClient};
use crate::model::{Draft, GenerationInput};
use crate::prompt::{self, PromptSettings};
use crate::sources::metrics::MetricsConnector;
use crate::sources::news::{Feed, FeedSource, NewsConnector};
use crate::sources::social::SocialConnector;
use crate::sources::{fetch_all, types::MetricSnapshot, types::NewsItem, types::SocialPost};
use crate::filter::TopicKeywords;
use crate::store::OutputStore;
use crate::voice::VoiceProfile;

/// Generation request consumed by the pipeline. Provided data is used as-is
/// unless `scrape_first` asks for a fresh fetch (or nothing was provided).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub news: Option<Vec<NewsItem>>,
    #[serde(default)]
    pub social: Option<Vec<SocialPost>>,
    #[serde(default)]
    pub metrics: Option<MetricSnapshot>,
    /// Ignore any provided data and re-fetch from connectors.
    #[serde(default)]
    pub scrape_first: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateResponse {
    pub drafts: Vec<Draft>,
    pub tokens_used: u64,
    pub model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviseRequest {
    pub draft_id: String,
    pub feedback: String,
    pub original_content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviseResponse {
    pub content: String,
    pub tokens_used: u64,
}

pub struct Pipeline<B: Backend> {
    config: AppConfig,
    voice: VoiceProfile,
    store: OutputStore,
    client: GenerationClient<B>,
}

impl<B: Backend> Pipeline<B> {
    pub fn new(config: AppConfig, voice: VoiceProfile, backend: B) -> Self {
        let store = OutputStore::new(config.data_dir.clone());
        Self {
            config,
            voice,
            store,
            client: GenerationClient::new(backend),
        }
    }

    pub fn store(&self) -> &OutputStore {
        &self.store
    }

    fn keywords(&self) -> TopicKeywords {
        TopicKeywords {
            primary: self.config.keywords.primary.clone(),
            secondary: self.config.keywords.secondary.clone(),
        }
    }

    /// Fetch from the enabled connectors, degrading per-source on failure.
    async fn scrape(&self) -> GenerationInput {
        let c = &self.config.connectors;
        let delay = self.config.inter_request_delay();

        let news = (c.news_enabled && !c.feeds.is_empty()).then(|| {
            let feeds = c
                .feeds
                .iter()
                .map(|f| Feed {
                    name: f.name.clone(),
                    source: FeedSource::Http(f.url.clone()),
                })
                .collect();
            NewsConnector::new(feeds, self.keywords(), delay)
        });

        let social = (c.social_enabled && !c.accounts.is_empty())
            .then(|| SocialConnector::from_env(c.accounts.clone(), delay));

        let metrics = if c.metrics_enabled {
            if c.metrics_subject.is_empty() {
                warn!("metrics connector enabled but metrics_subject is empty, skipping");
                None
            } else {
                Some(MetricsConnector::new(c.metrics_subject.clone()))
            }
        } else {
            None
        };

        let fetched = fetch_all(news.as_ref(), social.as_ref(), metrics.as_ref()).await;
        GenerationInput {
            news: fetched.news,
            social: fetched.social,
            metrics: fetched.metrics,
        }
    }

    /// Run one generation: assemble input, call the backend once, persist the
    /// batch, return the drafts with token usage and the model id used.
    pub async fn generate(&self, req: GenerateRequest) -> Result<GenerateResponse, GenerationError> {
        let provided = GenerationInput {
            news: req.news,
            social: req.social,
            metrics: req.metrics,
        };
        let input = if req.scrape_first || provided.is_empty() {
            self.scrape().await
        } else {
            provided
        };

        let settings = PromptSettings {
            persona_handle: self.config.persona.handle.clone(),
            char_limit: self.config.generation.char_limit,
            hashtags: self.config.persona.hashtags.clone(),
        };
        let prompts = prompt::build(&self.voice, &input, self.config.generation.draft_count, &settings);

        let outcome = self.client.generate(&prompts.system, &prompts.user).await?;
        info!(
            drafts = outcome.drafts.len(),
            tokens = outcome.tokens_used,
            model = %outcome.model,
            "generation complete"
        );

        // Persist with full provenance. A read-only disk must not cost the
        // caller the drafts that were already generated.
        if let Err(e) = self.store.save(outcome.drafts.clone(), input) {
            warn!(error = %e, "failed to persist batch, returning drafts anyway");
        }

        Ok(GenerateResponse {
            drafts: outcome.drafts,
            tokens_used: outcome.tokens_used,
            model: outcome.model,
        })
    }

    /// Produce one alternative for a draft. Persisting an accepted revision
    /// is an explicit follow-up call, not a side effect here.
    pub async fn revise(&self, req: ReviseRequest) -> Result<ReviseResponse, GenerationError> {
        let revision = self
            .client
            .revise(&req.original_content, &req.feedback)
            .await?;
        info!(draft_id = %req.draft_id, tokens = revision.tokens_used, "revision complete");
        Ok(ReviseResponse {
            content: revision.content,
            tokens_used: revision.tokens_used,
        })
    }
}
