// src/generation.rs
//! Generation client: backend abstraction, response validation and the
//! bounded repair step that turns model output into [`Draft`]s.
//!
//! The client calls the backend exactly once per invocation. Rate-limit and
//! timeout classification exists so a caller can choose to retry; the client
//! itself never does.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GenerationError;
use crate::model::{Draft, DraftMetadata, SourceKind};

const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_OUTPUT_TOKENS: u32 = 2048;

// ------------------------------------------------------------
// Backend abstraction
// ------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// One content block in a backend response. Only `text` blocks are consumed;
/// anything else is tolerated and skipped.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendResponse {
    pub content: Vec<ContentBlock>,
    pub model: String,
    #[serde(default)]
    pub usage: TokenUsage,
}

/// Low-level provider doing the remote call. Separated from the parsing
/// client so tests can exercise validation and repair without a network.
pub trait Backend: Send + Sync {
    fn complete<'a>(
        &'a self,
        system: &'a str,
        user: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<BackendResponse, GenerationError>> + Send + 'a>>;
    fn name(&self) -> &'static str;
}

/// Anthropic messages-API backend. Requires an API key.
pub struct AnthropicBackend {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl AnthropicBackend {
    pub fn new(api_key: String, model: String) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("postsmith/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client");
        Self { http, api_key, model }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl Backend for AnthropicBackend {
    fn complete<'a>(
        &'a self,
        system: &'a str,
        user: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<BackendResponse, GenerationError>> + Send + 'a>> {
        Box::pin(async move {
            #[derive(Serialize)]
            struct Msg<'a> {
                role: &'a str,
                content: &'a str,
            }
            #[derive(Serialize)]
            struct Req<'a> {
                model: &'a str,
                max_tokens: u32,
                system: &'a str,
                messages: Vec<Msg<'a>>,
            }

            let req = Req {
                model: &self.model,
                max_tokens: MAX_OUTPUT_TOKENS,
                system,
                messages: vec![Msg {
                    role: "user",
                    content: user,
                }],
            };

            let resp = self
                .http
                .post(ANTHROPIC_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&req)
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                counter!("generation_backend_errors_total").increment(1);
                return Err(classify_status(status.as_u16(), &self.model, body));
            }

            let parsed: BackendResponse = resp
                .json()
                .await
                .map_err(|e| GenerationError::MalformedResponse(format!("decoding response body: {e}")))?;
            Ok(parsed)
        })
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}

/// Map a non-success backend status to its user-facing error kind. The
/// classification feeds error messages directly, so it stays precise:
/// credential, rate limit and bad-model-name cases are never folded together.
pub fn classify_status(status: u16, model: &str, body: String) -> GenerationError {
    match status {
        401 | 403 => GenerationError::Unauthorized,
        429 => GenerationError::RateLimited,
        404 => GenerationError::ModelNotFound(model.to_string()),
        _ => GenerationError::Unknown {
            status,
            message: body,
        },
    }
}

/// Deterministic backend for tests and dry runs.
pub struct MockBackend {
    pub reply: BackendResponse,
}

impl MockBackend {
    pub fn with_text(text: &str) -> Self {
        Self {
            reply: BackendResponse {
                content: vec![ContentBlock::Text {
                    text: text.to_string(),
                }],
                model: "mock".to_string(),
                usage: TokenUsage {
                    input_tokens: 10,
                    output_tokens: 20,
                },
            },
        }
    }

    pub fn without_text(self) -> Self {
        Self {
            reply: BackendResponse {
                content: vec![ContentBlock::Other],
                ..self.reply
            },
        }
    }
}

impl Backend for MockBackend {
    fn complete<'a>(
        &'a self,
        _system: &'a str,
        _user: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<BackendResponse, GenerationError>> + Send + 'a>> {
        let reply = BackendResponse {
            content: self.reply.content.clone(),
            model: self.reply.model.clone(),
            usage: self.reply.usage.clone(),
        };
        Box::pin(async move { Ok(reply) })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

// ------------------------------------------------------------
// Generation client
// ------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub drafts: Vec<Draft>,
    pub tokens_used: u64,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct Revision {
    pub content: String,
    pub tokens_used: u64,
}

pub struct GenerationClient<B: Backend> {
    backend: B,
}

impl<B: Backend> GenerationClient<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// One generation call: send both prompts, validate the reply shape,
    /// repair partially-conforming draft objects.
    pub async fn generate(
        &self,
        system: &str,
        user: &str,
    ) -> Result<GenerationOutcome, GenerationError> {
        let resp = self.backend.complete(system, user).await?;
        let text = first_text_block(&resp)?;
        let drafts = parse_drafts(text, Utc::now())?;
        debug!(count = drafts.len(), model = %resp.model, "generation parsed");
        counter!("generation_drafts_total").increment(drafts.len() as u64);
        Ok(GenerationOutcome {
            drafts,
            tokens_used: resp.usage.total(),
            model: resp.model,
        })
    }

    /// Revision path: one replacement text for one draft, returned verbatim
    /// (trimmed). Persisting an accepted revision is the caller's job.
    pub async fn revise(
        &self,
        original_content: &str,
        feedback: &str,
    ) -> Result<Revision, GenerationError> {
        let system = "You revise a single social post. Reply with the revised post text only: \
                      no quotes, no JSON, no commentary.";
        let user = format!(
            "Original post:\n{original_content}\n\nFeedback from the editor:\n{feedback}\n\n\
             Write one revised version."
        );
        let resp = self.backend.complete(system, &user).await?;
        let text = first_text_block(&resp)?;
        Ok(Revision {
            content: text.trim().to_string(),
            tokens_used: resp.usage.total(),
        })
    }
}

/// First text-typed content block, or the malformed-response kind.
fn first_text_block(resp: &BackendResponse) -> Result<&str, GenerationError> {
    resp.content
        .iter()
        .find_map(|b| match b {
            ContentBlock::Text { text } => Some(text.as_str()),
            ContentBlock::Other => None,
        })
        .ok_or_else(|| {
            GenerationError::MalformedResponse("no text content block in response".to_string())
        })
}

/// Strip a fenced code block wrapper if the model added one. Transparent for
/// unfenced input.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop an optional language tag on the opening fence line
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse the model's reply into drafts, applying the bounded repair step.
///
/// Only the documented fields may be defaulted (id, confidence, created_at,
/// source); any other structural deviation (not an array, an entry that is
/// not an object, missing content) is rejected as invalid, never repaired.
pub fn parse_drafts(text: &str, now: DateTime<Utc>) -> Result<Vec<Draft>, GenerationError> {
    let body = strip_code_fences(text);
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| GenerationError::InvalidResponse(format!("not valid JSON: {e}")))?;
    let entries = value
        .as_array()
        .ok_or_else(|| GenerationError::InvalidResponse("expected a JSON array".to_string()))?;

    let mut drafts = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.iter().enumerate() {
        let obj = entry.as_object().ok_or_else(|| {
            GenerationError::InvalidResponse(format!("entry {idx} is not an object"))
        })?;

        let content = obj
            .get("content")
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                GenerationError::InvalidResponse(format!("entry {idx} has no content"))
            })?;

        let id = obj
            .get("id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("draft-{}-{idx}", now.timestamp_millis()));

        let confidence = obj
            .get("confidence")
            .and_then(|v| v.as_f64())
            .map(|c| c.clamp(0.0, 1.0) as f32)
            .unwrap_or(0.5);

        let created_at = obj
            .get("createdAt")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse::<DateTime<Utc>>().ok())
            .unwrap_or(now);

        let source = obj
            .get("source")
            .and_then(|v| v.as_str())
            .map(parse_source_kind)
            .unwrap_or_default();

        let context = obj
            .get("context")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        let metadata = obj
            .get("metadata")
            .and_then(|v| serde_json::from_value::<DraftMetadata>(v.clone()).ok());

        drafts.push(Draft {
            id,
            content: content.to_string(),
            source,
            context,
            confidence,
            created_at,
            metadata,
            source_items: None,
        });
    }
    Ok(drafts)
}

/// Unrecognized tags fold into `Mixed`, same as a missing tag.
fn parse_source_kind(s: &str) -> SourceKind {
    match s.to_ascii_lowercase().as_str() {
        "news" => SourceKind::News,
        "social" => SourceKind::Social,
        "onchain" | "on-chain" => SourceKind::Onchain,
        _ => SourceKind::Mixed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fence_stripping_is_transparent() {
        let plain = r#"[{"content":"hi"}]"#;
        let fenced = format!("```json\n{plain}\n```");
        let bare_fence = format!("```\n{plain}\n```");
        assert_eq!(strip_code_fences(plain), plain);
        assert_eq!(strip_code_fences(&fenced), plain);
        assert_eq!(strip_code_fences(&bare_fence), plain);
    }

    #[test]
    fn source_kind_parsing_folds_unknown_to_mixed() {
        assert_eq!(parse_source_kind("news"), SourceKind::News);
        assert_eq!(parse_source_kind("ONCHAIN"), SourceKind::Onchain);
        assert_eq!(parse_source_kind("banana"), SourceKind::Mixed);
    }
}
