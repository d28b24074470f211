// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod config;
pub mod error;
pub mod filter;
pub mod generation;
pub mod model;
pub mod pipeline;
pub mod prompt;
pub mod sources;
pub mod store;
pub mod verify;
pub mod voice;

// ---- Re-exports for stable public API ----
pub use crate::error::{ConfigError, FetchError, GenerationError, StoreError};
pub use crate::model::{Batch, Draft, DraftMetadata, GenerationInput, SourceKind};
pub use crate::pipeline::{
    GenerateRequest, GenerateResponse, Pipeline, ReviseRequest, ReviseResponse,
};
pub use crate::sources::types::{
    Engagement, MetricSnapshot, NewsItem, SocialPost, SourceConnector, SourceItem,
    VerificationStatus,
};
pub use crate::voice::{StyleGuidelines, VoiceProfile, VoiceSample};
