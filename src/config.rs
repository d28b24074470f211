// src/config.rs
//! Configuration surface consumed by the pipeline.
//!
//! Loaded from a TOML file with serde defaults for every knob; API
//! credentials come from the environment, never from the file.

use std::path::Path;
use std::time::Duration;
use std::{env, fs};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_CONFIG_PATH: &str = "config/postsmith.toml";
pub const ENV_API_KEY: &str = "ANTHROPIC_API_KEY";

fn default_model() -> String {
    "claude-sonnet-4-5".to_string()
}
fn default_char_limit() -> usize {
    280
}
fn default_draft_count() -> usize {
    5
}
fn default_delay_ms() -> u64 {
    500
}
fn default_data_dir() -> String {
    "data/batches".to_string()
}
fn default_voice_profile() -> String {
    "config/voice.json".to_string()
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_char_limit")]
    pub char_limit: usize,
    #[serde(default = "default_draft_count")]
    pub draft_count: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            char_limit: default_char_limit(),
            draft_count: default_draft_count(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    #[serde(default)]
    pub handle: String,
    /// Default topical hashtags offered to the prompt builder.
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default = "default_voice_profile")]
    pub voice_profile: String,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            handle: String::new(),
            hashtags: Vec::new(),
            voice_profile: default_voice_profile(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorsConfig {
    #[serde(default = "default_true")]
    pub news_enabled: bool,
    #[serde(default = "default_true")]
    pub social_enabled: bool,
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
    #[serde(default)]
    pub feeds: Vec<FeedConfig>,
    /// Handles of monitored accounts, without the leading '@'.
    #[serde(default)]
    pub accounts: Vec<String>,
    /// Subject for the metrics connector, e.g. a network name.
    #[serde(default)]
    pub metrics_subject: String,
    /// Pause between per-endpoint requests inside one connector.
    #[serde(default = "default_delay_ms")]
    pub inter_request_delay_ms: u64,
}

impl Default for ConnectorsConfig {
    fn default() -> Self {
        Self {
            news_enabled: true,
            social_enabled: true,
            metrics_enabled: true,
            feeds: Vec::new(),
            accounts: Vec::new(),
            metrics_subject: String::new(),
            inter_request_delay_ms: default_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeywordsConfig {
    #[serde(default)]
    pub primary: Vec<String>,
    #[serde(default)]
    pub secondary: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub persona: PersonaConfig,
    #[serde(default)]
    pub connectors: ConnectorsConfig,
    #[serde(default)]
    pub keywords: KeywordsConfig,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            generation: GenerationConfig::default(),
            persona: PersonaConfig::default(),
            connectors: ConnectorsConfig::default(),
            keywords: KeywordsConfig::default(),
            data_dir: default_data_dir(),
        }
    }
}

impl AppConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            cause: e,
        })?;
        let cfg: AppConfig = toml::from_str(&data).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from `$POSTSMITH_CONFIG` or the default path; a missing default
    /// file yields the built-in defaults.
    pub fn load_default() -> Result<Self, ConfigError> {
        if let Ok(p) = env::var("POSTSMITH_CONFIG") {
            return Self::load_from_file(p);
        }
        let p = Path::new(DEFAULT_CONFIG_PATH);
        if p.exists() {
            Self::load_from_file(p)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.generation.char_limit == 0 {
            return Err(ConfigError::Invalid("char_limit must be positive".into()));
        }
        if self.generation.draft_count == 0 {
            return Err(ConfigError::Invalid("draft_count must be positive".into()));
        }
        Ok(())
    }

    pub fn inter_request_delay(&self) -> Duration {
        Duration::from_millis(self.connectors.inter_request_delay_ms)
    }

    /// Backend API key from the environment.
    pub fn api_key() -> Option<String> {
        env::var(ENV_API_KEY).ok().filter(|k| !k.is_empty())
    }
}
