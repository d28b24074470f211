// src/voice.rs
//! Voice profile: sample utterances + style attributes.
//!
//! The profile is derived offline by a separate analyzer; this module only
//! defines its on-disk contract and loading. The prompt builder consumes it as
//! an explicit argument so tests can swap it freely.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmojiTier {
    None,
    #[default]
    Sparse,
    Frequent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthTier {
    Short,
    #[default]
    Medium,
    Long,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StyleGuidelines {
    #[serde(default)]
    pub emoji: EmojiTier,
    #[serde(default)]
    pub uses_hashtags: bool,
    #[serde(default)]
    pub length: LengthTier,
    /// Leads with numbers/data before narrative.
    #[serde(default)]
    pub data_first: bool,
    #[serde(default)]
    pub humor: bool,
    #[serde(default)]
    pub asks_questions: bool,
    #[serde(default)]
    pub calls_to_action: bool,
    /// Terms the persona never uses.
    #[serde(default)]
    pub avoid_terms: Vec<String>,
    /// term -> preferred synonym. BTreeMap keeps prompt rendering deterministic.
    #[serde(default)]
    pub preferred_terms: BTreeMap<String, String>,
}

/// One prior utterance in the target voice, with the engagement it earned so
/// samples can be ranked before being shown to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceSample {
    pub text: String,
    #[serde(default)]
    pub engagement: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoiceProfile {
    #[serde(default)]
    pub samples: Vec<VoiceSample>,
    #[serde(default)]
    pub style: StyleGuidelines,
}

impl VoiceProfile {
    /// Load a profile from a JSON file written by the offline analyzer.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            cause: e,
        })?;
        serde_json::from_str(&data).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Top `n` sample texts by engagement, deduplicated, then sorted
    /// lexicographically so prompt assembly stays byte-stable.
    pub fn top_samples(&self, n: usize) -> Vec<String> {
        let mut ranked: Vec<&VoiceSample> = self.samples.iter().collect();
        ranked.sort_by(|a, b| b.engagement.cmp(&a.engagement));
        let mut texts: Vec<String> = ranked
            .into_iter()
            .take(n)
            .map(|s| s.text.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        texts.sort();
        texts.dedup();
        texts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_samples_ranks_by_engagement_then_sorts() {
        let profile = VoiceProfile {
            samples: vec![
                VoiceSample { text: "zeta".into(), engagement: 10 },
                VoiceSample { text: "alpha".into(), engagement: 500 },
                VoiceSample { text: "mid".into(), engagement: 50 },
                VoiceSample { text: "ignored".into(), engagement: 1 },
            ],
            style: StyleGuidelines::default(),
        };
        let top = profile.top_samples(3);
        // highest-engagement three survive, output order is lexicographic
        assert_eq!(top, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn top_samples_dedups_and_drops_empty() {
        let profile = VoiceProfile {
            samples: vec![
                VoiceSample { text: "same".into(), engagement: 5 },
                VoiceSample { text: "same".into(), engagement: 4 },
                VoiceSample { text: "   ".into(), engagement: 900 },
            ],
            style: StyleGuidelines::default(),
        };
        assert_eq!(profile.top_samples(5), vec!["same"]);
    }
}
