// src/prompt.rs
//! Deterministic prompt assembly. Pure, no I/O.
//!
//! The builder renders what the connectors already bounded; it never trims or
//! re-filters input items. Calling it twice with identical inputs yields
//! byte-identical prompts.

use std::fmt::Write as _;

use crate::model::GenerationInput;
use crate::voice::{EmojiTier, LengthTier, VoiceProfile};

/// How many voice samples are shown to the model.
const SAMPLE_COUNT: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompts {
    pub system: String,
    pub user: String,
}

/// Static knobs the builder needs from configuration.
#[derive(Debug, Clone)]
pub struct PromptSettings {
    /// Persona handle, e.g. "@basedprotocol".
    pub persona_handle: String,
    /// Hard per-draft character cap.
    pub char_limit: usize,
    /// Default topical hashtags the persona may use.
    pub hashtags: Vec<String>,
}

pub fn build(profile: &VoiceProfile, input: &GenerationInput, target_count: usize, settings: &PromptSettings) -> Prompts {
    Prompts {
        system: build_system_prompt(profile, target_count, settings),
        user: build_user_prompt(input),
    }
}

fn build_system_prompt(profile: &VoiceProfile, target_count: usize, settings: &PromptSettings) -> String {
    let style = &profile.style;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "You write social posts as {}. Match the voice exactly.",
        settings.persona_handle
    );
    out.push_str("\nStyle:\n");
    let _ = writeln!(
        out,
        "- Emoji: {}",
        match style.emoji {
            EmojiTier::None => "never",
            EmojiTier::Sparse => "at most one per post",
            EmojiTier::Frequent => "freely, several per post",
        }
    );
    let _ = writeln!(
        out,
        "- Hashtags: {}",
        if style.uses_hashtags {
            "yes, when topical"
        } else {
            "no"
        }
    );
    if style.uses_hashtags && !settings.hashtags.is_empty() {
        let _ = writeln!(out, "- Preferred hashtags: {}", settings.hashtags.join(" "));
    }
    let _ = writeln!(
        out,
        "- Typical length: {}",
        match style.length {
            LengthTier::Short => "short, one punchy line",
            LengthTier::Medium => "one to two sentences",
            LengthTier::Long => "a dense multi-sentence post",
        }
    );
    if style.data_first {
        out.push_str("- Lead with the number or data point, then the takeaway.\n");
    }
    if style.humor {
        out.push_str("- Dry humor is welcome.\n");
    }
    if style.asks_questions {
        out.push_str("- Occasionally end with a question to the audience.\n");
    }
    if style.calls_to_action {
        out.push_str("- A light call to action is fine.\n");
    }

    let samples = profile.top_samples(SAMPLE_COUNT);
    if !samples.is_empty() {
        out.push_str("\nPrior posts in this voice:\n");
        for s in &samples {
            let _ = writeln!(out, "- {s}");
        }
    }

    if !style.avoid_terms.is_empty() {
        let _ = writeln!(out, "\nNever use these terms: {}.", style.avoid_terms.join(", "));
    }
    for (term, preferred) in &style.preferred_terms {
        let _ = writeln!(out, "Write \"{preferred}\" instead of \"{term}\".");
    }

    let _ = writeln!(
        out,
        "\nProduce exactly {target_count} posts. Each post must be at most {} characters.",
        settings.char_limit
    );
    out.push_str(
        "Respond with a JSON array only, no prose around it. Each element is an object with \
         fields: \"content\" (string, the post), \"source\" (one of \"news\", \"social\", \
         \"onchain\", \"mixed\"), \"context\" (string, which input it draws on), \
         \"confidence\" (number 0-1).\n",
    );
    out
}

fn build_user_prompt(input: &GenerationInput) -> String {
    if input.is_empty() {
        return "No fresh source data is available right now. Draw on general knowledge of the \
                project and its domain to write evergreen posts.\n"
            .to_string();
    }

    let mut out = String::from("Today's source data:\n");

    if let Some(news) = input.news.as_ref().filter(|n| !n.is_empty()) {
        out.push_str("\nNews:\n");
        for n in news {
            let _ = writeln!(out, "- [{}] {}: {} ({})", n.source, n.title, n.summary, n.url);
        }
    }

    if let Some(posts) = input.social.as_ref().filter(|s| !s.is_empty()) {
        out.push_str("\nRecent posts from watched accounts:\n");
        for p in posts {
            let _ = writeln!(out, "- {} ({}): {}", p.author_name, p.author_handle, p.text);
        }
    }

    if let Some(m) = input.metrics.as_ref() {
        let _ = writeln!(out, "\nOn-chain metrics for {}:", m.subject);
        if let Some(tvl) = m.tvl_usd {
            let mut line = format!("- TVL: ${}", thousands(tvl.round() as i64));
            if let Some(d) = m.tvl_change_24h {
                let _ = write!(line, " ({d:+.1}% 24h");
                if let Some(w) = m.tvl_change_7d {
                    let _ = write!(line, ", {w:+.1}% 7d");
                }
                line.push(')');
            } else if let Some(w) = m.tvl_change_7d {
                let _ = write!(line, " ({w:+.1}% 7d)");
            }
            let _ = writeln!(out, "{line}");
        }
        if let Some(tx) = m.tx_count_24h {
            let _ = writeln!(out, "- Transactions (24h): {}", thousands(tx as i64));
        }
        if let Some(a) = m.active_addresses {
            let _ = writeln!(out, "- Active addresses: {}", thousands(a as i64));
        }
        if let Some(v) = m.volume_24h_usd {
            let _ = writeln!(out, "- Volume (24h): ${}", thousands(v.round() as i64));
        }
        if let Some(f) = m.fees_24h_usd {
            let _ = writeln!(out, "- Fees (24h): ${}", thousands(f.round() as i64));
        }
    }

    out
}

/// Render an integer with comma thousands separators.
fn thousands(n: i64) -> String {
    let neg = n < 0;
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if neg {
        format!("-{out}")
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_separators() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1_000), "1,000");
        assert_eq!(thousands(1_234_567), "1,234,567");
        assert_eq!(thousands(-45_000), "-45,000");
    }
}
