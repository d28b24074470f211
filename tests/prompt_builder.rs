use chrono::{TimeZone, Utc};
use postsmith::model::GenerationInput;
use postsmith::prompt::{build, PromptSettings};
use postsmith::sources::types::{MetricSnapshot, NewsItem, SocialPost};
use postsmith::voice::{StyleGuidelines, VoiceProfile, VoiceSample};

fn settings() -> PromptSettings {
    PromptSettings {
        persona_handle: "@examplechain".to_string(),
        char_limit: 280,
        hashtags: vec!["#examplechain".to_string()],
    }
}

fn profile() -> VoiceProfile {
    VoiceProfile {
        samples: vec![
            VoiceSample { text: "gm. numbers first, vibes second.".into(), engagement: 420 },
            VoiceSample { text: "shipping > roadmaps".into(), engagement: 99 },
        ],
        style: StyleGuidelines {
            data_first: true,
            uses_hashtags: true,
            avoid_terms: vec!["revolutionary".into(), "game-changer".into()],
            ..Default::default()
        },
    }
}

fn input() -> GenerationInput {
    GenerationInput {
        news: Some(vec![NewsItem {
            title: "Rollup upgrade live".into(),
            summary: "The upgrade cut fees by half.".into(),
            url: "https://example.com/upgrade".into(),
            source: "TestWire".into(),
            published_at: Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap(),
            relevance: Some(0.6),
            verification: None,
        }]),
        social: Some(vec![SocialPost {
            id: "1".into(),
            author_name: "Dev One".into(),
            author_handle: "@devone".into(),
            text: "benchmarks look great".into(),
            posted_at: Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap(),
            engagement: None,
        }]),
        metrics: Some(MetricSnapshot {
            subject: "examplechain".into(),
            captured_at: Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap(),
            tvl_usd: Some(1_234_567.0),
            tvl_change_24h: Some(2.5),
            tvl_change_7d: Some(-1.25),
            tx_count_24h: Some(45_000),
            active_addresses: None,
            volume_24h_usd: None,
            fees_24h_usd: None,
        }),
    }
}

#[test]
fn identical_inputs_yield_byte_identical_prompts() {
    let a = build(&profile(), &input(), 5, &settings());
    let b = build(&profile(), &input(), 5, &settings());
    assert_eq!(a, b);
}

#[test]
fn system_prompt_encodes_rules_samples_and_avoid_list() {
    let p = build(&profile(), &input(), 5, &settings());
    assert!(p.system.contains("@examplechain"));
    assert!(p.system.contains("exactly 5 posts"));
    assert!(p.system.contains("at most 280 characters"));
    assert!(p.system.contains("JSON array"));
    assert!(p.system.contains("revolutionary"));
    assert!(p.system.contains("gm. numbers first, vibes second."));
    assert!(p.system.contains("#examplechain"));
}

#[test]
fn user_prompt_renders_all_present_categories() {
    let p = build(&profile(), &input(), 5, &settings());
    assert!(p.user.contains("Rollup upgrade live"));
    assert!(p.user.contains("https://example.com/upgrade"));
    assert!(p.user.contains("@devone"));
    assert!(p.user.contains("benchmarks look great"));
    // thousands-separated integers, signed deltas
    assert!(p.user.contains("$1,234,567"));
    assert!(p.user.contains("45,000"));
    assert!(p.user.contains("+2.5% 24h"));
    assert!(p.user.contains("-1.2% 7d") || p.user.contains("-1.3% 7d"));
}

#[test]
fn empty_input_falls_back_to_general_knowledge_instruction() {
    let p = build(&profile(), &GenerationInput::default(), 3, &settings());
    assert!(p.user.contains("general knowledge"));
    assert!(!p.user.contains("Today's source data"));
}

#[test]
fn absent_categories_are_omitted_from_rendering() {
    let only_news = GenerationInput {
        news: input().news,
        social: None,
        metrics: None,
    };
    let p = build(&profile(), &only_news, 5, &settings());
    assert!(p.user.contains("News:"));
    assert!(!p.user.contains("watched accounts"));
    assert!(!p.user.contains("On-chain metrics"));
}
