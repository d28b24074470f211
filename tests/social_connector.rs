use std::time::Duration;

use chrono::Utc;
use postsmith::error::FetchError;
use postsmith::sources::social::SocialConnector;
use postsmith::sources::types::{SocialPost, SourceConnector, SourceItem};

fn post(id: &str, minutes_ago: i64) -> SocialPost {
    SocialPost {
        id: id.to_string(),
        author_name: "Dev One".into(),
        author_handle: "@devone".into(),
        text: format!("update {id}"),
        posted_at: Utc::now() - chrono::Duration::minutes(minutes_ago),
        engagement: None,
    }
}

#[tokio::test]
async fn missing_bearer_token_is_the_credential_failure_kind() {
    let connector = SocialConnector::new(
        vec!["devone".into()],
        None,
        Duration::ZERO,
    );
    let err = connector.fetch().await.unwrap_err();
    assert!(matches!(err, FetchError::MissingCredential(_)), "{err:?}");
}

#[tokio::test]
async fn empty_token_counts_as_missing() {
    let connector = SocialConnector::from_fixture(vec![post("1", 5)], Some(String::new()));
    let err = connector.fetch().await.unwrap_err();
    assert!(matches!(err, FetchError::MissingCredential(_)), "{err:?}");
}

#[tokio::test]
async fn empty_timeline_is_a_failure_unlike_news() {
    let connector = SocialConnector::from_fixture(Vec::new(), Some("token".into()));
    let err = connector.fetch().await.unwrap_err();
    assert!(matches!(err, FetchError::NoData { source: "social" }), "{err:?}");
}

#[tokio::test]
async fn posts_come_back_newest_first() {
    let connector = SocialConnector::from_fixture(
        vec![post("old", 60), post("new", 1), post("mid", 30)],
        Some("token".into()),
    );
    let items = connector.fetch().await.expect("fetch ok");
    let ids: Vec<String> = items
        .iter()
        .map(|it| match it {
            SourceItem::Social(p) => p.id.clone(),
            _ => panic!("expected social posts"),
        })
        .collect();
    assert_eq!(ids, vec!["new", "mid", "old"]);
}
