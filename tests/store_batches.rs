use std::fs;
use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use postsmith::model::{Draft, GenerationInput, SourceKind};
use postsmith::store::OutputStore;

fn temp_store(name: &str) -> (OutputStore, PathBuf) {
    let dir = std::env::temp_dir().join(format!("postsmith-{name}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    (OutputStore::new(dir.clone()), dir)
}

fn draft(id: &str, content: &str) -> Draft {
    Draft {
        id: id.to_string(),
        content: content.to_string(),
        source: SourceKind::Mixed,
        context: String::new(),
        confidence: 0.5,
        created_at: Utc::now(),
        metadata: None,
        source_items: None,
    }
}

#[test]
fn cold_start_load_is_empty_not_an_error() {
    let (store, dir) = temp_store("cold");
    assert!(store.load_all().is_empty());
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn same_day_save_overwrites_previous_batch() {
    let (store, dir) = temp_store("overwrite");
    let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

    store
        .save_for_date(date, vec![draft("a", "first run")], GenerationInput::default())
        .expect("first save");
    store
        .save_for_date(date, vec![draft("b", "second run")], GenerationInput::default())
        .expect("second save");

    let batches = store.load_all();
    assert_eq!(batches.len(), 1, "one batch per calendar date");
    assert_eq!(batches[0].drafts.len(), 1);
    assert_eq!(batches[0].drafts[0].content, "second run");
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn load_all_orders_most_recent_first() {
    let (store, dir) = temp_store("order");
    for (y, m, d) in [(2025, 5, 30), (2025, 6, 2), (2025, 6, 1)] {
        let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        store
            .save_for_date(date, vec![draft("x", "c")], GenerationInput::default())
            .expect("save");
    }

    let dates: Vec<_> = store.load_all().into_iter().map(|b| b.date).collect();
    assert_eq!(
        dates,
        vec![
            NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 5, 30).unwrap(),
        ]
    );
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn corrupt_batch_is_skipped_not_fatal() {
    let (store, dir) = temp_store("corrupt");
    let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    store
        .save_for_date(date, vec![draft("a", "fine")], GenerationInput::default())
        .expect("save");
    fs::write(dir.join("batch-2025-06-02.json"), "{ not json").expect("write corrupt file");

    let batches = store.load_all();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].date, date);
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn update_draft_content_edits_in_place() {
    let (store, dir) = temp_store("update");
    let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    store
        .save_for_date(
            date,
            vec![draft("keep", "original"), draft("edit", "before")],
            GenerationInput::default(),
        )
        .expect("save");

    assert!(store.update_draft_content(date, "edit", "after").expect("update"));
    assert!(!store.update_draft_content(date, "missing", "x").expect("no-op"));

    let batch = store.load(date).expect("load").expect("present");
    assert_eq!(batch.drafts[0].content, "original");
    assert_eq!(batch.drafts[1].content, "after");
    let _ = fs::remove_dir_all(dir);
}
