// src/store.rs
//! Output store: one JSON batch document per calendar date.
//!
//! Saving twice for the same date overwrites; "today's drafts" stays
//! singular. A missing storage directory on load is the expected cold-start
//! state and yields an empty result.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use tracing::warn;

use crate::error::StoreError;
use crate::model::{Batch, Draft, GenerationInput};

pub struct OutputStore {
    dir: PathBuf,
}

impl OutputStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    fn batch_path(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("batch-{}.json", date.format("%Y-%m-%d")))
    }

    /// Persist a batch for today. Returns the file written.
    pub fn save(&self, drafts: Vec<Draft>, input: GenerationInput) -> Result<PathBuf, StoreError> {
        self.save_for_date(Utc::now().date_naive(), drafts, input)
    }

    pub fn save_for_date(
        &self,
        date: NaiveDate,
        drafts: Vec<Draft>,
        input: GenerationInput,
    ) -> Result<PathBuf, StoreError> {
        let batch = Batch {
            date,
            generated_at: Utc::now(),
            drafts,
            input,
        };

        fs::create_dir_all(&self.dir).map_err(|e| StoreError::Write {
            path: self.dir.display().to_string(),
            cause: e,
        })?;

        let path = self.batch_path(date);
        let json = serde_json::to_string_pretty(&batch).map_err(|e| StoreError::Corrupt {
            path: path.display().to_string(),
            cause: e,
        })?;

        // Write via tmp + rename so a crash never leaves a half-written batch.
        let tmp = path.with_extension("json.tmp");
        let write = |p: &Path| -> std::io::Result<()> {
            let mut f = fs::File::create(p)?;
            f.write_all(json.as_bytes())
        };
        write(&tmp)
            .and_then(|_| fs::rename(&tmp, &path))
            .map_err(|e| StoreError::Write {
                path: path.display().to_string(),
                cause: e,
            })?;
        Ok(path)
    }

    /// Load a single date's batch, if present.
    pub fn load(&self, date: NaiveDate) -> Result<Option<Batch>, StoreError> {
        let path = self.batch_path(date);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(read_batch(&path)?))
    }

    /// All available batches, most recent first. Files that fail to parse are
    /// logged and skipped so one corrupt day never hides the rest.
    pub fn load_all(&self) -> Vec<Batch> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(e) => e,
            Err(_) => return Vec::new(), // cold start
        };

        let mut batches: Vec<Batch> = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let is_batch = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("batch-") && n.ends_with(".json"));
            if !is_batch {
                continue;
            }
            match read_batch(&path) {
                Ok(b) => batches.push(b),
                Err(e) => warn!(error = ?e, path = %path.display(), "skipping unreadable batch"),
            }
        }
        batches.sort_by(|a, b| b.date.cmp(&a.date));
        batches
    }

    /// Replace one draft's content in its stored batch (accepted revision or
    /// manual edit). Returns false when the draft id is not found.
    pub fn update_draft_content(
        &self,
        date: NaiveDate,
        draft_id: &str,
        content: &str,
    ) -> Result<bool, StoreError> {
        let Some(mut batch) = self.load(date)? else {
            return Ok(false);
        };
        let Some(draft) = batch.drafts.iter_mut().find(|d| d.id == draft_id) else {
            return Ok(false);
        };
        draft.content = content.to_string();
        self.save_for_date(date, batch.drafts, batch.input)?;
        Ok(true)
    }
}

fn read_batch(path: &Path) -> Result<Batch, StoreError> {
    let data = fs::read_to_string(path).map_err(|e| StoreError::Read {
        path: path.display().to_string(),
        cause: e,
    })?;
    serde_json::from_str(&data).map_err(|e| StoreError::Corrupt {
        path: path.display().to_string(),
        cause: e,
    })
}
