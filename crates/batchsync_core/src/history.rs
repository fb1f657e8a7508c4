use std::cmp::Reverse;
use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{parse_timestamp, Job, JobId, JobStatus, TranslateResult};

pub const MAX_HISTORY_ITEMS: usize = 50;

/// One synchronous single-image translation kept on the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: String,
    pub timestamp: String,
    pub target_lang: String,
    pub result: TranslateResult,
}

/// Newest-first record of single-image translations, capped at
/// [`MAX_HISTORY_ITEMS`]. Batch jobs are never stored here.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TranslationHistory {
    items: VecDeque<HistoryItem>,
}

impl TranslationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a history from persisted items, re-applying the cap.
    pub fn from_items(items: Vec<HistoryItem>) -> Self {
        let mut items = VecDeque::from(items);
        items.truncate(MAX_HISTORY_ITEMS);
        Self { items }
    }

    pub fn add(&mut self, item: HistoryItem) {
        self.items.push_front(item);
        self.items.truncate(MAX_HISTORY_ITEMS);
    }

    pub fn items(&self) -> impl Iterator<Item = &HistoryItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A row of the combined history view.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryRow {
    Single {
        timestamp: String,
        target_lang: String,
        translated_image_url: String,
    },
    Batch {
        timestamp: String,
        job_id: JobId,
        status: JobStatus,
        target_languages: Vec<String>,
        completed: u32,
        total: u32,
    },
}

impl HistoryRow {
    pub fn timestamp(&self) -> &str {
        match self {
            HistoryRow::Single { timestamp, .. } | HistoryRow::Batch { timestamp, .. } => timestamp,
        }
    }
}

/// Merges local single translations with server-side batches, newest first.
pub fn merge_history(singles: &TranslationHistory, batches: &[Job]) -> Vec<HistoryRow> {
    let mut rows: Vec<HistoryRow> = singles
        .items()
        .map(|item| HistoryRow::Single {
            timestamp: item.timestamp.clone(),
            target_lang: item.target_lang.clone(),
            translated_image_url: item.result.translated_image_url.clone(),
        })
        .chain(batches.iter().map(|job| HistoryRow::Batch {
            timestamp: job.created_at.clone(),
            job_id: job.id.clone(),
            status: job.status,
            target_languages: job.target_languages.clone(),
            completed: job.completed_count,
            total: job.total_count,
        }))
        .collect();
    rows.sort_by_cached_key(|row| Reverse(parse_timestamp(row.timestamp())));
    rows
}
