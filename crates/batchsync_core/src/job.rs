use std::cmp::Reverse;
use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

pub type JobId = String;
pub type ItemId = String;

/// Server-side lifecycle of a batch.
///
/// The wire names are the backend's; the aliases accept the shorter names
/// some deployments report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[serde(rename = "pending", alias = "queued")]
    Queued,
    #[serde(rename = "processing", alias = "running")]
    Running,
    #[serde(rename = "completed", alias = "done")]
    Done,
    #[serde(rename = "partially_completed", alias = "done_with_errors")]
    DoneWithErrors,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Queued | JobStatus::Running)
    }

    pub fn label(self) -> &'static str {
        match self {
            JobStatus::Queued => "Pending",
            JobStatus::Running => "Processing",
            JobStatus::Done => "Completed",
            JobStatus::DoneWithErrors => "Partially Completed",
            JobStatus::Failed => "Failed",
            JobStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    #[serde(rename = "processing", alias = "running")]
    Running,
    #[serde(rename = "completed", alias = "done")]
    Done,
    Failed,
}

impl ItemStatus {
    pub fn is_settled(self) -> bool {
        matches!(self, ItemStatus::Done | ItemStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationOutput {
    pub target_lang: String,
    #[serde(default)]
    pub translated_image_url: Option<String>,
    pub status: ItemStatus,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemResult {
    #[serde(rename = "image_id")]
    pub id: ItemId,
    pub original_filename: String,
    pub status: ItemStatus,
    #[serde(default)]
    pub original_image_url: Option<String>,
    #[serde(default)]
    pub translations: Vec<TranslationOutput>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ItemResult {
    /// An item may only be reported done when every requested language has a
    /// completed output.
    pub fn is_consistent_with(&self, target_languages: &[String]) -> bool {
        if self.status != ItemStatus::Done {
            return true;
        }
        target_languages.iter().all(|lang| {
            self.translations
                .iter()
                .any(|t| &t.target_lang == lang && t.status == ItemStatus::Done)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JobCounts {
    pub completed: u32,
    pub failed: u32,
    pub total: u32,
}

impl JobCounts {
    pub fn settled(&self) -> u32 {
        self.completed.saturating_add(self.failed)
    }

    pub fn remaining(&self) -> u32 {
        self.total.saturating_sub(self.settled())
    }

    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let total = u64::from(self.total);
        let pct = (u64::from(self.settled()) * 100 + total / 2) / total;
        pct.min(100) as u8
    }
}

/// Full status snapshot of a batch as returned by the status and list endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    #[serde(rename = "batch_id")]
    pub id: JobId,
    pub status: JobStatus,
    #[serde(rename = "total_images")]
    pub total_count: u32,
    #[serde(default)]
    pub target_languages: Vec<String>,
    pub completed_count: u32,
    pub failed_count: u32,
    #[serde(default)]
    pub pending_count: u32,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default, rename = "images")]
    pub items: Vec<ItemResult>,
}

impl Job {
    pub fn counts(&self) -> JobCounts {
        JobCounts {
            completed: self.completed_count,
            failed: self.failed_count,
            total: self.total_count,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Checks the count invariants the server is expected to uphold.
    ///
    /// Settled counts never exceed the total, and the job is terminal exactly
    /// when nothing is left to process.
    pub fn is_consistent(&self) -> bool {
        let counts = self.counts();
        if counts.settled() > counts.total {
            return false;
        }
        self.status.is_terminal() == (counts.remaining() == 0)
    }

    pub fn progress_line(&self) -> String {
        let counts = self.counts();
        if self.is_terminal() {
            format!("{} of {} completed", counts.completed, counts.total)
        } else {
            format!("Processing {} of {} images...", counts.settled(), counts.total)
        }
    }

    pub fn item(&self, item_id: &str) -> Option<&ItemResult> {
        self.items.iter().find(|item| item.id == item_id)
    }
}

/// Parses a wire timestamp. RFC 3339 with any offset is accepted, and so is
/// a bare `YYYY-MM-DDTHH:MM:SS[.fff]`, which is read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(stamp.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Sorts jobs newest first; the list endpoint does not guarantee an order.
/// Jobs with an unreadable `created_at` go last.
pub fn sort_newest_first(jobs: &mut [Job]) {
    jobs.sort_by_cached_key(|job| Reverse(parse_timestamp(&job.created_at)));
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCreatedSummary {
    #[serde(rename = "batch_id")]
    pub id: JobId,
    pub status: JobStatus,
    #[serde(rename = "total_images")]
    pub total_count: u32,
    #[serde(default)]
    pub target_languages: Vec<String>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRegion {
    pub id: String,
    pub original_text: String,
    pub translated_text: String,
    pub bounding_box: BoundingBox,
    pub confidence: f64,
}

/// Result of the synchronous single-image translate call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslateResult {
    pub original_image_url: String,
    pub translated_image_url: String,
    #[serde(default)]
    pub clean_image_url: Option<String>,
    #[serde(default)]
    pub mask_url: Option<String>,
    #[serde(default)]
    pub regions: Vec<TextRegion>,
    pub target_lang: String,
    #[serde(default)]
    pub processing_time_ms: u64,
}
