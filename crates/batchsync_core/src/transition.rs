use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sync_logging::sync_debug;

use crate::{parse_timestamp, Job, JobCounts, JobId, JobStatus};

/// A job observed moving from in-progress into a terminal status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionEvent {
    pub job_id: JobId,
    pub from: JobStatus,
    pub to: JobStatus,
    pub counts: JobCounts,
}

impl TransitionEvent {
    /// One-line summary used by toasts and the notification list.
    pub fn summary(&self) -> String {
        let JobCounts {
            completed,
            failed,
            total,
        } = self.counts;
        match self.to {
            JobStatus::Done => format!("Batch complete: {completed}/{total} images translated"),
            JobStatus::DoneWithErrors => format!(
                "Batch finished with errors: {completed}/{total} images translated, {failed} failed"
            ),
            JobStatus::Failed => format!("Batch failed: {failed}/{total} images failed"),
            JobStatus::Cancelled => {
                format!("Batch cancelled: {completed}/{total} images translated")
            }
            JobStatus::Queued | JobStatus::Running => {
                format!("Batch {}: {completed}/{total}", self.to)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Seen {
    status: JobStatus,
    updated_at: Option<DateTime<Utc>>,
}

impl Seen {
    fn of(job: &Job) -> Self {
        Self {
            status: job.status,
            updated_at: parse_timestamp(&job.updated_at),
        }
    }

    /// True when `next` is an older snapshot than `self`.
    ///
    /// Job and list responses are only ordered within their own cache key,
    /// so a list fetched before a job finished can arrive after the job
    /// response that showed it finished.
    fn is_ahead_of(&self, next: &Seen) -> bool {
        match (self.updated_at, next.updated_at) {
            (Some(seen), Some(next_at)) if next_at != seen => next_at < seen,
            // Same instant or no usable timestamp: a finished job does not
            // reopen without the server touching it.
            _ => self.status.is_terminal() && !next.status.is_terminal(),
        }
    }
}

/// Remembers the last status seen per job and reports each live edge into a
/// terminal status exactly once.
///
/// A job that is already terminal the first time it is seen never produces
/// an event, so reloading after completion stays quiet. Snapshots older than
/// the one already seen are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransitionDetector {
    last_seen: HashMap<JobId, Seen>,
}

impl TransitionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_seen(&self, job_id: &str) -> Option<JobStatus> {
        self.last_seen.get(job_id).map(|seen| seen.status)
    }

    pub fn observe(&mut self, job: &Job) -> Option<TransitionEvent> {
        let next = Seen::of(job);
        let previous = match self.last_seen.get(&job.id) {
            Some(previous) if previous.is_ahead_of(&next) => {
                sync_debug!(
                    "Ignoring older snapshot of {} ({} at {})",
                    job.id,
                    job.status,
                    job.updated_at
                );
                return None;
            }
            Some(previous) => previous.status,
            None => {
                self.last_seen.insert(job.id.clone(), next);
                return None;
            }
        };
        self.last_seen.insert(job.id.clone(), next);

        if !previous.is_terminal() && job.status.is_terminal() {
            Some(TransitionEvent {
                job_id: job.id.clone(),
                from: previous,
                to: job.status,
                counts: job.counts(),
            })
        } else {
            None
        }
    }

    pub fn reset(&mut self) {
        self.last_seen.clear();
    }
}
