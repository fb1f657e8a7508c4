use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{JobStatus, TransitionEvent};

pub type NotificationId = u64;

pub const DEFAULT_NOTIFICATION_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Error,
    Info,
    Warning,
}

impl Severity {
    pub fn for_status(status: JobStatus) -> Self {
        match status {
            JobStatus::Done => Severity::Success,
            JobStatus::DoneWithErrors => Severity::Warning,
            JobStatus::Failed => Severity::Error,
            JobStatus::Cancelled | JobStatus::Queued | JobStatus::Running => Severity::Info,
        }
    }
}

/// Fields supplied by the caller; the sink assigns the id and read flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub message: String,
    pub href: String,
    pub severity: Severity,
    pub created_at: String,
}

impl NewNotification {
    pub fn for_transition(event: &TransitionEvent, created_at: impl Into<String>) -> Self {
        Self {
            message: event.summary(),
            href: format!("/batch?id={}", event.job_id),
            severity: Severity::for_status(event.to),
            created_at: created_at.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEntry {
    pub id: NotificationId,
    pub message: String,
    pub href: String,
    pub severity: Severity,
    pub created_at: String,
    read: bool,
}

impl NotificationEntry {
    pub fn is_read(&self) -> bool {
        self.read
    }
}

/// Bounded, newest-first list of user-visible notifications.
///
/// Entries only ever move from unread to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationSink {
    entries: VecDeque<NotificationEntry>,
    limit: usize,
    next_id: NotificationId,
}

impl Default for NotificationSink {
    fn default() -> Self {
        Self::with_limit(DEFAULT_NOTIFICATION_LIMIT)
    }
}

impl NotificationSink {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit),
            limit,
            next_id: 1,
        }
    }

    pub fn push(&mut self, notification: NewNotification) -> NotificationId {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push_front(NotificationEntry {
            id,
            message: notification.message,
            href: notification.href,
            severity: notification.severity,
            created_at: notification.created_at,
            read: false,
        });
        self.entries.truncate(self.limit);
        id
    }

    pub fn mark_read(&mut self, id: NotificationId) {
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.id == id) {
            entry.read = true;
        }
    }

    pub fn mark_all_read(&mut self) {
        for entry in &mut self.entries {
            entry.read = true;
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> impl Iterator<Item = &NotificationEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn unread_count(&self) -> usize {
        self.entries.iter().filter(|entry| !entry.read).count()
    }
}
