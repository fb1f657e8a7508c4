use crate::{
    friendly_message, CacheKey, CachedValue, Job, JobStatus, NotificationId, Severity, SyncState,
};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncViewModel {
    pub jobs: Vec<JobRowView>,
    pub list: Option<ListView>,
    pub notifications: Vec<NotificationView>,
    pub unread: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRowView {
    pub job_id: String,
    pub status: Option<JobStatus>,
    pub progress_line: String,
    pub percent: u8,
    pub failed: u32,
    pub fetching: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListView {
    pub jobs: Vec<JobRowView>,
    pub fetching: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationView {
    pub id: NotificationId,
    pub message: String,
    pub href: String,
    pub severity: Severity,
    pub read: bool,
}

fn row(job: &Job, fetching: bool, error: Option<String>) -> JobRowView {
    JobRowView {
        job_id: job.id.clone(),
        status: Some(job.status),
        progress_line: job.progress_line(),
        percent: job.counts().percent(),
        failed: job.failed_count,
        fetching,
        error,
    }
}

impl SyncViewModel {
    pub(crate) fn build(state: &SyncState) -> Self {
        let mut view = SyncViewModel::default();
        for key in state.cache.keys() {
            let Some(entry) = state.cache.entry(key) else {
                continue;
            };
            let error = entry.last_error().map(|err| friendly_message(err, None));
            match (key, entry.value()) {
                (CacheKey::Job(_), Some(CachedValue::Job(job))) => {
                    view.jobs.push(row(job, entry.is_fetching(), error));
                }
                (CacheKey::Job(id), _) => view.jobs.push(JobRowView {
                    job_id: id.clone(),
                    status: None,
                    progress_line: "Loading...".to_string(),
                    percent: 0,
                    failed: 0,
                    fetching: entry.is_fetching(),
                    error,
                }),
                (CacheKey::JobList, value) => {
                    let mut jobs = match value {
                        Some(CachedValue::List(jobs)) => jobs.clone(),
                        _ => Vec::new(),
                    };
                    crate::sort_newest_first(&mut jobs);
                    view.list = Some(ListView {
                        jobs: jobs.iter().map(|job| row(job, false, None)).collect(),
                        fetching: entry.is_fetching(),
                        error,
                    });
                }
            }
        }
        view.notifications = state
            .notifications
            .entries()
            .map(|entry| NotificationView {
                id: entry.id,
                message: entry.message.clone(),
                href: entry.href.clone(),
                severity: entry.severity,
                read: entry.is_read(),
            })
            .collect();
        view.unread = state.notifications.unread_count();
        view
    }
}
