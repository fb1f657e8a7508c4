use batchsync_core::{CacheKey, Notice};

/// Change notifications broadcast by the sync runner to views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    CacheUpdated(CacheKey),
    Transition(Notice),
    FetchFailed {
        key: CacheKey,
        message: String,
        transient: bool,
        /// The key will not be polled again until refreshed or resubscribed.
        polling_stopped: bool,
    },
    NotificationsChanged,
}

impl SyncEvent {
    /// The cache key the event is about, if any.
    pub fn key(&self) -> Option<&CacheKey> {
        match self {
            SyncEvent::CacheUpdated(key) | SyncEvent::FetchFailed { key, .. } => Some(key),
            SyncEvent::Transition(_) | SyncEvent::NotificationsChanged => None,
        }
    }
}
