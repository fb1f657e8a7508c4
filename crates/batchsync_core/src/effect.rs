use std::time::Duration;

use crate::{CacheKey, FetchTicket, NotificationId, Severity, TransitionEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Call the remote accessor for the ticket's key.
    Fetch(FetchTicket),
    /// Fire `Msg::PollDue(key)` after `delay`, replacing any pending timer for the key.
    SchedulePoll { key: CacheKey, delay: Duration },
    /// Drop the pending timer for `key`, if any.
    CancelPoll(CacheKey),
    /// The cached entry for `key` changed; views should re-render.
    CacheUpdated(CacheKey),
    /// Present a transition to the user. The entry is already in the sink.
    Notify(Notice),
    /// A fetch failed in a way the user should hear about.
    ReportError {
        key: CacheKey,
        message: String,
        transient: bool,
        /// No further poll is scheduled for `key` after this failure.
        polling_stopped: bool,
    },
    /// Notification list changed.
    NotificationsChanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub notification_id: NotificationId,
    pub event: TransitionEvent,
    pub message: String,
    pub severity: Severity,
}
