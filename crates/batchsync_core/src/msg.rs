use crate::{ApiError, CacheKey, CachedValue, FetchTicket, NotificationId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// A view started showing `key`.
    Subscribe(CacheKey),
    /// A view showing `key` went away.
    Unsubscribe(CacheKey),
    /// The poll timer for `key` fired.
    PollDue(CacheKey),
    /// User or a mutation asked for fresh data regardless of timers.
    Refresh(CacheKey),
    /// A fetch issued earlier came back.
    FetchResolved {
        ticket: FetchTicket,
        result: Result<CachedValue, ApiError>,
        received_at: String,
    },
    MarkRead(NotificationId),
    MarkAllRead,
    ClearNotifications,
}
