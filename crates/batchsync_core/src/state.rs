use crate::view_model::SyncViewModel;
use crate::{NotificationSink, PollPolicy, StatusCache, TransitionDetector};

/// Everything the sync pipeline remembers between messages.
///
/// Owned by a single driver; there is no ambient instance.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncState {
    pub(crate) cache: StatusCache,
    pub(crate) detector: TransitionDetector,
    pub(crate) notifications: NotificationSink,
    pub(crate) policy: PollPolicy,
    dirty: bool,
}

impl SyncState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: PollPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn with_notifications(mut self, notifications: NotificationSink) -> Self {
        self.notifications = notifications;
        self
    }

    pub fn cache(&self) -> &StatusCache {
        &self.cache
    }

    pub fn detector(&self) -> &TransitionDetector {
        &self.detector
    }

    pub fn notifications(&self) -> &NotificationSink {
        &self.notifications
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    pub fn view(&self) -> SyncViewModel {
        SyncViewModel::build(self)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns whether anything visible changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
