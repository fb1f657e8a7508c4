//! Batchsync core: pure batch-job sync state machine and view-model helpers.
mod cache;
mod effect;
mod error;
mod history;
mod job;
mod msg;
mod notifications;
mod poll;
mod state;
mod transition;
mod update;
mod validate;
mod view_model;

pub use cache::{CacheEntry, CacheKey, CachedValue, Completion, FetchTicket, StatusCache};
pub use effect::{Effect, Notice};
pub use error::{friendly_message, ApiError};
pub use history::{merge_history, HistoryItem, HistoryRow, TranslationHistory, MAX_HISTORY_ITEMS};
pub use job::{
    parse_timestamp, sort_newest_first, AckResult, BoundingBox, ItemId, ItemResult, ItemStatus,
    Job, JobCounts, JobCreatedSummary, JobId, JobStatus, TextRegion, TranslateResult,
    TranslationOutput,
};
pub use msg::Msg;
pub use notifications::{
    NewNotification, NotificationEntry, NotificationId, NotificationSink, Severity,
    DEFAULT_NOTIFICATION_LIMIT,
};
pub use poll::PollPolicy;
pub use state::SyncState;
pub use transition::{TransitionDetector, TransitionEvent};
pub use update::update;
pub use validate::{
    language_name, validate_batch, validate_file, validate_single, TranslateOptions, UploadFile,
    ALLOWED_EXTENSIONS, MAX_BATCH_SIZE, MAX_FILE_SIZE_BYTES, MAX_TARGET_LANGUAGES,
    SUPPORTED_LANGUAGES,
};
pub use view_model::{JobRowView, ListView, NotificationView, SyncViewModel};
