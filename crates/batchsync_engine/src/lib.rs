//! Batchsync engine: HTTP job accessor, sync loop and the on-device history store.
mod api;
mod credentials;
mod engine;
mod history_store;
mod notifier;
mod types;

pub use api::{ClientSettings, JobApi, ReqwestJobApi};
pub use credentials::{AuthTokens, Credentials};
pub use engine::{utc_clock, Clock, Subscription, SyncHandle};
pub use history_store::{HistoryStore, HistoryStoreError};
pub use notifier::{present, DesktopPermission, Delivery, LogNotifier, Notifier};
pub use types::SyncEvent;
