use std::collections::HashMap;
use std::sync::Arc;

use batchsync_core::{
    update, AckResult, ApiError, CacheKey, CachedValue, Effect, FetchTicket, Job,
    JobCreatedSummary, Msg, NotificationId, SyncState, SyncViewModel, TranslateOptions,
    UploadFile,
};
use sync_logging::{sync_debug, sync_trace};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::notifier::{present, Notifier};
use crate::{JobApi, SyncEvent};

const EVENT_CAPACITY: usize = 64;

/// Produces the timestamp stamped on fetched values and notifications.
pub type Clock = Arc<dyn Fn() -> String + Send + Sync>;

pub fn utc_clock() -> Clock {
    Arc::new(|| chrono::Utc::now().to_rfc3339())
}

enum Command {
    Msg(Msg),
    View(oneshot::Sender<SyncViewModel>),
    Value(CacheKey, oneshot::Sender<Option<CachedValue>>),
}

/// Handle to the sync loop.
///
/// All state lives on one task; fetches and timers run as separate tasks and
/// report back as messages, so there is never more than one writer.
#[derive(Clone)]
pub struct SyncHandle {
    cmd_tx: mpsc::UnboundedSender<Command>,
    events: broadcast::Sender<SyncEvent>,
    api: Arc<dyn JobApi>,
    shutdown: CancellationToken,
}

/// Keeps `key` subscribed until dropped.
pub struct Subscription {
    key: CacheKey,
    cmd_tx: mpsc::UnboundedSender<Command>,
}

impl Subscription {
    pub fn key(&self) -> &CacheKey {
        &self.key
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(Command::Msg(Msg::Unsubscribe(self.key.clone())));
    }
}

impl SyncHandle {
    /// Starts the sync loop on the current tokio runtime.
    pub fn spawn(
        state: SyncState,
        api: Arc<dyn JobApi>,
        notifier: Arc<dyn Notifier>,
        clock: Clock,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let shutdown = CancellationToken::new();

        let runner = Runner {
            api: api.clone(),
            notifier,
            clock,
            events: events.clone(),
            timers: HashMap::new(),
        };
        tokio::spawn(runner.run(state, cmd_rx, shutdown.clone()));

        Self {
            cmd_tx,
            events,
            api,
            shutdown,
        }
    }

    fn send(&self, msg: Msg) {
        let _ = self.cmd_tx.send(Command::Msg(msg));
    }

    pub fn subscribe(&self, key: CacheKey) -> Subscription {
        self.send(Msg::Subscribe(key.clone()));
        Subscription {
            key,
            cmd_tx: self.cmd_tx.clone(),
        }
    }

    pub fn subscribe_job(&self, job_id: impl Into<String>) -> Subscription {
        self.subscribe(CacheKey::Job(job_id.into()))
    }

    pub fn subscribe_list(&self) -> Subscription {
        self.subscribe(CacheKey::JobList)
    }

    pub fn refresh(&self, key: CacheKey) {
        self.send(Msg::Refresh(key));
    }

    pub fn events(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    pub async fn view(&self) -> Option<SyncViewModel> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx.send(Command::View(tx)).ok()?;
        rx.await.ok()
    }

    pub async fn value(&self, key: CacheKey) -> Option<CachedValue> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx.send(Command::Value(key, tx)).ok()?;
        rx.await.ok().flatten()
    }

    pub fn mark_read(&self, id: NotificationId) {
        self.send(Msg::MarkRead(id));
    }

    pub fn mark_all_read(&self) {
        self.send(Msg::MarkAllRead);
    }

    pub fn clear_notifications(&self) {
        self.send(Msg::ClearNotifications);
    }

    pub async fn create_job(
        &self,
        files: &[UploadFile],
        target_languages: &[String],
        options: &TranslateOptions,
    ) -> Result<JobCreatedSummary, ApiError> {
        let summary = self.api.create(files, target_languages, options).await?;
        self.refresh(CacheKey::JobList);
        Ok(summary)
    }

    pub async fn cancel_job(&self, job_id: &str) -> Result<Job, ApiError> {
        let job = self.api.cancel(job_id).await?;
        self.refresh(CacheKey::Job(job_id.to_string()));
        self.refresh(CacheKey::JobList);
        Ok(job)
    }

    pub async fn retry_item(&self, job_id: &str, item_id: &str) -> Result<AckResult, ApiError> {
        let ack = self.api.retry_item(job_id, item_id).await?;
        self.refresh(CacheKey::Job(job_id.to_string()));
        self.refresh(CacheKey::JobList);
        Ok(ack)
    }

    /// Stops the loop and every pending timer. Outstanding fetches finish but
    /// their results are dropped.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

struct Runner {
    api: Arc<dyn JobApi>,
    notifier: Arc<dyn Notifier>,
    clock: Clock,
    events: broadcast::Sender<SyncEvent>,
    timers: HashMap<CacheKey, JoinHandle<()>>,
}

impl Runner {
    async fn run(
        mut self,
        mut state: SyncState,
        mut cmd_rx: mpsc::UnboundedReceiver<Command>,
        shutdown: CancellationToken,
    ) {
        let (internal_tx, mut internal_rx) = mpsc::unbounded_channel::<Msg>();
        loop {
            let msg = tokio::select! {
                _ = shutdown.cancelled() => break,
                msg = internal_rx.recv() => match msg {
                    Some(msg) => msg,
                    None => break,
                },
                cmd = cmd_rx.recv() => match cmd {
                    Some(Command::Msg(msg)) => msg,
                    Some(Command::View(reply)) => {
                        let _ = reply.send(state.view());
                        continue;
                    }
                    Some(Command::Value(key, reply)) => {
                        let _ = reply.send(state.cache().value(&key).cloned());
                        continue;
                    }
                    None => break,
                },
            };
            sync_trace!("Sync loop handling {:?}", msg);
            let (next, effects) = update(state, msg);
            state = next;
            for effect in effects {
                self.execute(effect, &internal_tx);
            }
        }

        for (_, timer) in self.timers.drain() {
            timer.abort();
        }
        sync_debug!("Sync loop stopped");
    }

    fn execute(&mut self, effect: Effect, internal_tx: &mpsc::UnboundedSender<Msg>) {
        match effect {
            Effect::Fetch(ticket) => self.spawn_fetch(ticket, internal_tx.clone()),
            Effect::SchedulePoll { key, delay } => {
                if let Some(previous) = self.timers.remove(&key) {
                    previous.abort();
                }
                let tx = internal_tx.clone();
                let timer_key = key.clone();
                let handle = tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(Msg::PollDue(timer_key));
                });
                self.timers.insert(key, handle);
            }
            Effect::CancelPoll(key) => {
                if let Some(timer) = self.timers.remove(&key) {
                    timer.abort();
                }
            }
            Effect::CacheUpdated(key) => {
                let _ = self.events.send(SyncEvent::CacheUpdated(key));
            }
            Effect::Notify(notice) => {
                let delivery = present(self.notifier.as_ref(), &notice);
                sync_debug!(
                    "Notice {} delivered (desktop: {})",
                    notice.notification_id,
                    delivery.desktop
                );
                let _ = self.events.send(SyncEvent::Transition(notice));
            }
            Effect::ReportError {
                key,
                message,
                transient,
                polling_stopped,
            } => {
                if !transient {
                    self.notifier.error_toast(&message);
                }
                let _ = self.events.send(SyncEvent::FetchFailed {
                    key,
                    message,
                    transient,
                    polling_stopped,
                });
            }
            Effect::NotificationsChanged => {
                let _ = self.events.send(SyncEvent::NotificationsChanged);
            }
        }
    }

    fn spawn_fetch(&self, ticket: FetchTicket, tx: mpsc::UnboundedSender<Msg>) {
        let api = self.api.clone();
        let clock = self.clock.clone();
        tokio::spawn(async move {
            let result = match &ticket.key {
                CacheKey::Job(id) => api.get_status(id).await.map(CachedValue::Job),
                CacheKey::JobList => api.list().await.map(CachedValue::List),
            };
            let _ = tx.send(Msg::FetchResolved {
                ticket,
                result,
                received_at: clock(),
            });
        });
    }
}
