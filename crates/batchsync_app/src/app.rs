use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use batchsync_core::{
    friendly_message, merge_history, ApiError, CacheKey, CachedValue, HistoryItem,
    SyncState, TranslateOptions, UploadFile,
};
use batchsync_engine::{utc_clock, Credentials, JobApi, ReqwestJobApi, SyncEvent, SyncHandle};
use sync_logging::{sync_debug, sync_info};
use tokio::sync::broadcast::error::RecvError;

use crate::config::AppConfig;
use crate::persistence::{load_history, save_history};
use crate::terminal::{
    render_history, render_job, render_list, render_notifications, TerminalNotifier,
};

/// What the console was asked to do.
#[derive(Debug, Clone)]
pub enum Action {
    Watch { job_id: String },
    Jobs { follow: bool },
    Submit {
        files: Vec<PathBuf>,
        languages: Vec<String>,
        options: TranslateOptions,
        watch: bool,
    },
    Translate {
        file: PathBuf,
        language: String,
        options: TranslateOptions,
    },
    History,
    Cancel { job_id: String },
    Retry { job_id: String, item_id: String },
}

struct App {
    config: AppConfig,
    api: Arc<ReqwestJobApi>,
    sync: SyncHandle,
}

pub async fn run(config: AppConfig, action: Action) -> anyhow::Result<()> {
    let app = App::start(config)?;
    let outcome = app.dispatch(action).await;
    app.sync.shutdown();
    outcome
}

impl App {
    fn start(config: AppConfig) -> anyhow::Result<Self> {
        let credentials = if config.auth_bypass {
            sync_info!("Development auth bypass enabled; requests carry no credentials");
            Credentials::bypassed()
        } else {
            Credentials::new(config.tokens.clone())
        };
        let api = Arc::new(
            ReqwestJobApi::new(config.settings.clone(), Arc::new(credentials))
                .map_err(|err| anyhow!(friendly_message(&err, None)))?,
        );
        let notifier = Arc::new(TerminalNotifier::new(config.desktop_notifications));
        let sync = SyncHandle::spawn(
            SyncState::with_policy(config.policy),
            api.clone(),
            notifier,
            utc_clock(),
        );
        Ok(Self { config, api, sync })
    }

    async fn dispatch(&self, action: Action) -> anyhow::Result<()> {
        match action {
            Action::Watch { job_id } => self.watch(&job_id).await,
            Action::Jobs { follow } => self.jobs(follow).await,
            Action::Submit {
                files,
                languages,
                options,
                watch,
            } => self.submit(&files, &languages, &options, watch).await,
            Action::Translate {
                file,
                language,
                options,
            } => self.translate(&file, &language, &options).await,
            Action::History => self.history().await,
            Action::Cancel { job_id } => {
                let job = self.sync.cancel_job(&job_id).await.map_err(user_error)?;
                println!("Batch {} is now {}", job.id, job.status.label());
                Ok(())
            }
            Action::Retry { job_id, item_id } => {
                let ack = self
                    .sync
                    .retry_item(&job_id, &item_id)
                    .await
                    .map_err(user_error)?;
                if ack.message.is_empty() {
                    println!("Retry requested for image {item_id}");
                } else {
                    println!("{}", ack.message);
                }
                Ok(())
            }
        }
    }

    /// Follows one job until it finishes, the server forgets it, or ctrl-c.
    async fn watch(&self, job_id: &str) -> anyhow::Result<()> {
        let key = CacheKey::Job(job_id.to_string());
        let mut events = self.sync.events();
        let _subscription = self.sync.subscribe(key.clone());

        loop {
            let event = tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    sync_debug!("Interrupted while watching {}", job_id);
                    break;
                }
                event = events.recv() => event,
            };
            let event = match event {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    sync_debug!("Watcher skipped {} events", skipped);
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            if event.key() != Some(&key) {
                continue;
            }
            let value = self.sync.value(key.clone()).await;
            match watch_step(&key, &event, value.as_ref()) {
                WatchStep::Ignore => {}
                WatchStep::Fail(message) => bail!(message),
                WatchStep::Render { finished } => {
                    self.print_job_row(job_id).await?;
                    if finished {
                        break;
                    }
                }
            }
        }

        self.print_notifications().await;
        Ok(())
    }

    async fn print_job_row(&self, job_id: &str) -> anyhow::Result<()> {
        let view = self
            .sync
            .view()
            .await
            .context("sync loop stopped unexpectedly")?;
        if let Some(row) = view.jobs.iter().find(|row| row.job_id == job_id) {
            println!("{}", render_job(row));
        }
        Ok(())
    }

    async fn jobs(&self, follow: bool) -> anyhow::Result<()> {
        let key = CacheKey::JobList;
        let mut events = self.sync.events();
        let _subscription = self.sync.subscribe_list();

        loop {
            let event = tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                event = events.recv() => event,
            };
            let event = match event {
                Ok(event) => event,
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            };
            if event.key() != Some(&key) {
                continue;
            }
            let value = self.sync.value(key.clone()).await;
            match watch_step(&key, &event, value.as_ref()) {
                WatchStep::Ignore => {}
                WatchStep::Fail(message) => bail!(message),
                WatchStep::Render { finished } => {
                    let view = self
                        .sync
                        .view()
                        .await
                        .context("sync loop stopped unexpectedly")?;
                    let Some(list) = view.list else {
                        continue;
                    };
                    if !follow && list.jobs.is_empty() {
                        if let Some(error) = &list.error {
                            bail!(error.clone());
                        }
                    }
                    for line in render_list(&list) {
                        println!("{line}");
                    }
                    if !follow || finished {
                        break;
                    }
                    println!();
                }
            }
        }

        if follow {
            self.print_notifications().await;
        }
        Ok(())
    }

    async fn submit(
        &self,
        paths: &[PathBuf],
        languages: &[String],
        options: &TranslateOptions,
        watch: bool,
    ) -> anyhow::Result<()> {
        let files = paths
            .iter()
            .map(|path| read_upload(path))
            .collect::<anyhow::Result<Vec<_>>>()?;
        let summary = self
            .sync
            .create_job(&files, languages, options)
            .await
            .map_err(user_error)?;
        println!(
            "Created batch {} with {} images ({})",
            summary.id,
            summary.total_count,
            summary.target_languages.join(", ")
        );
        if watch {
            self.watch(&summary.id).await?;
        }
        Ok(())
    }

    async fn translate(
        &self,
        path: &Path,
        language: &str,
        options: &TranslateOptions,
    ) -> anyhow::Result<()> {
        let file = read_upload(path)?;
        let result = self
            .api
            .translate_image(&file, language, options)
            .await
            .map_err(user_error)?;
        println!(
            "Translated {} to {} in {} ms: {}",
            file.filename, result.target_lang, result.processing_time_ms, result.translated_image_url
        );

        let mut history = load_history(&self.config.history_dir);
        history.add(HistoryItem {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            target_lang: language.to_string(),
            result,
        });
        save_history(&self.config.history_dir, &history);
        Ok(())
    }

    async fn history(&self) -> anyhow::Result<()> {
        let singles = load_history(&self.config.history_dir);
        let batches = match self.api.list().await {
            Ok(jobs) => jobs,
            Err(err) => {
                eprintln!("Batch history unavailable: {}", friendly_message(&err, None));
                Vec::new()
            }
        };
        for line in render_history(&merge_history(&singles, &batches)) {
            println!("{line}");
        }
        Ok(())
    }

    async fn print_notifications(&self) {
        let Some(view) = self.sync.view().await else {
            return;
        };
        if view.notifications.is_empty() {
            return;
        }
        for line in render_notifications(&view) {
            println!("{line}");
        }
        self.sync.mark_all_read();
    }
}

fn read_upload(path: &Path) -> anyhow::Result<UploadFile> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("{} is not a file name", path.display()))?;
    let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(UploadFile::new(filename, data))
}

/// What a follow loop does with one event about its key.
#[derive(Debug, Clone, PartialEq, Eq)]
enum WatchStep {
    Ignore,
    /// Show the key again; `finished` ends the loop afterwards.
    Render { finished: bool },
    /// Nothing more will arrive for the key.
    Fail(String),
}

fn watch_step(key: &CacheKey, event: &SyncEvent, value: Option<&CachedValue>) -> WatchStep {
    match event {
        SyncEvent::CacheUpdated(updated) if updated == key => WatchStep::Render {
            finished: is_finished(value),
        },
        SyncEvent::FetchFailed {
            key: failed,
            message,
            transient,
            polling_stopped,
        } if failed == key => {
            if *polling_stopped || (!transient && value.is_none()) {
                WatchStep::Fail(message.clone())
            } else {
                WatchStep::Ignore
            }
        }
        _ => WatchStep::Ignore,
    }
}

fn is_finished(value: Option<&CachedValue>) -> bool {
    match value {
        Some(CachedValue::Job(job)) => job.is_terminal(),
        Some(CachedValue::List(jobs)) => jobs.iter().all(|job| job.is_terminal()),
        None => false,
    }
}

fn user_error(err: ApiError) -> anyhow::Error {
    anyhow!(friendly_message(&err, None))
}
