use std::sync::Arc;
use std::time::Duration;

use batchsync_core::{
    validate_batch, validate_single, AckResult, ApiError, Job, JobCreatedSummary,
    TranslateOptions, TranslateResult, UploadFile,
};
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use sync_logging::{sync_debug, sync_warn};
use tokio::sync::Mutex;
use url::Url;

use crate::credentials::{AuthTokens, Credentials};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Status polls, lists and small mutations.
    pub request_timeout: Duration,
    /// Uploads and the synchronous single-image translate.
    pub translate_timeout: Duration,
    pub list_page_size: u32,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            translate_timeout: Duration::from_secs(120),
            list_page_size: 50,
        }
    }
}

/// Remote operations on batch jobs. Implementations hold no job state.
#[async_trait::async_trait]
pub trait JobApi: Send + Sync {
    async fn create(
        &self,
        files: &[UploadFile],
        target_languages: &[String],
        options: &TranslateOptions,
    ) -> Result<JobCreatedSummary, ApiError>;

    async fn get_status(&self, job_id: &str) -> Result<Job, ApiError>;

    /// All jobs owned by the caller, in whatever order the server returns.
    async fn list(&self) -> Result<Vec<Job>, ApiError>;

    async fn cancel(&self, job_id: &str) -> Result<Job, ApiError>;

    async fn retry_item(&self, job_id: &str, item_id: &str) -> Result<AckResult, ApiError>;

    async fn translate_image(
        &self,
        file: &UploadFile,
        target_lang: &str,
        options: &TranslateOptions,
    ) -> Result<TranslateResult, ApiError>;
}

/// [`JobApi`] over the backend's HTTP interface.
pub struct ReqwestJobApi {
    client: reqwest::Client,
    base: Url,
    settings: ClientSettings,
    credentials: Arc<Credentials>,
    refresh_gate: Mutex<()>,
}

impl ReqwestJobApi {
    pub fn new(settings: ClientSettings, credentials: Arc<Credentials>) -> Result<Self, ApiError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| ApiError::Validation(format!("invalid base url: {err}")))?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            base,
            settings,
            credentials,
            refresh_gate: Mutex::new(()),
        })
    }

    pub fn credentials(&self) -> &Arc<Credentials> {
        &self.credentials
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Validation(format!("base url cannot take a path: {}", self.base)))?
            .pop_if_empty()
            .extend(["api", "v1"])
            .extend(segments);
        Ok(url)
    }

    async fn send_once<F>(&self, build: &F) -> Result<(Response, Option<String>), ApiError>
    where
        F: Fn() -> Result<RequestBuilder, ApiError> + Send + Sync,
    {
        let token = self.credentials.access_token();
        let mut request = build()?;
        if let Some(token) = token.as_deref() {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(map_reqwest_error)?;
        Ok((response, token))
    }

    /// Sends a request, refreshing the access token and replaying once on 401.
    async fn execute<T, F>(&self, build: F) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        F: Fn() -> Result<RequestBuilder, ApiError> + Send + Sync,
    {
        let (response, used_token) = self.send_once(&build).await?;
        if response.status() != StatusCode::UNAUTHORIZED || self.credentials.is_bypassed() {
            return decode(response).await;
        }
        if !self.refresh_after_unauthorized(used_token.as_deref()).await {
            return decode(response).await;
        }
        let (response, _) = self.send_once(&build).await?;
        decode(response).await
    }

    /// Returns true when a usable access token is available for a replay.
    ///
    /// Concurrent 401s queue on the gate; whoever gets there after a
    /// successful refresh reuses the new token instead of refreshing again.
    async fn refresh_after_unauthorized(&self, used_token: Option<&str>) -> bool {
        let _gate = self.refresh_gate.lock().await;
        if let Some(current) = self.credentials.access_token() {
            if Some(current.as_str()) != used_token {
                return true;
            }
        }
        let Some(refresh_token) = self.credentials.refresh_token() else {
            self.credentials.clear();
            return false;
        };

        match self.request_refresh(&refresh_token).await {
            Ok(tokens) if tokens.is_complete() => {
                sync_debug!("Access token refreshed");
                self.credentials.set(tokens);
                true
            }
            Ok(_) => {
                sync_warn!("Token refresh returned an incomplete token pair");
                self.credentials.clear();
                false
            }
            Err(err) => {
                sync_warn!("Token refresh failed: {}", err);
                self.credentials.clear();
                false
            }
        }
    }

    async fn request_refresh(&self, refresh_token: &str) -> Result<AuthTokens, ApiError> {
        let url = self.endpoint(&["auth", "refresh"])?;
        let response = self
            .client
            .post(url)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        decode(response).await
    }
}

#[async_trait::async_trait]
impl JobApi for ReqwestJobApi {
    async fn create(
        &self,
        files: &[UploadFile],
        target_languages: &[String],
        options: &TranslateOptions,
    ) -> Result<JobCreatedSummary, ApiError> {
        validate_batch(files, target_languages)?;
        let url = self.endpoint(&["translate", "batch", "translate"])?;
        let joined = target_languages.join(",");
        sync_debug!("Creating batch: {} files -> {}", files.len(), joined);
        self.execute(|| {
            let mut form = Form::new();
            for file in files {
                form = form.part("files", file_part(file)?);
            }
            form = form.text("target_languages", joined.clone());
            if let Some(source) = &options.source_language {
                form = form.text("source_language", source.clone());
            }
            if let Some(exclude) = &options.exclude_text {
                form = form.text("exclude_text", exclude.clone());
            }
            if let Some(webhook) = &options.webhook_url {
                form = form.text("webhook_url", webhook.clone());
            }
            Ok(self
                .client
                .post(url.clone())
                .timeout(self.settings.translate_timeout)
                .multipart(form))
        })
        .await
    }

    async fn get_status(&self, job_id: &str) -> Result<Job, ApiError> {
        let url = self.endpoint(&["translate", "batch", job_id])?;
        self.execute(|| Ok(self.client.get(url.clone()))).await
    }

    async fn list(&self) -> Result<Vec<Job>, ApiError> {
        let mut url = self.endpoint(&["translate", "batch"])?;
        url.query_pairs_mut()
            .append_pair("limit", &self.settings.list_page_size.to_string())
            .append_pair("offset", "0");
        self.execute(|| Ok(self.client.get(url.clone()))).await
    }

    async fn cancel(&self, job_id: &str) -> Result<Job, ApiError> {
        let url = self.endpoint(&["translate", "batch", job_id, "cancel"])?;
        let ack: AckResult = self.execute(|| Ok(self.client.post(url.clone()))).await?;
        sync_debug!("Cancel acknowledged for {}: {}", job_id, ack.message);
        self.get_status(job_id).await
    }

    async fn retry_item(&self, job_id: &str, item_id: &str) -> Result<AckResult, ApiError> {
        let url = self.endpoint(&["translate", "batch", job_id, "images", item_id, "retry"])?;
        self.execute(|| Ok(self.client.post(url.clone()))).await
    }

    async fn translate_image(
        &self,
        file: &UploadFile,
        target_lang: &str,
        options: &TranslateOptions,
    ) -> Result<TranslateResult, ApiError> {
        validate_single(file, target_lang)?;
        let url = self.endpoint(&["translate", "translate-image"])?;
        self.execute(|| {
            let mut form = Form::new()
                .part("image", file_part(file)?)
                .text("target_lang", target_lang.to_string());
            if let Some(source) = &options.source_language {
                form = form.text("source_lang", source.clone());
            }
            if let Some(exclude) = &options.exclude_text {
                form = form.text("exclude_text", exclude.clone());
            }
            Ok(self
                .client
                .post(url.clone())
                .timeout(self.settings.translate_timeout)
                .multipart(form))
        })
        .await
    }
}

fn file_part(file: &UploadFile) -> Result<Part, ApiError> {
    Part::bytes(file.data.clone())
        .file_name(file.filename.clone())
        .mime_str(file.mime_type())
        .map_err(|err| ApiError::Validation(err.to_string()))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        return Err(error_from_response(response).await);
    }
    let body = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&body).map_err(|err| ApiError::Server {
        status: status.as_u16(),
        message: format!("malformed response body: {err}"),
    })
}

async fn error_from_response(response: Response) -> ApiError {
    let status = response.status();
    let reason = status.canonical_reason().unwrap_or("request failed").to_string();
    let message = match response.bytes().await {
        Ok(body) => server_message(&body).unwrap_or(reason),
        Err(_) => reason,
    };
    match status {
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        StatusCode::CONFLICT => ApiError::Conflict(message),
        _ => ApiError::Server {
            status: status.as_u16(),
            message,
        },
    }
}

/// Pulls the human-readable part out of an error body: `detail`, then
/// `message`, then `error`.
fn server_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    ["detail", "message", "error"]
        .iter()
        .find_map(|field| value.get(field).and_then(serde_json::Value::as_str))
        .map(str::to_string)
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::Transport(format!("request timed out: {err}"));
    }
    if err.is_builder() {
        return ApiError::Validation(err.to_string());
    }
    ApiError::Transport(format!("network error: {err}"))
}
