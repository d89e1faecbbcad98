//! Upload flow: send a local file to the backend and turn the response into a snapshot.

use color_eyre::Result;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{join_url, BackendConfig, Theme};
use crate::error::ClientError;
use crate::snapshot::DatasetSnapshot;
use crate::widgets::text_input::{TextInput, TextInputEvent};
use crate::AppEvent;

/// Extensions the file prompt suggests. Other files are still sent; the backend decides.
pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["csv", "xlsx", "xls"];

pub fn has_accepted_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            ACCEPTED_EXTENSIONS
                .iter()
                .any(|a| a.eq_ignore_ascii_case(e))
        })
        .unwrap_or(false)
}

/// Talks to the backend. Implemented over HTTP in production and faked in tests.
pub trait Uploader: Send + Sync {
    /// Upload `path` and return the dataset snapshot the backend parsed from it.
    fn upload(&self, path: &Path) -> std::result::Result<DatasetSnapshot, ClientError>;

    /// Liveness probe; returns the backend's greeting.
    fn ping(&self) -> std::result::Result<String, ClientError>;
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<Value>,
}

#[derive(Deserialize)]
struct PingBody {
    message: Option<String>,
}

/// Backend's `detail` string from an error response body, if there is one.
pub fn error_detail(body: &str) -> Option<String> {
    match serde_json::from_str::<ErrorBody>(body).ok()?.detail? {
        Value::String(s) => Some(s),
        _ => None,
    }
}

/// Blocking multipart client for `POST {url}{upload_path}` and `GET {url}/`.
pub struct HttpUploader {
    client: reqwest::blocking::Client,
    upload_url: String,
    ping_url: String,
}

impl HttpUploader {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let timeout = (config.timeout_secs > 0).then(|| Duration::from_secs(config.timeout_secs));
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            upload_url: join_url(&config.url, &config.upload_path),
            ping_url: join_url(&config.url, "/"),
        })
    }

    pub fn upload_url(&self) -> &str {
        &self.upload_url
    }
}

impl Uploader for HttpUploader {
    fn upload(&self, path: &Path) -> std::result::Result<DatasetSnapshot, ClientError> {
        let form = reqwest::blocking::multipart::Form::new()
            .file("file", path)
            .map_err(|e| ClientError::UploadFailed(format!("{}: {}", path.display(), e)))?;

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .map_err(|e| {
                tracing::warn!(url = %self.upload_url, error = %e, "upload request failed");
                ClientError::upload_failed(None)
            })?;

        let status = response.status();
        let body = response.text().map_err(|e| {
            tracing::warn!(error = %e, "could not read upload response");
            ClientError::upload_failed(None)
        })?;

        if !status.is_success() {
            tracing::warn!(%status, "backend rejected upload");
            return Err(ClientError::upload_failed(error_detail(&body)));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(error = %e, "upload response is not a dataset");
            ClientError::upload_failed(None)
        })
    }

    fn ping(&self) -> std::result::Result<String, ClientError> {
        let response = self
            .client
            .get(&self.ping_url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| ClientError::BackendUnavailable(e.to_string()))?;
        let body: PingBody = response
            .json()
            .map_err(|e| ClientError::BackendUnavailable(e.to_string()))?;
        Ok(body.message.unwrap_or_default())
    }
}

/// Run the liveness probe off the UI thread; reports `AppEvent::BackendStatus`.
pub fn spawn_backend_check(uploader: Arc<dyn Uploader>, events: Sender<AppEvent>) {
    std::thread::spawn(move || {
        let status = uploader.ping();
        let _ = events.send(AppEvent::BackendStatus(status));
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadFocus {
    #[default]
    Path,
    Submit,
}

/// State of the upload page: path prompt, in-flight flag and last error.
pub struct UploadForm {
    pub path_input: TextInput,
    pub focus: UploadFocus,
    loading: bool,
    error: Option<String>,
}

impl Default for UploadForm {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadForm {
    pub fn new() -> Self {
        Self::with_input(TextInput::new())
    }

    /// Form whose path prompt uses the theme's text color.
    pub fn with_theme(theme: &Theme) -> Self {
        Self::with_input(TextInput::new().with_theme(theme))
    }

    fn with_input(input: TextInput) -> Self {
        let mut path_input = input.with_placeholder("path/to/data.csv (.csv, .xlsx, .xls)");
        path_input.set_focused(true);
        Self {
            path_input,
            focus: UploadFocus::Path,
            loading: false,
            error: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn path(&self) -> PathBuf {
        PathBuf::from(self.path_input.value().trim())
    }

    pub fn set_path(&mut self, path: &Path) {
        self.path_input.set_value(path.display().to_string());
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            UploadFocus::Path => UploadFocus::Submit,
            UploadFocus::Submit => UploadFocus::Path,
        };
        self.path_input.set_focused(self.focus == UploadFocus::Path);
    }

    /// Forward a key to the path prompt. Returns true when Enter asks for submission.
    pub fn handle_path_key(&mut self, key: &crossterm::event::KeyEvent) -> bool {
        matches!(self.path_input.handle_key(key), TextInputEvent::Submit)
    }

    /// Start an upload on a worker thread. The result arrives as `AppEvent::UploadFinished`.
    ///
    /// Does nothing while a request is in flight. With no path, records `NoFileSelected`
    /// and never touches the network.
    pub fn submit(
        &mut self,
        uploader: Arc<dyn Uploader>,
        events: Sender<AppEvent>,
    ) -> std::result::Result<(), ClientError> {
        if self.loading {
            return Ok(());
        }
        let path = self.path();
        if path.as_os_str().is_empty() {
            let err = ClientError::NoFileSelected;
            self.error = Some(err.to_string());
            return Err(err);
        }

        self.loading = true;
        self.error = None;
        tracing::info!(path = %path.display(), "upload started");
        std::thread::spawn(move || {
            let result = uploader.upload(&path);
            let _ = events.send(AppEvent::UploadFinished(result));
        });
        Ok(())
    }

    /// Record the outcome of the in-flight upload.
    pub fn finish(&mut self, result: std::result::Result<(), &ClientError>) {
        self.loading = false;
        match result {
            Ok(()) => {
                tracing::info!("upload finished");
                self.error = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "upload failed");
                self.error = Some(e.to_string());
            }
        }
    }
}
