//! User-facing client errors. Each one is recovered locally by an empty state or an inline message.

use thiserror::Error;

/// Message shown when an upload fails without a backend-provided `detail`.
pub const UPLOAD_FALLBACK_MESSAGE: &str =
    "Upload failed. Ensure backend is running and file format is valid.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("Please select a CSV or Excel file")]
    NoFileSelected,
    #[error("{0}")]
    UploadFailed(String),
    #[error("No dataset loaded. Please upload a dataset first.")]
    NoDataset,
    #[error("Chart configuration missing. Please select X (and optionally Y) columns from the Dataset page.")]
    MissingChartConfig,
    #[error("Backend unreachable: {0}")]
    BackendUnavailable(String),
}

impl ClientError {
    /// Upload failure carrying the backend's message, or the generic fallback when there is none.
    pub fn upload_failed(detail: Option<String>) -> Self {
        match detail {
            Some(msg) if !msg.trim().is_empty() => Self::UploadFailed(msg),
            _ => Self::UploadFailed(UPLOAD_FALLBACK_MESSAGE.to_string()),
        }
    }
}
