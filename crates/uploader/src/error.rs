//! Upload error types.

use oort_transfer::TransferError;

use crate::retry::Phase;

/// Errors produced while uploading a file.
///
/// Every phase raises its own kind so the retry policy can tell a transient
/// remote failure from a configuration error surfacing at the same call site.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("upload context is not validated")]
    InvalidatedContext,

    #[error("invalid upload context: {0}")]
    InvalidContext(String),

    #[error("dataset check failed: {0}")]
    DatasetCheck(String),

    #[error("dataset preparation failed: {0}")]
    DatasetPreparation(String),

    #[error("{} - {message}", status_text(.status))]
    Transfer {
        status: Option<u16>,
        message: String,
    },

    #[error("metadata update failed: {0}")]
    Metadata(String),

    #[error("invalid custom tag: {0:?}")]
    InvalidCustomTag(String),

    #[error("local file error: {0}")]
    LocalFile(#[from] TransferError),
}

fn status_text(status: &Option<u16>) -> String {
    status.map_or_else(|| "no status".to_string(), |s| s.to_string())
}

impl UploadError {
    /// The phase whose retry may absorb this error, if any.
    pub fn retryable_in(&self) -> Option<Phase> {
        match self {
            Self::DatasetPreparation(_) => Some(Phase::Dataset),
            Self::Transfer { .. } => Some(Phase::Upload),
            Self::Metadata(_) => Some(Phase::Metadata),
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable_in().is_some()
    }
}
