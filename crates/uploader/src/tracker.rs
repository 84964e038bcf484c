//! Status slot shared by the phases of one upload.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tracing::debug;

use oort_protocol::UploadStatus;

/// Holds the current [`UploadStatus`] and the log prefix of one file.
///
/// Each phase overwrites the status when it starts and when it ends; the
/// caller reads the last value once `upload_file` returns.
#[derive(Debug)]
pub struct StatusTracker {
    prefix: String,
    status: Mutex<UploadStatus>,
    upload_duration: Mutex<Option<Duration>>,
}

impl StatusTracker {
    /// Starts at `(New, Pending)`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            status: Mutex::new(UploadStatus::new()),
            upload_duration: Mutex::new(None),
        }
    }

    /// Prefix put in front of every log line for this file.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn get(&self) -> UploadStatus {
        self.status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, status: UploadStatus) {
        debug!(file = %self.prefix, %status, "status changed");
        *self.status.lock().unwrap_or_else(PoisonError::into_inner) = status;
    }

    /// Wall-clock time of the last successful byte upload.
    pub fn upload_duration(&self) -> Option<Duration> {
        *self
            .upload_duration
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record_upload_duration(&self, elapsed: Duration) {
        *self
            .upload_duration
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(elapsed);
    }
}
