//! Streaming upload of the file bytes.

use std::path::Path;
use std::time::Instant;

use tracing::{error, info};

use oort_api::{ApiError, ArcsecondApi};
use oort_protocol::{DataFileRecord, UploadStatus};
use oort_transfer::{MultipartBody, terminal_progress};

use crate::error::UploadError;
use crate::tracker::StatusTracker;

/// Server message fragment returned when the dataset already holds the file.
pub const ALREADY_EXISTS_MARKER: &str = "already exists in dataset";

/// How a failed upload call should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFailure {
    /// The server already holds this file; nothing left to do.
    AlreadySynced,
    Failed,
}

/// Sorts an upload error into a duplicate or a real failure.
///
/// The server reports duplicates only in the message text, so this is a
/// case-sensitive substring match on the error's display form.
pub fn classify_upload_failure(err: &ApiError) -> UploadFailure {
    if err.to_string().contains(ALREADY_EXISTS_MARKER) {
        UploadFailure::AlreadySynced
    } else {
        UploadFailure::Failed
    }
}

/// Result of a successful transport attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferOutcome {
    Uploaded(DataFileRecord),
    AlreadySynced,
}

/// Streams one file into a dataset as a multipart body.
pub struct UploadTransport<'a> {
    api: &'a dyn ArcsecondApi,
    tracker: &'a StatusTracker,
    file_path: &'a Path,
    display_progress: bool,
}

impl<'a> UploadTransport<'a> {
    pub fn new(api: &'a dyn ArcsecondApi, tracker: &'a StatusTracker, file_path: &'a Path) -> Self {
        Self {
            api,
            tracker,
            file_path,
            display_progress: false,
        }
    }

    /// Draws a progress bar on stdout while the body is sent.
    pub fn with_display_progress(mut self, display: bool) -> Self {
        self.display_progress = display;
        self
    }

    /// Uploads the file into `dataset_uuid`.
    ///
    /// The file is opened for this attempt only and closed when the body is
    /// dropped, whatever the outcome.
    pub async fn perform(&self, dataset_uuid: &str) -> Result<TransferOutcome, UploadError> {
        self.tracker.set(UploadStatus::uploading());
        let prefix = self.tracker.prefix();

        let on_progress = self.display_progress.then(terminal_progress);
        let body = MultipartBody::open(self.file_path, dataset_uuid, on_progress).await?;
        info!(
            file = %prefix,
            bytes = body.file_size(),
            "Starting upload ({} bytes)",
            body.file_size()
        );

        let started = Instant::now();
        match self.api.create_datafile(body).await {
            Ok(record) => {
                let elapsed = started.elapsed();
                self.tracker.record_upload_duration(elapsed);
                info!(
                    file = %prefix,
                    pk = record.pk,
                    "Upload duration is {:.3} seconds.",
                    elapsed.as_secs_f64()
                );
                Ok(TransferOutcome::Uploaded(record))
            }
            Err(err) => match classify_upload_failure(&err) {
                UploadFailure::AlreadySynced => {
                    info!(file = %prefix, "File already in dataset.");
                    self.tracker.set(UploadStatus::already_synced());
                    Ok(TransferOutcome::AlreadySynced)
                }
                UploadFailure::Failed => {
                    error!(
                        file = %prefix,
                        path = %self.file_path.display(),
                        error = %err,
                        "Upload of file failed."
                    );
                    self.tracker.set(UploadStatus::error(None));
                    Err(UploadError::Transfer {
                        status: err.status(),
                        message: err.to_string(),
                    })
                }
            },
        }
    }
}
