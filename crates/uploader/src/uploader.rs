//! Upload orchestration for a single file.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use oort_api::ArcsecondApi;
use oort_protocol::UploadStatus;

use crate::context::{SharedContext, UploadContext};
use crate::error::UploadError;
use crate::resolver::DatasetResolver;
use crate::retry::{Phase, RetryPolicy};
use crate::tagger::MetadataTagger;
use crate::tracker::StatusTracker;
use crate::transport::{TransferOutcome, UploadTransport};

/// Environment variable marking a test run.
const TEST_CONTEXT_VAR: &str = "OORT_TESTS";

fn default_origin() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".into())
}

fn log_prefix_for(root: &Path, file: &Path) -> String {
    let shown = file.strip_prefix(root).unwrap_or(file);
    format!("[{}]", shown.display())
}

/// Uploads one local file into the dataset named by the context.
///
/// The flow runs three phases in order, each gated on the previous one:
/// dataset resolution, byte upload, metadata tagging. Every phase is retried
/// once after [`RetryPolicy`]'s pause when it fails remotely.
pub struct DataFileUploader {
    api: Arc<dyn ArcsecondApi>,
    context: SharedContext,
    root_path: PathBuf,
    file_path: PathBuf,
    display_progress: bool,
    retry: RetryPolicy,
    tracker: StatusTracker,
    origin: String,
    is_test_context: bool,
}

impl DataFileUploader {
    /// Creates an uploader for `file_path`, found under `root_path`.
    pub fn new(
        context: SharedContext,
        api: Arc<dyn ArcsecondApi>,
        root_path: impl Into<PathBuf>,
        file_path: impl Into<PathBuf>,
    ) -> Self {
        let root_path = root_path.into();
        let file_path = file_path.into();
        let tracker = StatusTracker::new(log_prefix_for(&root_path, &file_path));

        Self {
            api,
            context,
            root_path,
            file_path,
            display_progress: false,
            retry: RetryPolicy::default(),
            tracker,
            origin: default_origin(),
            is_test_context: std::env::var(TEST_CONTEXT_VAR).is_ok_and(|v| v == "1"),
        }
    }

    /// Draws a progress bar on stdout during the byte upload.
    pub fn with_display_progress(mut self, display: bool) -> Self {
        self.display_progress = display;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Overrides the host name reported in the `origin` tag.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// `[<path relative to root>]`, or the full path when the file is not
    /// under the root.
    pub fn log_prefix(&self) -> &str {
        self.tracker.prefix()
    }

    /// Current status; still readable after `upload_file` failed.
    pub fn status(&self) -> UploadStatus {
        self.tracker.get()
    }

    /// Whether `OORT_TESTS=1` was set when the uploader was created.
    pub fn is_test_context(&self) -> bool {
        self.is_test_context
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Wall-clock time of the byte upload, once it succeeded.
    pub fn upload_duration(&self) -> Option<Duration> {
        self.tracker.upload_duration()
    }

    /// Runs the full upload and returns the terminal status, either
    /// `(Ok, Done)` or `(Skipped, AlreadySynced)`.
    ///
    /// `is_raw` and `custom_tags` override the context defaults for this file.
    ///
    /// If the metadata phase fails twice the data file stays on the server
    /// without tags. Calling again does not repair it: the second upload is
    /// reported as already synced and tagging is skipped.
    pub async fn upload_file(
        &self,
        is_raw: Option<bool>,
        custom_tags: Option<Vec<String>>,
    ) -> Result<UploadStatus, UploadError> {
        if !self.context.read().await.is_validated() {
            return Err(UploadError::InvalidatedContext);
        }
        if let Some(tags) = &custom_tags {
            UploadContext::validate_custom_tags(tags)?;
        }

        info!(file = %self.log_prefix(), "Opening upload sequence.");
        let result = self.run_phases(is_raw, custom_tags.as_deref()).await;
        info!(file = %self.log_prefix(), "Closing upload sequence.");

        result.map(|()| self.tracker.get())
    }

    async fn run_phases(
        &self,
        is_raw: Option<bool>,
        custom_tags: Option<&[String]>,
    ) -> Result<(), UploadError> {
        let prefix = self.log_prefix();
        let api = self.api.as_ref();

        let resolver = &DatasetResolver::new(api, &self.context, &self.tracker);
        let dataset_uuid = self
            .retry
            .run(Phase::Dataset, move || resolver.prepare())
            .await
            .inspect_err(|e| warn!(file = %prefix, error = %e, "Dataset preparation failed."))?;
        info!(file = %prefix, dataset = %dataset_uuid, "Dataset preparation done.");

        let transport = &UploadTransport::new(api, &self.tracker, &self.file_path)
            .with_display_progress(self.display_progress);
        let dataset = dataset_uuid.as_str();
        let outcome = self
            .retry
            .run(Phase::Upload, move || transport.perform(dataset))
            .await?;

        let datafile = match outcome {
            TransferOutcome::AlreadySynced => {
                info!(file = %prefix, "Upload skipped.");
                return Ok(());
            }
            TransferOutcome::Uploaded(record) => record,
        };

        let tagger = &MetadataTagger::new(
            api,
            &self.context,
            &self.tracker,
            &self.root_path,
            &self.origin,
        );
        let datafile = &datafile;
        self.retry
            .run(Phase::Metadata, move || {
                tagger.tag(datafile, is_raw, custom_tags)
            })
            .await?;

        info!(file = %prefix, "Upload done.");
        Ok(())
    }
}
