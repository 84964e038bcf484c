//! Single-file upload flow: dataset, bytes, metadata.
//!
//! This crate drives **one** local file into a remote dataset. It is a
//! library crate with no transport of its own: the caller provides an
//! [`ArcsecondApi`](oort_api::ArcsecondApi) implementation and a shared
//! [`UploadContext`].
//!
//! # Pipeline
//!
//! 1. **Dataset**: read, update or create the remote dataset
//! 2. **Upload**: stream the file as a multipart body with progress
//! 3. **Metadata**: attach tags and the raw-data flag to the new data file
//!
//! Each phase is retried once after a fixed pause; a second failure is
//! returned to the caller. A file the server already holds ends the flow
//! early with a skipped status.

pub mod context;
pub mod error;
pub mod resolver;
pub mod retry;
pub mod tagger;
pub mod tracker;
pub mod transport;
pub mod uploader;

#[cfg(test)]
pub(crate) mod mock;

/// Version reported in the `version` tag of every uploaded file.
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export primary types for convenience.
pub use context::{SharedContext, UploadContext};
pub use error::UploadError;
pub use resolver::DatasetResolver;
pub use retry::{Phase, RetryPolicy, Sleeper, TokioSleeper};
pub use tagger::{MetadataTagger, TagSources, build_tags};
pub use tracker::StatusTracker;
pub use transport::{TransferOutcome, UploadFailure, UploadTransport, classify_upload_failure};
pub use uploader::DataFileUploader;

pub use oort_protocol::{Status, Substatus, UploadStatus};
