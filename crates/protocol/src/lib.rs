//! Wire types shared by the Oort uploader crates.
//!
//! Records returned by the remote API, the payloads sent to it, and the
//! `(Status, Substatus)` pair describing where a single-file upload stands.

pub mod constants;
pub mod types;

// Re-export primary types for convenience.
pub use constants::{Status, Substatus, UploadStatus};
pub use types::{DataFileMetadata, DataFileRecord, DatasetPayload, DatasetRecord};
