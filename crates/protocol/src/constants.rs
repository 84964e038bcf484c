use std::fmt;

use serde::{Deserialize, Serialize};

/// Namespace prefix of every tag generated by the uploader.
pub const TAG_NAMESPACE: &str = "arcsecond";

/// Separator between the namespace, kind and value of a generated tag.
pub const TAG_SEPARATOR: char = '|';

/// Coarse phase of a single-file upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "new")]
    New,
    #[serde(rename = "preparing")]
    Preparing,
    #[serde(rename = "uploading")]
    Uploading,
    #[serde(rename = "finishing")]
    Finishing,
    #[serde(rename = "ok")]
    Ok,
    #[serde(rename = "skipped")]
    Skipped,
    #[serde(rename = "error")]
    Error,
}

impl Status {
    /// Returns the wire name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Preparing => "preparing",
            Self::Uploading => "uploading",
            Self::Finishing => "finishing",
            Self::Ok => "ok",
            Self::Skipped => "skipped",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fine-grained marker nested under a [`Status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Substatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "checking")]
    Checking,
    #[serde(rename = "uploading")]
    Uploading,
    #[serde(rename = "tagging")]
    Tagging,
    #[serde(rename = "already synced")]
    AlreadySynced,
    #[serde(rename = "done")]
    Done,
    #[serde(rename = "error")]
    Error,
}

impl Substatus {
    /// Returns the wire name of this substatus.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Checking => "checking",
            Self::Uploading => "uploading",
            Self::Tagging => "tagging",
            Self::AlreadySynced => "already synced",
            Self::Done => "done",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Substatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a single-file upload stands.
///
/// Only the pairs produced by the constructors below exist, one per phase:
/// a value like `(Ok, Checking)` cannot be built. The uploader overwrites
/// the whole value at every phase boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadStatus {
    status: Status,
    substatus: Substatus,
    detail: Option<String>,
}

impl Default for UploadStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadStatus {
    /// Nothing has happened yet.
    pub fn new() -> Self {
        Self::pair(Status::New, Substatus::Pending)
    }

    /// The remote dataset is being read, created or updated.
    pub fn preparing() -> Self {
        Self::pair(Status::Preparing, Substatus::Checking)
    }

    /// The file bytes are being streamed.
    pub fn uploading() -> Self {
        Self::pair(Status::Uploading, Substatus::Uploading)
    }

    /// Tags are being attached to the created data file.
    pub fn finishing() -> Self {
        Self::pair(Status::Finishing, Substatus::Tagging)
    }

    /// Upload and tagging both succeeded.
    pub fn done() -> Self {
        Self::pair(Status::Ok, Substatus::Done)
    }

    /// The server already holds this file in the dataset.
    pub fn already_synced() -> Self {
        Self::pair(Status::Skipped, Substatus::AlreadySynced)
    }

    /// A remote call failed.
    pub fn error(detail: Option<String>) -> Self {
        Self {
            status: Status::Error,
            substatus: Substatus::Error,
            detail,
        }
    }

    fn pair(status: Status, substatus: Substatus) -> Self {
        Self {
            status,
            substatus,
            detail: None,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn substatus(&self) -> Substatus {
        self.substatus
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// True once the upload was skipped as a duplicate.
    pub fn is_skipped(&self) -> bool {
        self.status == Status::Skipped
    }

    /// True for `(Ok, Done)` and `(Skipped, AlreadySynced)`.
    pub fn is_success(&self) -> bool {
        matches!(self.status, Status::Ok | Status::Skipped)
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.status, self.substatus)?;
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}
