use serde::{Deserialize, Serialize};

/// A remote dataset as returned by the datasets endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub uuid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telescope: Option<String>,
}

/// Body of a dataset create or update request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telescope: Option<String>,
}

impl DatasetPayload {
    /// Payload creating a dataset named `name`, optionally bound to a telescope.
    pub fn create(name: impl Into<String>, telescope: Option<String>) -> Self {
        Self {
            name: Some(name.into()),
            telescope,
        }
    }

    /// Payload that only (re)associates an existing dataset with a telescope.
    pub fn telescope(telescope: impl Into<String>) -> Self {
        Self {
            name: None,
            telescope: Some(telescope.into()),
        }
    }
}

/// A remote data file, created as a side effect of an upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFileRecord {
    pub pk: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,
}

/// Metadata attached to a data file after its bytes were uploaded.
///
/// Sent as a JSON document: `tags` is a list and cannot travel inside the
/// multipart body used for the bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFileMetadata {
    pub tags: Vec<String>,
    pub is_raw: bool,
    pub fsname: String,
    pub fspath: String,
}
