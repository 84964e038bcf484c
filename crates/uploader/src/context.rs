//! Per-run upload context shared by every file of a run.

use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use oort_protocol::DatasetRecord;
use oort_protocol::constants::{TAG_NAMESPACE, TAG_SEPARATOR};

use crate::error::UploadError;

/// Handle through which uploaders share one context.
///
/// The only write after construction is [`UploadContext::update_dataset`],
/// called by the dataset resolver when it creates the remote dataset. That
/// write is not coordinated across concurrent uploads: callers running files
/// in parallel should resolve the dataset first.
pub type SharedContext = Arc<RwLock<UploadContext>>;

/// Identity of the upload target and the defaults applied to every file.
#[derive(Debug, Clone, Default)]
pub struct UploadContext {
    dataset_uuid: Option<String>,
    dataset_name: Option<String>,
    telescope_uuid: Option<String>,
    organisation_subdomain: Option<String>,
    username: String,
    is_raw_data: bool,
    custom_tags: Option<Vec<String>>,
    is_validated: bool,
}

fn non_empty(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

impl UploadContext {
    /// Creates an unvalidated context for `username`.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }

    pub fn with_dataset_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.dataset_uuid = non_empty(uuid);
        self.is_validated = false;
        self
    }

    pub fn with_dataset_name(mut self, name: impl Into<String>) -> Self {
        self.dataset_name = non_empty(name);
        self.is_validated = false;
        self
    }

    pub fn with_telescope(mut self, uuid: impl Into<String>) -> Self {
        self.telescope_uuid = non_empty(uuid);
        self.is_validated = false;
        self
    }

    pub fn with_organisation(mut self, subdomain: impl Into<String>) -> Self {
        self.organisation_subdomain = non_empty(subdomain);
        self
    }

    /// Default raw-data flag for files that do not override it.
    pub fn with_raw_data(mut self, is_raw: bool) -> Self {
        self.is_raw_data = is_raw;
        self
    }

    pub fn with_custom_tags(mut self, tags: Vec<String>) -> Self {
        self.custom_tags = Some(tags);
        self.is_validated = false;
        self
    }

    pub fn dataset_uuid(&self) -> Option<&str> {
        self.dataset_uuid.as_deref()
    }

    pub fn dataset_name(&self) -> Option<&str> {
        self.dataset_name.as_deref()
    }

    pub fn telescope_uuid(&self) -> Option<&str> {
        self.telescope_uuid.as_deref()
    }

    pub fn organisation_subdomain(&self) -> Option<&str> {
        self.organisation_subdomain.as_deref()
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn is_raw_data(&self) -> bool {
        self.is_raw_data
    }

    pub fn custom_tags(&self) -> Option<&[String]> {
        self.custom_tags.as_deref()
    }

    pub fn is_validated(&self) -> bool {
        self.is_validated
    }

    /// True when the dataset must be (re)associated with the telescope.
    pub fn should_update_dataset_with_telescope(&self) -> bool {
        self.telescope_uuid.is_some()
    }

    /// Checks the identifiers and custom tags and marks the context usable.
    ///
    /// A context naming no dataset at all still validates: that case fails
    /// later, at dataset resolution.
    pub fn validate(&mut self) -> Result<(), UploadError> {
        self.is_validated = false;

        if let Some(uuid) = &self.dataset_uuid {
            Uuid::parse_str(uuid)
                .map_err(|_| UploadError::InvalidContext(format!("invalid dataset UUID {uuid:?}")))?;
        }
        if let Some(uuid) = &self.telescope_uuid {
            Uuid::parse_str(uuid).map_err(|_| {
                UploadError::InvalidContext(format!("invalid telescope UUID {uuid:?}"))
            })?;
        }
        if let Some(tags) = &self.custom_tags {
            Self::validate_custom_tags(tags)?;
        }

        self.is_validated = true;
        Ok(())
    }

    /// Rejects tags that are blank or that could pass for generated ones.
    pub fn validate_custom_tags(tags: &[String]) -> Result<(), UploadError> {
        for tag in tags {
            if tag.trim().is_empty()
                || tag.contains(TAG_SEPARATOR)
                || tag.starts_with(TAG_NAMESPACE)
            {
                return Err(UploadError::InvalidCustomTag(tag.clone()));
            }
        }
        Ok(())
    }

    /// Records the dataset returned by the server.
    pub fn update_dataset(&mut self, record: &DatasetRecord) {
        self.dataset_uuid = non_empty(record.uuid.as_str());
        if !record.name.is_empty() {
            self.dataset_name = Some(record.name.clone());
        }
    }

    /// Wraps the context in a [`SharedContext`] handle.
    pub fn into_shared(self) -> SharedContext {
        Arc::new(RwLock::new(self))
    }
}
