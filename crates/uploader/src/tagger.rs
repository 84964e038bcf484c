//! Metadata attached to a data file once its bytes are on the server.

use std::path::Path;

use tracing::{error, info};

use oort_api::ArcsecondApi;
use oort_protocol::constants::{TAG_NAMESPACE, TAG_SEPARATOR};
use oort_protocol::{DataFileMetadata, DataFileRecord, UploadStatus};

use crate::CLIENT_VERSION;
use crate::context::{SharedContext, UploadContext};
use crate::error::UploadError;
use crate::tracker::StatusTracker;

/// Values the generated tags are built from.
#[derive(Debug, Clone, Copy)]
pub struct TagSources<'a> {
    pub root: &'a str,
    pub origin: &'a str,
    pub uploader: &'a str,
    pub version: &'a str,
    pub telescope: Option<&'a str>,
    pub custom: &'a [String],
}

fn tag(kind: &str, value: &str) -> String {
    format!("{TAG_NAMESPACE}{TAG_SEPARATOR}{kind}{TAG_SEPARATOR}{value}")
}

/// Builds the ordered tag list: root, origin, uploader, version, the
/// telescope when known, then the custom tags as given.
pub fn build_tags(sources: &TagSources<'_>) -> Vec<String> {
    let mut tags = vec![
        tag("root", sources.root),
        tag("origin", sources.origin),
        tag("uploader", sources.uploader),
        tag("version", sources.version),
    ];
    if let Some(telescope) = sources.telescope {
        tags.push(tag("telescope", telescope));
    }
    tags.extend(sources.custom.iter().cloned());
    tags
}

/// Tags a freshly uploaded data file.
pub struct MetadataTagger<'a> {
    api: &'a dyn ArcsecondApi,
    context: &'a SharedContext,
    tracker: &'a StatusTracker,
    root_path: &'a Path,
    origin: &'a str,
}

impl<'a> MetadataTagger<'a> {
    pub fn new(
        api: &'a dyn ArcsecondApi,
        context: &'a SharedContext,
        tracker: &'a StatusTracker,
        root_path: &'a Path,
        origin: &'a str,
    ) -> Self {
        Self {
            api,
            context,
            tracker,
            root_path,
            origin,
        }
    }

    /// Builds the metadata document for one file.
    ///
    /// `custom_tags` replaces the context's tags when given and is validated
    /// first. `is_raw` falls back to the context default.
    pub async fn build_metadata(
        &self,
        is_raw: Option<bool>,
        custom_tags: Option<&[String]>,
    ) -> Result<DataFileMetadata, UploadError> {
        if let Some(tags) = custom_tags {
            UploadContext::validate_custom_tags(tags)?;
        }

        let ctx = self.context.read().await;
        let root = self.root_path.display().to_string();
        let custom = custom_tags.or(ctx.custom_tags()).unwrap_or_default();
        let tags = build_tags(&TagSources {
            root: &root,
            origin: self.origin,
            uploader: ctx.username(),
            version: CLIENT_VERSION,
            telescope: ctx.telescope_uuid(),
            custom,
        });

        Ok(DataFileMetadata {
            tags,
            is_raw: is_raw.unwrap_or(ctx.is_raw_data()),
            fsname: self.origin.to_string(),
            fspath: root,
        })
    }

    /// Sends the metadata of `datafile`.
    pub async fn tag(
        &self,
        datafile: &DataFileRecord,
        is_raw: Option<bool>,
        custom_tags: Option<&[String]>,
    ) -> Result<(), UploadError> {
        self.tracker.set(UploadStatus::finishing());
        info!(file = %self.tracker.prefix(), pk = datafile.pk, "Updating file metadata...");

        let metadata = self.build_metadata(is_raw, custom_tags).await?;
        match self.api.update_datafile(datafile.pk, &metadata).await {
            Ok(_) => {
                self.tracker.set(UploadStatus::done());
                Ok(())
            }
            Err(err) => {
                error!(file = %self.tracker.prefix(), error = %err, "Update of metadata failed.");
                self.tracker.set(UploadStatus::error(None));
                Err(UploadError::Metadata(err.to_string()))
            }
        }
    }
}
