//! Dataset resolution: make sure the target dataset exists remotely.

use tracing::{debug, info};

use oort_api::ArcsecondApi;
use oort_protocol::{DatasetPayload, UploadStatus};

use crate::context::SharedContext;
use crate::error::UploadError;
use crate::tracker::StatusTracker;

/// Reads, updates or creates the remote dataset named by the context.
pub struct DatasetResolver<'a> {
    api: &'a dyn ArcsecondApi,
    context: &'a SharedContext,
    tracker: &'a StatusTracker,
}

/// What the context asks for, copied out so no guard is held over the network.
enum Target {
    Existing {
        uuid: String,
        telescope: Option<String>,
    },
    Create {
        name: String,
        telescope: Option<String>,
    },
}

impl<'a> DatasetResolver<'a> {
    pub fn new(
        api: &'a dyn ArcsecondApi,
        context: &'a SharedContext,
        tracker: &'a StatusTracker,
    ) -> Self {
        Self {
            api,
            context,
            tracker,
        }
    }

    /// Resolves the dataset and returns its UUID.
    ///
    /// A UUID takes precedence over a name. With a UUID the dataset is read,
    /// or patched with the telescope when one is set. With only a name a new
    /// dataset is created and its identity written back into the context.
    pub async fn prepare(&self) -> Result<String, UploadError> {
        self.tracker.set(UploadStatus::preparing());
        info!(file = %self.tracker.prefix(), "Preparing dataset...");

        let target = {
            let ctx = self.context.read().await;
            let telescope = if ctx.should_update_dataset_with_telescope() {
                ctx.telescope_uuid().map(str::to_string)
            } else {
                None
            };
            match (ctx.dataset_uuid(), ctx.dataset_name()) {
                (Some(uuid), _) => Target::Existing {
                    uuid: uuid.to_string(),
                    telescope,
                },
                (None, Some(name)) => Target::Create {
                    name: name.to_string(),
                    telescope,
                },
                (None, None) => {
                    return Err(UploadError::DatasetCheck("No dataset specified.".into()));
                }
            }
        };

        let record = match target {
            Target::Existing {
                uuid,
                telescope: Some(telescope),
            } => {
                debug!(file = %self.tracker.prefix(), dataset = %uuid, %telescope, "updating dataset telescope");
                let payload = DatasetPayload::telescope(telescope);
                self.api
                    .update_dataset(&uuid, &payload)
                    .await
                    .map_err(|e| UploadError::DatasetPreparation(e.to_string()))?
            }
            Target::Existing {
                uuid,
                telescope: None,
            } => {
                debug!(file = %self.tracker.prefix(), dataset = %uuid, "reading dataset");
                self.api
                    .read_dataset(&uuid)
                    .await
                    .map_err(|e| UploadError::DatasetPreparation(e.to_string()))?
            }
            Target::Create { name, telescope } => {
                debug!(file = %self.tracker.prefix(), dataset = %name, "creating dataset");
                let payload = DatasetPayload::create(name, telescope);
                let record = self
                    .api
                    .create_dataset(&payload)
                    .await
                    .map_err(|e| UploadError::DatasetPreparation(e.to_string()))?;
                self.context.write().await.update_dataset(&record);
                record
            }
        };

        Ok(record.uuid)
    }
}
