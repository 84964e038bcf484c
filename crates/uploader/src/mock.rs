//! Scripted [`ArcsecondApi`] used by the unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use tokio::io::AsyncReadExt;
use tokio::time::Instant;

use oort_api::{ApiError, ApiFuture, ArcsecondApi};
use oort_protocol::{DataFileMetadata, DataFileRecord, DatasetPayload, DatasetRecord};
use oort_transfer::MultipartBody;

/// UUID handed out by `create_dataset` when nothing was scripted.
pub(crate) const CREATED_DATASET: &str = "7d4a1c36-2f0b-4e49-8f55-9b8c1e0a6d21";

/// One recorded API call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    ReadDataset(String),
    CreateDataset(DatasetPayload),
    UpdateDataset(String, DatasetPayload),
    CreateDatafile {
        dataset: String,
        file_name: String,
        body: Vec<u8>,
    },
    UpdateDatafile(i64, DataFileMetadata),
}

type Queue<T> = Mutex<VecDeque<Result<T, ApiError>>>;

/// Answers from per-operation queues and falls back to a success when a
/// queue is empty. Every call is recorded with the time it was made.
#[derive(Default)]
pub(crate) struct MockApi {
    calls: Mutex<Vec<(Instant, Call)>>,
    read_dataset: Queue<DatasetRecord>,
    create_dataset: Queue<DatasetRecord>,
    update_dataset: Queue<DatasetRecord>,
    create_datafile: Queue<DataFileRecord>,
    update_datafile: Queue<DataFileRecord>,
}

impl MockApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_read_dataset(&self, result: Result<DatasetRecord, ApiError>) {
        self.read_dataset.lock().unwrap().push_back(result);
    }

    pub(crate) fn push_create_dataset(&self, result: Result<DatasetRecord, ApiError>) {
        self.create_dataset.lock().unwrap().push_back(result);
    }

    pub(crate) fn push_update_dataset(&self, result: Result<DatasetRecord, ApiError>) {
        self.update_dataset.lock().unwrap().push_back(result);
    }

    pub(crate) fn push_create_datafile(&self, result: Result<DataFileRecord, ApiError>) {
        self.create_datafile.lock().unwrap().push_back(result);
    }

    pub(crate) fn push_update_datafile(&self, result: Result<DataFileRecord, ApiError>) {
        self.update_datafile.lock().unwrap().push_back(result);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, call)| call.clone())
            .collect()
    }

    /// Times at which calls matching `filter` were made.
    pub(crate) fn call_times(&self, filter: impl Fn(&Call) -> bool) -> Vec<Instant> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, call)| filter(call))
            .map(|(at, _)| *at)
            .collect()
    }

    pub(crate) fn count(&self, filter: impl Fn(&Call) -> bool) -> usize {
        self.call_times(filter).len()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push((Instant::now(), call));
    }

    fn next<T>(queue: &Queue<T>, fallback: impl FnOnce() -> T) -> Result<T, ApiError> {
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(fallback()))
    }
}

/// An API error carrying `body` as the server message.
pub(crate) fn api_error(status: u16, body: &str) -> ApiError {
    ApiError::Api {
        status,
        body: body.to_string(),
    }
}

impl ArcsecondApi for MockApi {
    fn read_dataset<'a>(&'a self, uuid: &'a str) -> ApiFuture<'a, DatasetRecord> {
        Box::pin(async move {
            self.record(Call::ReadDataset(uuid.to_string()));
            Self::next(&self.read_dataset, || DatasetRecord {
                uuid: uuid.to_string(),
                name: String::new(),
                telescope: None,
            })
        })
    }

    fn create_dataset<'a>(&'a self, payload: &'a DatasetPayload) -> ApiFuture<'a, DatasetRecord> {
        Box::pin(async move {
            self.record(Call::CreateDataset(payload.clone()));
            Self::next(&self.create_dataset, || DatasetRecord {
                uuid: CREATED_DATASET.to_string(),
                name: payload.name.clone().unwrap_or_default(),
                telescope: payload.telescope.clone(),
            })
        })
    }

    fn update_dataset<'a>(
        &'a self,
        uuid: &'a str,
        payload: &'a DatasetPayload,
    ) -> ApiFuture<'a, DatasetRecord> {
        Box::pin(async move {
            self.record(Call::UpdateDataset(uuid.to_string(), payload.clone()));
            Self::next(&self.update_dataset, || DatasetRecord {
                uuid: uuid.to_string(),
                name: String::new(),
                telescope: payload.telescope.clone(),
            })
        })
    }

    fn create_datafile(&self, mut body: MultipartBody) -> ApiFuture<'_, DataFileRecord> {
        Box::pin(async move {
            let dataset = body.dataset().to_string();
            let file_name = body.file_name().to_string();
            let mut bytes = Vec::new();
            body.read_to_end(&mut bytes).await.map_err(|e| ApiError::Api {
                status: 0,
                body: e.to_string(),
            })?;
            self.record(Call::CreateDatafile {
                dataset: dataset.clone(),
                file_name,
                body: bytes,
            });
            Self::next(&self.create_datafile, || DataFileRecord {
                pk: 1,
                file: None,
                dataset: Some(dataset),
            })
        })
    }

    fn update_datafile<'a>(
        &'a self,
        pk: i64,
        metadata: &'a DataFileMetadata,
    ) -> ApiFuture<'a, DataFileRecord> {
        Box::pin(async move {
            self.record(Call::UpdateDatafile(pk, metadata.clone()));
            Self::next(&self.update_datafile, || DataFileRecord {
                pk,
                file: None,
                dataset: None,
            })
        })
    }
}
