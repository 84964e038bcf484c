//! The API client trait.

use std::future::Future;
use std::pin::Pin;

use oort_protocol::{DataFileMetadata, DataFileRecord, DatasetPayload, DatasetRecord};
use oort_transfer::MultipartBody;

use crate::error::ApiError;

/// Boxed future returned by every [`ArcsecondApi`] call.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send + 'a>>;

/// Abstract connection to the remote API.
///
/// [`HttpClient`](crate::HttpClient) is the production implementation. Using
/// a trait keeps the upload logic decoupled from transport and testable with
/// mocks.
pub trait ArcsecondApi: Send + Sync {
    /// Reads a dataset, confirming it exists.
    fn read_dataset<'a>(&'a self, uuid: &'a str) -> ApiFuture<'a, DatasetRecord>;

    /// Creates a dataset.
    fn create_dataset<'a>(&'a self, payload: &'a DatasetPayload) -> ApiFuture<'a, DatasetRecord>;

    /// Partially updates a dataset.
    fn update_dataset<'a>(
        &'a self,
        uuid: &'a str,
        payload: &'a DatasetPayload,
    ) -> ApiFuture<'a, DatasetRecord>;

    /// Creates a data file by streaming `body`.
    fn create_datafile(&self, body: MultipartBody) -> ApiFuture<'_, DataFileRecord>;

    /// Attaches metadata to an existing data file.
    fn update_datafile<'a>(
        &'a self,
        pk: i64,
        metadata: &'a DataFileMetadata,
    ) -> ApiFuture<'a, DataFileRecord>;
}
