//! HTTPS implementation of [`ArcsecondApi`].
//!
//! Async HTTP client using `reqwest` with API-key authentication. Data file
//! bodies are streamed, never buffered.

use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tokio_util::io::ReaderStream;
use tracing::debug;

use oort_protocol::{DataFileMetadata, DataFileRecord, DatasetPayload, DatasetRecord};
use oort_transfer::MultipartBody;

use crate::client::{ApiFuture, ArcsecondApi};
use crate::error::ApiError;

const DEFAULT_BASE_URL: &str = "https://api.arcsecond.io";

const AUTH_HEADER: &str = "x-arcsecond-api-authorization";

/// Remote API client over HTTPS.
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    organisation: Option<String>,
}

impl HttpClient {
    /// Creates a client, authenticated when `api_key` is given.
    pub fn new(api_key: Option<&str>) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            headers.insert(
                AUTH_HEADER,
                HeaderValue::from_str(&format!("Key {key}")).map_err(|_| ApiError::InvalidKey)?,
            );
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            organisation: None,
        })
    }

    /// Sets a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Scopes every request to an organisation subdomain.
    pub fn with_organisation(mut self, organisation: Option<String>) -> Self {
        self.organisation = organisation.filter(|o| !o.is_empty());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        match &self.organisation {
            Some(org) => format!("{}/{org}{path}", self.base_url),
            None => format!("{}{path}", self.base_url),
        }
    }

    /// Sends a request and decodes a JSON success body.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let resp = request.send().await?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), body = %body, "API request failed");
            return Err(ApiError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl ArcsecondApi for HttpClient {
    fn read_dataset<'a>(&'a self, uuid: &'a str) -> ApiFuture<'a, DatasetRecord> {
        Box::pin(async move {
            let url = self.url(&format!("/datasets/{uuid}/"));
            self.send(self.http.get(url)).await
        })
    }

    fn create_dataset<'a>(&'a self, payload: &'a DatasetPayload) -> ApiFuture<'a, DatasetRecord> {
        Box::pin(async move {
            let url = self.url("/datasets/");
            self.send(self.http.post(url).json(payload)).await
        })
    }

    fn update_dataset<'a>(
        &'a self,
        uuid: &'a str,
        payload: &'a DatasetPayload,
    ) -> ApiFuture<'a, DatasetRecord> {
        Box::pin(async move {
            let url = self.url(&format!("/datasets/{uuid}/"));
            self.send(self.http.patch(url).json(payload)).await
        })
    }

    fn create_datafile(&self, body: MultipartBody) -> ApiFuture<'_, DataFileRecord> {
        Box::pin(async move {
            debug!(
                file = body.file_name(),
                dataset = body.dataset(),
                bytes = body.content_length(),
                "streaming data file"
            );
            let url = self.url("/datafiles/");
            let request = self
                .http
                .post(url)
                .header(CONTENT_TYPE, body.content_type())
                .header(CONTENT_LENGTH, body.content_length())
                .body(reqwest::Body::wrap_stream(ReaderStream::new(body)));
            self.send(request).await
        })
    }

    fn update_datafile<'a>(
        &'a self,
        pk: i64,
        metadata: &'a DataFileMetadata,
    ) -> ApiFuture<'a, DataFileRecord> {
        Box::pin(async move {
            let url = self.url(&format!("/datafiles/{pk}/"));
            self.send(self.http.patch(url).json(metadata)).await
        })
    }
}
