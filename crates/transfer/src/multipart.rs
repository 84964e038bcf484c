use std::io::Cursor;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};

use crate::TransferError;
use crate::progress::{ProgressCallback, ProgressReader};

/// Content type declared for the file part.
pub const FILE_CONTENT_TYPE: &str = "application/octet-stream";

type BodyReader = Box<dyn AsyncRead + Send + Sync + Unpin>;

/// A `multipart/form-data` body with a `dataset` field and a `file` part.
///
/// The framing is built up front; the file content is read from disk as the
/// body is consumed. Dropping the body closes the file.
pub struct MultipartBody {
    boundary: String,
    dataset: String,
    file_name: String,
    file_size: u64,
    content_length: u64,
    reader: ProgressReader<BodyReader>,
}

impl MultipartBody {
    /// Opens `path` and frames it for upload into `dataset`.
    ///
    /// `on_progress` is called after every read of the body, measured against
    /// the file size.
    pub async fn open(
        path: &Path,
        dataset: &str,
        on_progress: Option<ProgressCallback>,
    ) -> Result<Self, TransferError> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| TransferError::InvalidPath(path.display().to_string()))?;

        let file = tokio::fs::File::open(path).await?;
        let file_size = file.metadata().await?.len();

        let boundary = format!("oort-{}", uuid::Uuid::new_v4().simple());
        let head = encode_head(&boundary, dataset, &file_name);
        let tail = encode_tail(&boundary);
        let content_length = head.len() as u64 + file_size + tail.len() as u64;

        let chained = Cursor::new(head).chain(file).chain(Cursor::new(tail));
        let reader = ProgressReader::new(Box::new(chained) as BodyReader, file_size, on_progress);

        Ok(Self {
            boundary,
            dataset: dataset.to_string(),
            file_name,
            file_size,
            content_length,
            reader,
        })
    }

    /// Value for the request's `Content-Type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Exact number of bytes the body will produce.
    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Dataset UUID carried in the `dataset` field.
    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    /// Base name of the uploaded file.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }
}

impl AsyncRead for MultipartBody {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().reader).poll_read(cx, buf)
    }
}

fn encode_head(boundary: &str, dataset: &str, file_name: &str) -> Vec<u8> {
    format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"dataset\"\r\n\r\n\
         {dataset}\r\n\
         --{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n\
         Content-Type: {FILE_CONTENT_TYPE}\r\n\r\n",
        escape_quoted(file_name)
    )
    .into_bytes()
}

fn encode_tail(boundary: &str) -> Vec<u8> {
    format!("\r\n--{boundary}--\r\n").into_bytes()
}

/// Percent-encodes the characters that would break a quoted header value.
fn escape_quoted(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
