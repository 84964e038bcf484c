//! Streaming multipart bodies for single-file uploads.
//!
//! The file is read from disk while the body is consumed, never buffered
//! whole. A [`ProgressReader`] sits on the read cursor and reports how much
//! of the file has gone out.

mod multipart;
mod progress;

pub use multipart::{FILE_CONTENT_TYPE, MultipartBody};
pub use progress::{
    PROGRESS_BAR_WIDTH, Progress, ProgressCallback, ProgressReader, render_progress_bar,
    terminal_progress, transfer_fraction,
};

/// Errors produced while preparing an upload body.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid path: {0}")]
    InvalidPath(String),
}
