use std::io::Write;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, ReadBuf};

/// Width of the textual progress bar, in cells.
pub const PROGRESS_BAR_WIDTH: usize = 40;

/// Callback invoked after every read of a monitored body.
pub type ProgressCallback = Box<dyn Fn(Progress) + Send + Sync>;

/// Snapshot of how far a monitored body has been read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Bytes read so far, multipart framing included.
    pub bytes_read: u64,
    /// Size of the file being sent.
    pub total_bytes: u64,
}

impl Progress {
    /// Completed fraction in `[0.0, 1.0]`.
    pub fn fraction(&self) -> f64 {
        transfer_fraction(self.bytes_read, self.total_bytes)
    }

    /// Completed percentage in `[0.0, 100.0]`.
    pub fn percentage(&self) -> f64 {
        self.fraction() * 100.0
    }
}

/// Returns `min(bytes_read / total_bytes, 1.0)`.
///
/// `bytes_read` counts the multipart framing too, so it overshoots the file
/// size near the end; the clamp absorbs that. An empty file is complete.
pub fn transfer_fraction(bytes_read: u64, total_bytes: u64) -> f64 {
    if total_bytes == 0 {
        return 1.0;
    }
    (bytes_read as f64 / total_bytes as f64).min(1.0)
}

/// Renders `[#####     ] 12.5%` with a [`PROGRESS_BAR_WIDTH`]-cell bar.
pub fn render_progress_bar(fraction: f64) -> String {
    let fraction = fraction.clamp(0.0, 1.0);
    let filled = ((fraction * PROGRESS_BAR_WIDTH as f64).round() as usize).min(PROGRESS_BAR_WIDTH);
    format!(
        "[{}{}] {:.1}%",
        "#".repeat(filled),
        " ".repeat(PROGRESS_BAR_WIDTH - filled),
        fraction * 100.0
    )
}

/// Callback printing the progress bar to stdout, rewriting the same line.
pub fn terminal_progress() -> ProgressCallback {
    Box::new(|progress| {
        let mut stdout = std::io::stdout().lock();
        let _ = write!(stdout, "{}\r", render_progress_bar(progress.fraction()));
        let _ = stdout.flush();
    })
}

/// Wraps a reader and reports progress after every successful read.
pub struct ProgressReader<R> {
    inner: R,
    bytes_read: u64,
    total_bytes: u64,
    callback: Option<ProgressCallback>,
}

impl<R> ProgressReader<R> {
    /// Monitors `inner`; `total_bytes` is the size progress is measured against.
    pub fn new(inner: R, total_bytes: u64, callback: Option<ProgressCallback>) -> Self {
        Self {
            inner,
            bytes_read: 0,
            total_bytes,
            callback,
        }
    }

    /// Current progress snapshot.
    pub fn progress(&self) -> Progress {
        Progress {
            bytes_read: self.bytes_read,
            total_bytes: self.total_bytes,
        }
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for ProgressReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        let poll = Pin::new(&mut this.inner).poll_read(cx, buf);

        if let Poll::Ready(Ok(())) = &poll {
            let read = buf.filled().len() - before;
            this.bytes_read += read as u64;
            if let Some(callback) = &this.callback {
                callback(this.progress());
            }
        }

        poll
    }
}
