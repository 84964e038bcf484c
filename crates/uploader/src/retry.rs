//! Single-retry policy shared by the upload phases.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::error::UploadError;

/// Pause between the first and second attempt of a phase.
pub const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Attempts per phase: the first one plus one retry.
pub const MAX_ATTEMPTS: u32 = 2;

/// A step of the upload flow that owns a retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Dataset,
    Upload,
    Metadata,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dataset => "dataset",
            Self::Upload => "upload",
            Self::Metadata => "metadata",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of the pause between attempts.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Sleeps on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Fixed-delay retry: at most `max_attempts` runs of a phase.
///
/// Only errors belonging to the phase being run are retried; anything else
/// is returned on the spot.
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
    sleeper: Arc<dyn Sleeper>,
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(MAX_ATTEMPTS, RETRY_DELAY)
    }
}

impl RetryPolicy {
    /// Creates a policy sleeping on the tokio timer. `max_attempts` is at least 1.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replaces the pause source (tests inject a recording fake).
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Runs `op` until it succeeds, fails with a non-retryable error, or the
    /// attempts are used up. The last error is returned as is.
    pub async fn run<T, F, Fut>(&self, phase: Phase, mut op: F) -> Result<T, UploadError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, UploadError>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.max_attempts && err.retryable_in() == Some(phase) => {
                    warn!(
                        %phase,
                        attempt,
                        delay_ms = self.delay.as_millis() as u64,
                        error = %err,
                        "phase failed, retrying"
                    );
                    self.sleeper.sleep(self.delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
