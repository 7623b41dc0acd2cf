//! Bounded retry for rate-limited page fetches.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};

use crate::forge::{ForgeError, short_error_message};
use crate::progress::{ProgressCallback, SweepProgress, emit};

/// Initial backoff after a rate-limited response.
pub const INITIAL_BACKOFF_MS: u64 = 1_000;
/// Cap on a single backoff delay.
pub const MAX_BACKOFF_MS: u64 = 60_000;
/// Retries before a page failure aborts the harvest.
pub const MAX_PAGE_RETRIES: usize = 3;

/// Configuration for retry operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    pub min_delay: Duration,
    pub max_delay: Duration,
    /// Zero disables retrying.
    pub max_retries: usize,
    pub with_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(INITIAL_BACKOFF_MS),
            max_delay: Duration::from_millis(MAX_BACKOFF_MS),
            max_retries: MAX_PAGE_RETRIES,
            with_jitter: true,
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn new(min_delay: Duration, max_delay: Duration, max_retries: usize) -> Self {
        Self {
            min_delay,
            max_delay,
            max_retries,
            with_jitter: true,
        }
    }

    /// A single attempt, no retries.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.with_jitter = jitter;
        self
    }

    #[must_use]
    pub fn into_backoff(self) -> ExponentialBuilder {
        let mut builder = ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries);

        if self.with_jitter {
            builder = builder.with_jitter();
        }

        builder
    }
}

/// Run a page fetch, retrying while the forge answers with a rate-limit
/// status.
///
/// Every retry is reported as [`SweepProgress::PageFetchRetry`]. Other
/// errors, and the last rate-limit error once retries run out, are returned
/// unchanged.
pub async fn retry_page<T, F, Fut>(
    mut operation: F,
    config: &RetryConfig,
    page: u32,
    on_progress: Option<&ProgressCallback>,
) -> Result<T, ForgeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ForgeError>>,
{
    let attempt = AtomicU32::new(0);

    let op = || {
        attempt.fetch_add(1, Ordering::SeqCst);
        operation()
    };

    op.retry(config.clone().into_backoff())
        .notify(|err: &ForgeError, dur: Duration| {
            let current = attempt.load(Ordering::SeqCst);
            emit(
                on_progress,
                SweepProgress::PageFetchRetry {
                    page,
                    retry_after_ms: dur.as_millis() as u64,
                    attempt: current,
                },
            );
            tracing::debug!(
                page,
                attempt = current,
                delay = ?dur,
                error = %short_error_message(err),
                "page fetch rate limited, retrying"
            );
        })
        .when(ForgeError::is_rate_limited)
        .await
}
