//! Progress events for harvest and revocation runs.
//!
//! The library reports what it is doing through these events; the CLI turns
//! them into progress bars or structured log lines.

/// Progress events emitted during a run.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum SweepProgress {
    /// Starting a harvest.
    HarvestStarted {
        /// First page requested.
        start_page: u32,
        per_page: u32,
        /// Name of the detail source in use.
        detail: String,
    },

    /// Requesting a page of starred repositories.
    FetchingPage { page: u32 },

    /// A page was fetched and all of its records were built.
    FetchedPage {
        page: u32,
        /// Records taken from this page.
        count: usize,
        /// Running total across the harvest.
        total_so_far: usize,
    },

    /// A page fetch hit a rate-limit status and will be retried.
    PageFetchRetry {
        page: u32,
        retry_after_ms: u64,
        attempt: u32,
    },

    /// A record was built without its detail.
    DetailUnavailable { full_name: String, error: String },

    /// The same repository appeared twice in one harvest; the later copy was
    /// dropped.
    DuplicateSkipped { full_name: String, page: u32 },

    /// Core quota below the floor; about to wait for the reset.
    QuotaLow { remaining: usize, wait_ms: u64 },

    /// Harvest reached an empty page.
    HarvestComplete { total: usize, pages: u32 },

    /// Harvest stopped on a page failure; accumulated records are kept.
    HarvestAborted {
        page: u32,
        error: String,
        total_so_far: usize,
    },

    /// Harvest stopped on request before fetching `next_page`.
    HarvestInterrupted { next_page: u32, total_so_far: usize },

    /// Starting a revocation pass.
    RevokingRepos {
        /// Records flagged `revoke` at or after the checkpoint.
        flagged: usize,
        resume_from: usize,
        dry_run: bool,
    },

    /// Records below the checkpoint were marked revoked without API calls.
    CheckpointReplayed {
        count: usize,
        /// How many of them were `keep` before being overwritten.
        overridden_keep: usize,
    },

    /// A star was removed (or would be, in a dry run).
    RevokedRepo { full_name: String, dry_run: bool },

    /// Removing a star failed; the record stays flagged.
    RevokeError { full_name: String, error: String },

    /// Revocation stopped on request before `next_index`.
    RevocationInterrupted { next_index: usize },

    /// Revocation pass finished.
    RevocationComplete { revoked: usize, failed: usize },

    /// Records written to the store.
    StoreSaved { path: String, count: usize },

    /// Warning message (non-fatal).
    Warning { message: String },
}

/// Callback for progress updates.
pub type ProgressCallback = Box<dyn Fn(SweepProgress) + Send + Sync>;

/// Emit a progress event if a callback is provided.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: SweepProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn emit_invokes_callback() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);

        let callback: ProgressCallback = Box::new(move |_event| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        emit(Some(&callback), SweepProgress::FetchingPage { page: 1 });
        emit(
            Some(&callback),
            SweepProgress::HarvestComplete {
                total: 10,
                pages: 1,
            },
        );

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn emit_without_callback_is_a_no_op() {
        emit(None, SweepProgress::FetchingPage { page: 1 });
    }
}
