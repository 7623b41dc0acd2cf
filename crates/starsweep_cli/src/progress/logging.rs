use starsweep::SweepProgress;

/// Logging reporter using tracing for structured output.
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, event: SweepProgress) {
        match event {
            SweepProgress::HarvestStarted {
                start_page,
                per_page,
                detail,
            } => {
                tracing::info!(start_page, per_page, detail = %detail, "Harvesting starred repositories");
            }

            SweepProgress::FetchingPage { page } => {
                tracing::debug!(page, "Fetching page");
            }

            SweepProgress::FetchedPage {
                page,
                count,
                total_so_far,
            } => {
                tracing::info!(page, count, total_so_far, "Fetched page");
            }

            SweepProgress::PageFetchRetry {
                page,
                retry_after_ms,
                attempt,
            } => {
                tracing::warn!(page, retry_after_ms, attempt, "Rate limited, backing off");
            }

            SweepProgress::DetailUnavailable { full_name, error } => {
                tracing::warn!(repo = %full_name, error = %error, "Detail unavailable");
            }

            SweepProgress::DuplicateSkipped { full_name, page } => {
                tracing::warn!(repo = %full_name, page, "Skipped duplicate");
            }

            SweepProgress::QuotaLow { remaining, wait_ms } => {
                tracing::warn!(remaining, wait_ms, "Quota low, waiting for reset");
            }

            SweepProgress::HarvestComplete { total, pages } => {
                tracing::info!(total, pages, "Harvest complete");
            }

            SweepProgress::HarvestAborted {
                page,
                error,
                total_so_far,
            } => {
                tracing::error!(page, total_so_far, error = %error, "Harvest aborted");
            }

            SweepProgress::HarvestInterrupted {
                next_page,
                total_so_far,
            } => {
                tracing::warn!(next_page, total_so_far, "Harvest interrupted");
            }

            SweepProgress::RevokingRepos {
                flagged,
                resume_from,
                dry_run,
            } => {
                tracing::info!(flagged, resume_from, dry_run, "Revoking stars");
            }

            SweepProgress::CheckpointReplayed {
                count,
                overridden_keep,
            } => {
                if overridden_keep > 0 {
                    tracing::warn!(count, overridden_keep, "Replayed checkpoint, keep rows overridden");
                } else {
                    tracing::info!(count, "Replayed checkpoint");
                }
            }

            SweepProgress::RevokedRepo { full_name, dry_run } => {
                if dry_run {
                    tracing::info!(repo = %full_name, "Would revoke");
                } else {
                    tracing::info!(repo = %full_name, "Revoked");
                }
            }

            SweepProgress::RevokeError { full_name, error } => {
                tracing::warn!(repo = %full_name, error = %error, "Failed to revoke");
            }

            SweepProgress::RevocationInterrupted { next_index } => {
                tracing::warn!(next_index, "Revocation interrupted");
            }

            SweepProgress::RevocationComplete { revoked, failed } => {
                tracing::info!(revoked, failed, "Revocation complete");
            }

            SweepProgress::StoreSaved { path, count } => {
                tracing::info!(path = %path, count, "Saved records");
            }

            SweepProgress::Warning { message } => {
                tracing::warn!(message = %message, "Warning");
            }

            _ => {}
        }
    }
}

impl Default for LoggingReporter {
    fn default() -> Self {
        Self::new()
    }
}
