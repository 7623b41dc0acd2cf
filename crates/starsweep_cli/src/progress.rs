//! Progress reporting for harvest and revocation runs.
//!
//! Two modes:
//! - Interactive mode (TTY): progress bars using indicatif
//! - Logging mode (non-TTY): structured logging using tracing

mod interactive;
mod logging;

use std::sync::Arc;

use console::Term;
use starsweep::{ProgressCallback, SweepProgress};

pub use interactive::InteractiveReporter;
pub use logging::LoggingReporter;

/// Progress reporter that handles both interactive and logging modes.
pub enum ProgressReporter {
    Interactive(InteractiveReporter),
    Logging(LoggingReporter),
}

impl ProgressReporter {
    /// Create a new progress reporter, auto-detecting TTY mode.
    pub fn new() -> Self {
        if Term::stdout().is_term() {
            Self::Interactive(InteractiveReporter::new())
        } else {
            Self::Logging(LoggingReporter::new())
        }
    }

    pub fn handle(&self, event: SweepProgress) {
        match self {
            Self::Interactive(r) => r.handle(event),
            Self::Logging(r) => r.handle(event),
        }
    }

    /// Convert to a callback for the library.
    pub fn as_callback(self: &Arc<Self>) -> ProgressCallback {
        let reporter = Arc::clone(self);
        Box::new(move |event| {
            reporter.handle(event);
        })
    }

    /// Finish any bars still running (interactive mode only).
    pub fn finish(&self) {
        if let Self::Interactive(r) = self {
            r.finish();
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn every_event() -> Vec<SweepProgress> {
        vec![
            SweepProgress::HarvestStarted {
                start_page: 1,
                per_page: 100,
                detail: "description".to_string(),
            },
            SweepProgress::FetchingPage { page: 1 },
            SweepProgress::FetchedPage {
                page: 1,
                count: 2,
                total_so_far: 2,
            },
            SweepProgress::PageFetchRetry {
                page: 2,
                retry_after_ms: 1500,
                attempt: 1,
            },
            SweepProgress::DetailUnavailable {
                full_name: "a/b".to_string(),
                error: "Unexpected HTTP status 404".to_string(),
            },
            SweepProgress::DuplicateSkipped {
                full_name: "a/b".to_string(),
                page: 2,
            },
            SweepProgress::QuotaLow {
                remaining: 12,
                wait_ms: 30_000,
            },
            SweepProgress::HarvestAborted {
                page: 2,
                error: "boom".to_string(),
                total_so_far: 2,
            },
            SweepProgress::CheckpointReplayed {
                count: 3,
                overridden_keep: 1,
            },
            SweepProgress::RevokingRepos {
                flagged: 2,
                resume_from: 3,
                dry_run: false,
            },
            SweepProgress::RevokedRepo {
                full_name: "a/b".to_string(),
                dry_run: false,
            },
            SweepProgress::RevokeError {
                full_name: "c/d".to_string(),
                error: "Unexpected HTTP status 404".to_string(),
            },
            SweepProgress::RevocationComplete {
                revoked: 1,
                failed: 1,
            },
            SweepProgress::StoreSaved {
                path: "stars.csv".to_string(),
                count: 5,
            },
            SweepProgress::Warning {
                message: "careful".to_string(),
            },
        ]
    }

    #[test]
    fn logging_reporter_handles_every_event() {
        let reporter = Arc::new(ProgressReporter::Logging(LoggingReporter::new()));
        let callback = reporter.as_callback();
        for event in every_event() {
            callback(event);
        }
        reporter.finish();
    }

    #[test]
    fn interactive_reporter_handles_every_event() {
        let reporter = ProgressReporter::Interactive(InteractiveReporter::hidden());
        for event in every_event() {
            reporter.handle(event);
        }
        reporter.handle(SweepProgress::HarvestInterrupted {
            next_page: 3,
            total_so_far: 2,
        });
        reporter.finish();
    }
}
