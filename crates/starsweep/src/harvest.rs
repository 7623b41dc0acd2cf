//! Walks the starred listing page by page and builds one record per
//! repository.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::forge::{
    DetailEnricher, DetailSource, Enrichment, ForgeClient, ForgeError, PageFetcher,
    short_error_message,
};
use crate::progress::{ProgressCallback, SweepProgress, emit};
use crate::rate_limit::{RateGovernor, RequestKind};
use crate::record::StarRecord;
use crate::retry::{RetryConfig, retry_page};

/// Settings for one harvest run.
#[derive(Debug, Clone)]
pub struct HarvestOptions {
    /// First page to request. Pages are 1-based.
    pub start_page: u32,
    pub per_page: u32,
    pub detail: DetailSource,
    pub retry: RetryConfig,
    /// Checked between pages; when set the harvest stops cleanly.
    pub stop: Option<Arc<AtomicBool>>,
}

impl Default for HarvestOptions {
    fn default() -> Self {
        Self {
            start_page: 1,
            per_page: crate::forge::MAX_PER_PAGE,
            detail: DetailSource::default(),
            retry: RetryConfig::default(),
            stop: None,
        }
    }
}

/// How a harvest ended.
#[derive(Debug)]
pub enum HarvestStatus {
    /// An empty page was reached.
    Complete,
    /// A page could not be fetched.
    Aborted { page: u32, error: ForgeError },
    /// The stop flag was raised before `next_page` was requested.
    Interrupted { next_page: u32 },
}

/// Records gathered by a harvest and how it ended.
#[derive(Debug)]
pub struct HarvestOutcome {
    /// Records in API order across pages.
    pub records: Vec<StarRecord>,
    /// Non-empty pages fetched.
    pub pages_fetched: u32,
    pub status: HarvestStatus,
    /// Page a follow-up harvest should start from.
    pub next_page: u32,
}

impl HarvestOutcome {
    /// Whether the run stopped before the listing was exhausted.
    pub fn is_partial(&self) -> bool {
        !matches!(self.status, HarvestStatus::Complete)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn stop_requested(stop: Option<&Arc<AtomicBool>>) -> bool {
    stop.is_some_and(|flag| flag.load(Ordering::SeqCst))
}

/// Harvest every starred repository from `options.start_page` onwards.
///
/// Never fails: page errors end the run as [`HarvestStatus::Aborted`] with
/// everything gathered so far, and detail errors leave an empty description.
pub async fn harvest_stars(
    client: &ForgeClient,
    governor: &RateGovernor,
    options: &HarvestOptions,
    on_progress: Option<&ProgressCallback>,
) -> HarvestOutcome {
    let fetcher = PageFetcher::new(client);
    let enricher = DetailEnricher::new(client, options.detail);
    let per_page = options.per_page;

    emit(
        on_progress,
        SweepProgress::HarvestStarted {
            start_page: options.start_page.max(1),
            per_page,
            detail: options.detail.to_string(),
        },
    );
    tracing::info!(
        start_page = options.start_page.max(1),
        per_page,
        detail = %options.detail,
        "starting harvest"
    );

    let mut records: Vec<StarRecord> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut pages_fetched = 0u32;
    let mut page = options.start_page.max(1);

    let status = loop {
        if stop_requested(options.stop.as_ref()) {
            break HarvestStatus::Interrupted { next_page: page };
        }

        emit(on_progress, SweepProgress::FetchingPage { page });

        let fetched = retry_page(
            || async move {
                governor.before_request(RequestKind::Read).await;
                fetcher.fetch_page(page, per_page).await
            },
            &options.retry,
            page,
            on_progress,
        )
        .await;

        let summaries = match fetched {
            Ok(summaries) => summaries,
            Err(error) => break HarvestStatus::Aborted { page, error },
        };

        if summaries.is_empty() {
            break HarvestStatus::Complete;
        }
        pages_fetched += 1;

        let mut count = 0usize;
        for summary in &summaries {
            if !seen.insert(summary.full_name.clone()) {
                tracing::warn!(repo = %summary.full_name, page, "repository listed twice, skipping");
                emit(
                    on_progress,
                    SweepProgress::DuplicateSkipped {
                        full_name: summary.full_name.clone(),
                        page,
                    },
                );
                continue;
            }

            if options.detail.needs_request() {
                governor.before_request(RequestKind::Read).await;
            }
            let enrichment = enricher
                .enrich(
                    &summary.owner.login,
                    &summary.name,
                    summary.description.as_deref(),
                )
                .await;

            if let Enrichment::Unavailable(e) = &enrichment {
                emit(
                    on_progress,
                    SweepProgress::DetailUnavailable {
                        full_name: summary.full_name.clone(),
                        error: short_error_message(e),
                    },
                );
            }

            records.push(StarRecord::from_summary(summary, enrichment.into_text()));
            count += 1;
        }

        emit(
            on_progress,
            SweepProgress::FetchedPage {
                page,
                count,
                total_so_far: records.len(),
            },
        );

        governor.after_page(client, on_progress).await;
        page = page.saturating_add(1);
    };

    let total = records.len();
    match &status {
        HarvestStatus::Complete => {
            tracing::info!(total, pages = pages_fetched, "harvest complete");
            emit(
                on_progress,
                SweepProgress::HarvestComplete {
                    total,
                    pages: pages_fetched,
                },
            );
        }
        HarvestStatus::Aborted { page, error } => {
            tracing::error!(page, total, error = %error, "harvest aborted");
            emit(
                on_progress,
                SweepProgress::HarvestAborted {
                    page: *page,
                    error: short_error_message(error),
                    total_so_far: total,
                },
            );
        }
        HarvestStatus::Interrupted { next_page } => {
            tracing::warn!(next_page, total, "harvest interrupted");
            emit(
                on_progress,
                SweepProgress::HarvestInterrupted {
                    next_page: *next_page,
                    total_so_far: total,
                },
            );
        }
    }

    HarvestOutcome {
        records,
        pages_fetched,
        status,
        next_page: page,
    }
}
