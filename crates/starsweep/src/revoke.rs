//! Removes stars the operator flagged in the record store.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::forge::{ForgeClient, short_error_message};
use crate::progress::{ProgressCallback, SweepProgress, emit};
use crate::rate_limit::{RateGovernor, RequestKind};
use crate::record::Disposition;
use crate::store::{RecordStore, StoreError};

/// Settings for one revocation pass.
#[derive(Debug, Clone, Default)]
pub struct RevokeOptions {
    /// Records before this index are treated as already revoked and are
    /// never sent to the API.
    pub resume_from: usize,
    /// Report what would be revoked without calling the API or writing the
    /// store.
    pub dry_run: bool,
    /// Checked between records.
    pub stop: Option<Arc<AtomicBool>>,
}

/// Counts from a revocation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevocationReport {
    /// Records moved to `revoked` by a successful API call this run. In a dry
    /// run, records that would have been.
    pub revoked: usize,
    /// Flagged records whose API call failed; they stay `revoke`.
    pub failed: usize,
    /// Records before the checkpoint, forced to `revoked`.
    pub replayed: usize,
    /// Replayed records that were `keep` before being forced.
    pub overridden_keep: usize,
    /// Index the pass stopped at when interrupted.
    pub interrupted_at: Option<usize>,
    pub dry_run: bool,
}

impl RevocationReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.interrupted_at.is_none()
    }
}

fn stop_requested(stop: Option<&Arc<AtomicBool>>) -> bool {
    stop.is_some_and(|flag| flag.load(Ordering::SeqCst))
}

/// Revoke every star flagged `revoke` in `store`.
///
/// Per-record API failures are counted, not returned. The store is written
/// back once, after the pass (including an interrupted one); only load and
/// save failures surface as errors.
pub async fn process_revocations(
    client: &ForgeClient,
    governor: &RateGovernor,
    store: &RecordStore,
    options: &RevokeOptions,
    on_progress: Option<&ProgressCallback>,
) -> Result<RevocationReport, StoreError> {
    let mut records = store.load()?;
    let mut report = RevocationReport {
        dry_run: options.dry_run,
        ..RevocationReport::default()
    };

    let resume_from = if options.resume_from > records.len() {
        let message = format!(
            "resume index {} is past the last record ({}), replaying all",
            options.resume_from,
            records.len()
        );
        tracing::warn!("{}", message);
        emit(on_progress, SweepProgress::Warning { message });
        records.len()
    } else {
        options.resume_from
    };

    for record in &mut records[..resume_from] {
        if record.disposition == Disposition::Keep {
            tracing::warn!(
                repo = %record.full_name,
                "record marked keep sits before the resume index, marking revoked"
            );
            report.overridden_keep += 1;
        }
        record.disposition = Disposition::Revoked;
        report.replayed += 1;
    }
    if resume_from > 0 {
        emit(
            on_progress,
            SweepProgress::CheckpointReplayed {
                count: report.replayed,
                overridden_keep: report.overridden_keep,
            },
        );
    }

    let flagged = records[resume_from..]
        .iter()
        .filter(|r| r.disposition == Disposition::Revoke)
        .count();
    emit(
        on_progress,
        SweepProgress::RevokingRepos {
            flagged,
            resume_from,
            dry_run: options.dry_run,
        },
    );
    tracing::info!(flagged, resume_from, dry_run = options.dry_run, "starting revocation pass");

    for index in resume_from..records.len() {
        if stop_requested(options.stop.as_ref()) {
            report.interrupted_at = Some(index);
            emit(
                on_progress,
                SweepProgress::RevocationInterrupted { next_index: index },
            );
            tracing::warn!(next_index = index, "revocation interrupted");
            break;
        }

        let record = &mut records[index];
        if record.disposition != Disposition::Revoke {
            continue;
        }

        if options.dry_run {
            report.revoked += 1;
            emit(
                on_progress,
                SweepProgress::RevokedRepo {
                    full_name: record.full_name.clone(),
                    dry_run: true,
                },
            );
            continue;
        }

        governor.before_request(RequestKind::Write).await;
        match client.unstar(&record.full_name).await {
            Ok(()) => {
                record.disposition = Disposition::Revoked;
                report.revoked += 1;
                tracing::info!(repo = %record.full_name, index, "revoked star");
                emit(
                    on_progress,
                    SweepProgress::RevokedRepo {
                        full_name: record.full_name.clone(),
                        dry_run: false,
                    },
                );
            }
            Err(e) => {
                report.failed += 1;
                tracing::warn!(repo = %record.full_name, index, error = %e, "failed to revoke star");
                emit(
                    on_progress,
                    SweepProgress::RevokeError {
                        full_name: record.full_name.clone(),
                        error: short_error_message(&e),
                    },
                );
            }
        }
    }

    if !options.dry_run {
        store.save(&records)?;
        emit(
            on_progress,
            SweepProgress::StoreSaved {
                path: store.path().display().to_string(),
                count: records.len(),
            },
        );
    }

    emit(
        on_progress,
        SweepProgress::RevocationComplete {
            revoked: report.revoked,
            failed: report.failed,
        },
    );
    tracing::info!(
        revoked = report.revoked,
        failed = report.failed,
        replayed = report.replayed,
        "revocation pass finished"
    );

    Ok(report)
}
