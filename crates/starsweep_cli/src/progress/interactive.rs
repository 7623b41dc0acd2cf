use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
#[cfg(test)]
use indicatif::ProgressDrawTarget;
use starsweep::SweepProgress;

const TICK: Duration = Duration::from_millis(100);

/// Bars for the two phases, created lazily.
#[derive(Default)]
struct ProgressState {
    /// Spinner counting harvested records; the total is unknown up front.
    harvest_bar: Option<ProgressBar>,
    /// Bar over the records flagged for revocation.
    revoke_bar: Option<ProgressBar>,
}

/// Interactive progress reporter using indicatif.
pub struct InteractiveReporter {
    multi: MultiProgress,
    state: Mutex<ProgressState>,
}

impl InteractiveReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            state: Mutex::new(ProgressState::default()),
        }
    }

    /// Reporter whose bars draw nowhere; their state is still tracked.
    #[cfg(test)]
    pub(crate) fn hidden() -> Self {
        Self {
            multi: MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
            state: Mutex::new(ProgressState::default()),
        }
    }

    pub fn handle(&self, event: SweepProgress) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        match event {
            SweepProgress::HarvestStarted { detail, .. } => {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(Self::counter_style());
                pb.set_prefix(format!("{:10}", "Harvest"));
                pb.enable_steady_tick(TICK);
                pb.set_message(format!("Fetching starred repositories ({} detail)...", detail));
                state.harvest_bar = Some(pb);
            }
            SweepProgress::FetchingPage { page } => {
                if let Some(ref pb) = state.harvest_bar {
                    pb.set_message(format!("Page {}...", page));
                }
            }
            SweepProgress::FetchedPage {
                page, total_so_far, ..
            } => {
                if let Some(ref pb) = state.harvest_bar {
                    pb.set_position(total_so_far as u64);
                    pb.set_message(format!("Page {} done", page));
                }
            }
            SweepProgress::PageFetchRetry {
                page,
                retry_after_ms,
                attempt,
            } => {
                if let Some(ref pb) = state.harvest_bar {
                    pb.set_message(format!(
                        "⏳ page {} rate limited, retry {} in {:.1}s",
                        page,
                        attempt,
                        retry_after_ms as f64 / 1000.0
                    ));
                }
            }
            SweepProgress::QuotaLow { remaining, wait_ms } => {
                let bar = state.revoke_bar.as_ref().or(state.harvest_bar.as_ref());
                if let Some(pb) = bar {
                    pb.set_message(format!(
                        "⏳ {} requests left, waiting {:.0}s for reset",
                        remaining,
                        wait_ms as f64 / 1000.0
                    ));
                }
            }
            SweepProgress::DetailUnavailable { full_name, error } => {
                drop(state);
                self.multi
                    .println(format!("⚠ {}: detail unavailable ({})", full_name, error))
                    .ok();
            }
            SweepProgress::DuplicateSkipped { full_name, page } => {
                drop(state);
                self.multi
                    .println(format!("⚠ {} listed twice (page {}), skipped", full_name, page))
                    .ok();
            }
            SweepProgress::HarvestComplete { total, pages } => {
                if let Some(ref pb) = state.harvest_bar {
                    pb.set_position(total as u64);
                    pb.finish_with_message(format!("✓ {} repos from {} pages", total, pages));
                }
            }
            SweepProgress::HarvestAborted {
                page,
                error,
                total_so_far,
            } => {
                if let Some(ref pb) = state.harvest_bar {
                    pb.abandon_with_message(format!(
                        "✗ page {} failed after {} repos: {}",
                        page, total_so_far, error
                    ));
                }
            }
            SweepProgress::HarvestInterrupted {
                next_page,
                total_so_far,
            } => {
                if let Some(ref pb) = state.harvest_bar {
                    pb.abandon_with_message(format!(
                        "■ stopped with {} repos, resume at page {}",
                        total_so_far, next_page
                    ));
                }
            }
            SweepProgress::CheckpointReplayed {
                count,
                overridden_keep,
            } => {
                drop(state);
                let msg = if overridden_keep > 0 {
                    format!(
                        "⚠ {} rows before the resume index marked revoked ({} were keep)",
                        count, overridden_keep
                    )
                } else {
                    format!("· {} rows before the resume index marked revoked", count)
                };
                self.multi.println(msg).ok();
            }
            SweepProgress::RevokingRepos {
                flagged, dry_run, ..
            } => {
                let pb = self.multi.add(ProgressBar::new(flagged as u64));
                pb.set_style(Self::bar_style());
                pb.set_prefix(format!("{:10}", "Revoke"));
                let action = if dry_run { "Checking" } else { "Revoking" };
                pb.set_message(format!("{}...", action));
                state.revoke_bar = Some(pb);
            }
            SweepProgress::RevokedRepo { full_name, dry_run } => {
                if let Some(ref pb) = state.revoke_bar {
                    pb.inc(1);
                    let symbol = if dry_run { "·" } else { "☆" };
                    pb.set_message(format!("{} {}", symbol, full_name));
                }
            }
            SweepProgress::RevokeError { full_name, error } => {
                if let Some(ref pb) = state.revoke_bar {
                    pb.inc(1);
                    pb.set_message(format!("✗ {}: {}", full_name, error));
                }
            }
            SweepProgress::RevocationInterrupted { next_index } => {
                if let Some(ref pb) = state.revoke_bar {
                    pb.abandon_with_message(format!("■ stopped at row {}", next_index));
                }
            }
            SweepProgress::RevocationComplete { revoked, failed } => {
                if let Some(ref pb) = state.revoke_bar
                    && !pb.is_finished()
                {
                    let msg = if failed > 0 {
                        format!("✓ {} revoked, {} failed", revoked, failed)
                    } else {
                        format!("✓ {} revoked", revoked)
                    };
                    pb.finish_with_message(msg);
                }
            }
            SweepProgress::StoreSaved { path, count } => {
                drop(state);
                self.multi
                    .println(format!("✓ saved {} rows to {}", count, path))
                    .ok();
            }
            SweepProgress::Warning { message } => {
                drop(state);
                self.multi.println(format!("⚠ {}", message)).ok();
            }
            _ => {}
        }
    }

    pub fn finish(&self) {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        for pb in [&state.harvest_bar, &state.revoke_bar].into_iter().flatten() {
            if !pb.is_finished() {
                pb.finish();
            }
        }
    }

    fn counter_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{prefix:.bold.cyan} {spinner:.green} {pos:>5} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos:>3}/{len:3} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░")
    }
}

impl Default for InteractiveReporter {
    fn default() -> Self {
        Self::new()
    }
}
