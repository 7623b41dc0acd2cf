use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use console::Term;
use starsweep::{
    ForgeClient, RateGovernor, RecordStore, RevocationReport, RevokeOptions, process_revocations,
};

use crate::commands::RunStatus;
use crate::config::Config;
use crate::progress::ProgressReporter;

/// Flags for `starsweep revoke`.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct RevokeArgs {
    /// CSV file to read and update (default from config or ./stars.csv)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Rows before this 0-based index are taken as already revoked
    #[arg(short, long)]
    pub resume_from: Option<usize>,

    /// Show what would be revoked without calling the API or writing the file
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

fn summary_line(report: &RevocationReport) -> String {
    let verb = if report.dry_run { "would be revoked" } else { "revoked" };
    let mut line = format!("{} {}", report.revoked, verb);
    if report.failed > 0 {
        line.push_str(&format!(", {} failed (left flagged)", report.failed));
    }
    if report.replayed > 0 {
        line.push_str(&format!(", {} replayed from checkpoint", report.replayed));
    }
    if report.overridden_keep > 0 {
        line.push_str(&format!(
            " ({} keep rows overridden)",
            report.overridden_keep
        ));
    }
    line
}

pub(crate) async fn handle_revoke(
    args: RevokeArgs,
    config: &Config,
    client: &ForgeClient,
    stop: Arc<AtomicBool>,
) -> Result<RunStatus, Box<dyn std::error::Error>> {
    let store = RecordStore::new(args.input.unwrap_or_else(|| config.store.path.clone()));
    let options = RevokeOptions {
        resume_from: args.resume_from.unwrap_or(config.revoke.resume_from),
        dry_run: args.dry_run,
        stop: Some(stop),
    };
    let governor = RateGovernor::new(config.pacing());

    let reporter = Arc::new(ProgressReporter::new());
    let callback = reporter.as_callback();
    let result = process_revocations(client, &governor, &store, &options, Some(&callback)).await;
    reporter.finish();
    let report = result?;

    if Term::stdout().is_term() {
        println!();
        println!("{}", summary_line(&report));
        if let Some(index) = report.interrupted_at {
            println!("Stopped before row {}; rerun to continue.", index);
        }
    }

    Ok(if report.is_clean() {
        RunStatus::Complete
    } else {
        RunStatus::Partial
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_mentions_failures_and_overrides() {
        let report = RevocationReport {
            revoked: 3,
            failed: 1,
            replayed: 4,
            overridden_keep: 2,
            interrupted_at: None,
            dry_run: false,
        };
        assert_eq!(
            summary_line(&report),
            "3 revoked, 1 failed (left flagged), 4 replayed from checkpoint (2 keep rows overridden)"
        );
    }

    #[test]
    fn dry_run_summary_is_conditional() {
        let report = RevocationReport {
            revoked: 2,
            dry_run: true,
            ..RevocationReport::default()
        };
        assert_eq!(summary_line(&report), "2 would be revoked");
    }
}
