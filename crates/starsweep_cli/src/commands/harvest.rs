use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use console::Term;
use starsweep::{
    DetailSource, ForgeClient, HarvestOptions, HarvestStatus, RateGovernor, RecordStore,
    StarRecord, StoreError, harvest_stars, merge_records,
};

use crate::commands::RunStatus;
use crate::config::Config;
use crate::progress::ProgressReporter;

/// Flags for `starsweep harvest`.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct HarvestArgs {
    /// Output CSV file (default from config or ./stars.csv)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// First page to fetch (default 1); use the page a previous run stopped at
    #[arg(short = 'p', long)]
    pub start_page: Option<u32>,

    /// Where the description column comes from
    #[arg(short, long, value_parser = parse_detail)]
    pub detail: Option<DetailSource>,

    /// Merge into an existing file instead of replacing it
    #[arg(short, long)]
    pub append: bool,
}

fn parse_detail(s: &str) -> Result<DetailSource, String> {
    s.parse()
}

/// Load the store a run will merge into, before anything is fetched.
///
/// A store that fails to parse stops the run here rather than after the
/// harvest has spent its quota.
fn load_existing(
    store: &RecordStore,
    append: bool,
) -> Result<Option<Vec<StarRecord>>, StoreError> {
    if append && store.exists() {
        Ok(Some(store.load()?))
    } else {
        Ok(None)
    }
}

/// File a partial harvest goes to when it must not replace `path`.
fn sidecar_path(path: &Path) -> PathBuf {
    path.with_extension("harvest.csv")
}

/// Decide where the harvested records are written and what they hold.
///
/// Fresh records merge into `existing` when there is one. Without a merge
/// target, a partial run never replaces a store that already exists; it is
/// written next to it instead.
fn plan_save(
    store: &RecordStore,
    existing: Option<Vec<StarRecord>>,
    fresh: Vec<StarRecord>,
    partial: bool,
) -> (RecordStore, Vec<StarRecord>) {
    match existing {
        Some(existing) => (store.clone(), merge_records(existing, fresh)),
        None if partial && store.exists() => (RecordStore::new(sidecar_path(store.path())), fresh),
        None => (store.clone(), fresh),
    }
}

pub(crate) async fn handle_harvest(
    args: HarvestArgs,
    config: &Config,
    client: &ForgeClient,
    stop: Arc<AtomicBool>,
) -> Result<RunStatus, Box<dyn std::error::Error>> {
    let store = RecordStore::new(args.output.unwrap_or_else(|| config.store.path.clone()));
    let start_page = args.start_page.unwrap_or(config.harvest.start_page).max(1);
    // A resumed harvest only makes sense merged into the earlier file.
    let append = args.append || start_page > 1;
    let existing = load_existing(&store, append)?;

    let options = HarvestOptions {
        start_page,
        per_page: config.harvest.per_page,
        detail: args.detail.unwrap_or(config.harvest.detail),
        retry: config.retry(),
        stop: Some(stop),
    };
    let governor = RateGovernor::new(config.pacing());

    let reporter = Arc::new(ProgressReporter::new());
    let callback = reporter.as_callback();
    let outcome = harvest_stars(client, &governor, &options, Some(&callback)).await;

    let status = match &outcome.status {
        HarvestStatus::Complete => RunStatus::Complete,
        HarvestStatus::Aborted { page, error } if outcome.pages_fetched == 0 => {
            reporter.finish();
            return Err(format!("harvest failed on page {}: {}", page, error).into());
        }
        HarvestStatus::Aborted { .. } | HarvestStatus::Interrupted { .. } => RunStatus::Partial,
    };

    let harvested = outcome.records.len();
    let (target, records) = plan_save(
        &store,
        existing,
        outcome.records,
        status == RunStatus::Partial,
    );
    target.save(&records)?;
    callback(starsweep::SweepProgress::StoreSaved {
        path: target.path().display().to_string(),
        count: records.len(),
    });
    reporter.finish();

    let diverted = target.path() != store.path();
    if Term::stdout().is_term() {
        println!();
        println!(
            "{} repos harvested, {} rows in {}",
            harvested,
            records.len(),
            target.path().display()
        );
        if diverted {
            println!("{} left unchanged.", store.path().display());
        }
        if status == RunStatus::Partial {
            println!(
                "Run stopped early. Resume with: starsweep harvest -o {} --start-page {} --append",
                target.path().display(),
                outcome.next_page
            );
        }
    } else if status == RunStatus::Partial {
        tracing::warn!(
            next_page = outcome.next_page,
            path = %target.path().display(),
            kept = %store.path().display(),
            diverted,
            "Harvest incomplete, resume from next_page with --append"
        );
    }

    Ok(status)
}
