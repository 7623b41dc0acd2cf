//! Starsweep - harvest your starred repositories into a CSV file, then prune
//! them.
//!
//! A run has two halves:
//!
//! - [`harvest::harvest_stars`] walks `GET /user/starred` page by page,
//!   enriches each repository with a description (or README) and returns
//!   records ready for a [`store::RecordStore`].
//! - [`revoke::process_revocations`] reads the store back after the operator
//!   has flagged rows `revoke`, unstars them and records the outcome.
//!
//! Both halves pace their calls through a [`rate_limit::RateGovernor`].
//!
//! # Example
//!
//! ```ignore
//! use starsweep::{ForgeClient, HarvestOptions, RateGovernor, RecordStore, harvest_stars};
//!
//! let client = ForgeClient::with_reqwest(&token)?;
//! let governor = RateGovernor::default();
//! let outcome = harvest_stars(&client, &governor, &HarvestOptions::default(), None).await;
//! RecordStore::new("stars.csv").save(&outcome.records)?;
//! ```

pub mod forge;
pub mod harvest;
pub mod http;
pub mod progress;
pub mod rate_limit;
pub mod record;
pub mod retry;
pub mod revoke;
pub mod store;

pub use forge::{DetailSource, ForgeClient, ForgeError};
pub use harvest::{HarvestOptions, HarvestOutcome, HarvestStatus, harvest_stars};
pub use progress::{ProgressCallback, SweepProgress};
pub use rate_limit::{PacingConfig, QuotaCheck, RateGovernor, RequestKind, rate_limits};
pub use record::{Disposition, StarRecord};
pub use retry::RetryConfig;
pub use revoke::{RevocationReport, RevokeOptions, process_revocations};
pub use store::{RecordStore, StoreError, merge_records};
