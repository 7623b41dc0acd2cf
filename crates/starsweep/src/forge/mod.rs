//! Forge API access: the credential-bound client and the three read paths
//! the harvest uses.
//!
//! # Module Structure
//!
//! - [`error`] - Error types for forge API calls
//! - [`types`] - Wire types for the consumed endpoints
//! - [`client`] - `ForgeClient`, quota lookup and unstarring
//! - [`starred`] - `PageFetcher` over `GET /user/starred`
//! - [`detail`] - `DetailEnricher` for descriptions and READMEs

mod client;
mod detail;
mod error;
mod starred;
mod types;

pub use client::{ACCEPT_HEADER, API_VERSION, DEFAULT_API_URL, DEFAULT_TIMEOUT, ForgeClient};
pub use detail::{DETAIL_UNAVAILABLE, DetailEnricher, DetailSource, Enrichment, decode_readme};
pub use error::{ForgeError, short_error_message};
pub use starred::{MAX_PER_PAGE, PageFetcher};
pub use types::{
    RateLimitResource, RateLimitResources, RateLimitResponse, ReadmePayload, RepoDetail,
    RepoOwner, RepoSummary,
};
