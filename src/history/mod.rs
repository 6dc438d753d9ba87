//! Revision history ingestion
//!
//! This module contains everything that talks to the revision-history endpoint:
//! - The shared Wikimedia API client and its identifying headers
//! - Schema validation of history payloads
//! - Single-page fetching
//! - The cursor-following pagination driver with pacing and cancellation

mod client;
mod driver;
mod fetcher;
mod payload;
mod signal;

pub use client::{build_http_client, ApiClient, API_USER_AGENT_HEADER};
pub use driver::{
    DriveSummary, DriverStatus, PageEvent, PaginationDriver, PaginationOptions, StopReason,
};
pub use fetcher::{HistoryFetcher, Page};
pub use signal::{AbortHandle, AbortSignal};

use crate::config::Config;
use crate::state::RevisionAggregate;
use crate::url::RequestDescriptor;
use crate::Result;

/// Loads an article's history into a fresh aggregate
///
/// This is the one-shot entry point: it resets `aggregate`, so revisions of a
/// previously submitted article never mix with the new ones, then runs a driver
/// built from the configuration until it stops.
///
/// # Arguments
///
/// * `config` - API, identification and pagination settings
/// * `descriptor` - The validated article reference
/// * `token` - Optional bearer token
/// * `aggregate` - Receives the merged revisions
/// * `abort` - Cancels the run between or during requests
pub async fn load_history(
    config: &Config,
    descriptor: RequestDescriptor,
    token: Option<String>,
    aggregate: &mut RevisionAggregate,
    abort: AbortSignal,
) -> Result<DriveSummary> {
    let api = ApiClient::new(config)?.with_token(token);
    aggregate.reset();

    let mut driver = PaginationDriver::new(
        HistoryFetcher::new(api),
        descriptor,
        PaginationOptions::from(&config.pagination),
        abort,
    );
    driver.run(aggregate).await
}
