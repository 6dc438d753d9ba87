//! Cursor-following pagination over an article's revision history
//!
//! The driver is a resumable step machine: every call to
//! [`next_page`](PaginationDriver::next_page) performs at most one request, merges the
//! page into the aggregate and only then reports it, so observers always see merged
//! state. One request is in flight at a time.
//!
//! ```text
//! Ready ──► (pace) ──► Fetching ──► Merging ──► Ready
//!   │                     │
//!   ├──► Done             └──► Aborted / Failed
//!   └──► Aborted
//! ```

use crate::config::PaginationConfig;
use crate::history::{AbortSignal, HistoryFetcher};
use crate::state::{MergeReport, RevisionAggregate};
use crate::url::RequestDescriptor;
use crate::{HistoryError, Result};
use std::time::Duration;

/// Limits of one driver run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationOptions {
    /// Hard cap on pages fetched by this driver
    pub max_pages: u32,

    /// Pause before every request after the first one
    pub inter_page_delay: Duration,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            max_pages: 10,
            inter_page_delay: Duration::from_millis(250),
        }
    }
}

impl From<&PaginationConfig> for PaginationOptions {
    fn from(config: &PaginationConfig) -> Self {
        Self {
            max_pages: config.max_pages,
            inter_page_delay: Duration::from_millis(config.inter_page_delay),
        }
    }
}

/// Why a driver stopped without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The API returned no further cursor
    Exhausted,
    /// `max_pages` pages were fetched; the aggregate keeps the cursor for a later run
    PageLimit,
}

/// Lifecycle of a driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverStatus {
    /// More pages may be requested
    Ready,
    Done(StopReason),
    /// The abort signal was observed; no further merges happen
    Aborted,
    /// A fetch failed; pages merged before the failure stay in the aggregate
    Failed,
}

impl DriverStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Ready)
    }
}

/// Reported after a page has been merged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageEvent {
    /// 1-based index of the page within this driver run
    pub page_number: u32,
    pub report: MergeReport,
    /// Revisions in the aggregate after the merge
    pub total_revisions: usize,
    pub has_more: bool,
}

/// Outcome of [`PaginationDriver::run`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriveSummary {
    pub pages: u32,
    pub stop: StopReason,
}

/// Follows the history cursor of one article
///
/// A driver is not restartable: once terminal it yields nothing. "Load more" is a new
/// driver over the same aggregate, which resumes from the aggregate's stored cursor.
pub struct PaginationDriver {
    fetcher: HistoryFetcher,
    descriptor: RequestDescriptor,
    options: PaginationOptions,
    abort: AbortSignal,
    pages_fetched: u32,
    status: DriverStatus,
}

impl PaginationDriver {
    pub fn new(
        fetcher: HistoryFetcher,
        descriptor: RequestDescriptor,
        options: PaginationOptions,
        abort: AbortSignal,
    ) -> Self {
        Self {
            fetcher,
            descriptor,
            options,
            abort,
            pages_fetched: 0,
            status: DriverStatus::Ready,
        }
    }

    pub fn status(&self) -> DriverStatus {
        self.status
    }

    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    pub fn descriptor(&self) -> &RequestDescriptor {
        &self.descriptor
    }

    /// Fetches and merges the next page
    ///
    /// # Returns
    ///
    /// * `Ok(Some(PageEvent))` - a page was fetched and merged
    /// * `Ok(None)` - the driver is done (cursor exhausted, page limit, or already terminal)
    /// * `Err(HistoryError::Aborted)` - the abort signal fired; nothing was merged
    /// * `Err(_)` - the fetch failed; the driver is terminal
    pub async fn next_page(
        &mut self,
        aggregate: &mut RevisionAggregate,
    ) -> Result<Option<PageEvent>> {
        if self.status.is_terminal() {
            return Ok(None);
        }

        if self.abort.is_aborted() {
            return Err(self.abort_now());
        }

        let endpoint = match self.next_endpoint(aggregate) {
            Ok(Some(endpoint)) => endpoint,
            Ok(None) => {
                self.finish(StopReason::Exhausted);
                return Ok(None);
            }
            Err(e) => {
                self.status = DriverStatus::Failed;
                return Err(e);
            }
        };

        if self.pages_fetched >= self.options.max_pages {
            self.finish(StopReason::PageLimit);
            return Ok(None);
        }

        if self.pages_fetched > 0 && !self.options.inter_page_delay.is_zero() {
            self.pace().await?;
        }

        let fetched = self
            .fetcher
            .fetch_page(&endpoint, &self.descriptor, &self.abort)
            .await;
        let page = match fetched {
            Ok(page) => page,
            Err(HistoryError::Aborted) => return Err(self.abort_now()),
            Err(e) => {
                tracing::warn!("Fetching history of {} failed: {}", self.descriptor, e);
                self.status = DriverStatus::Failed;
                return Err(e);
            }
        };

        // The response may have completed in the same instant the signal fired
        if self.abort.is_aborted() {
            return Err(self.abort_now());
        }

        let report = aggregate.merge(page.revisions, page.cursor);
        self.pages_fetched += 1;

        tracing::info!(
            "Merged page {} of {}: {} new revisions, {} total",
            self.pages_fetched,
            self.descriptor,
            report.accepted,
            aggregate.len()
        );

        Ok(Some(PageEvent {
            page_number: self.pages_fetched,
            report,
            total_revisions: aggregate.len(),
            has_more: aggregate.has_more(),
        }))
    }

    /// Drives the sequence to its end, keeping the aggregate's loading flag up to date
    pub async fn run(&mut self, aggregate: &mut RevisionAggregate) -> Result<DriveSummary> {
        aggregate.set_loading(true);
        let result = self.run_to_end(aggregate).await;
        aggregate.set_loading(false);
        result
    }

    async fn run_to_end(&mut self, aggregate: &mut RevisionAggregate) -> Result<DriveSummary> {
        while self.next_page(aggregate).await?.is_some() {}

        let stop = match self.status {
            DriverStatus::Done(stop) => stop,
            _ => StopReason::Exhausted,
        };
        Ok(DriveSummary {
            pages: self.pages_fetched,
            stop,
        })
    }

    /// Where the next request goes
    ///
    /// The stored cursor wins. Without one, a fresh aggregate starts at the newest
    /// page; anything else means the history was already read to its end.
    fn next_endpoint(&self, aggregate: &RevisionAggregate) -> Result<Option<String>> {
        if let Some(cursor) = aggregate.continuation_cursor() {
            return Ok(Some(cursor.to_string()));
        }
        if self.pages_fetched == 0 && aggregate.is_empty() {
            return self.fetcher.history_endpoint(&self.descriptor).map(Some);
        }
        Ok(None)
    }

    async fn pace(&mut self) -> Result<()> {
        let aborted = tokio::select! {
            biased;
            _ = self.abort.aborted() => true,
            _ = tokio::time::sleep(self.options.inter_page_delay) => false,
        };
        if aborted {
            return Err(self.abort_now());
        }
        Ok(())
    }

    fn abort_now(&mut self) -> HistoryError {
        if self.status != DriverStatus::Aborted {
            tracing::info!(
                "History of {} aborted after {} pages",
                self.descriptor,
                self.pages_fetched
            );
        }
        self.status = DriverStatus::Aborted;
        HistoryError::Aborted
    }

    fn finish(&mut self, stop: StopReason) {
        tracing::info!(
            "History of {} done after {} pages ({:?})",
            self.descriptor,
            self.pages_fetched,
            stop
        );
        self.status = DriverStatus::Done(stop);
    }
}
