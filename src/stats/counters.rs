use crate::history::{AbortSignal, ApiClient};
use crate::url::RequestDescriptor;
use crate::{HistoryError, Result};
use serde::Deserialize;
use std::fmt;

/// Counters offered by `/page/{title}/history/counts/{kind}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterKind {
    Anonymous,
    Bot,
    Editors,
    Edits,
    Minor,
    Reverted,
}

impl CounterKind {
    /// Every counter a [`PageStatistics`] snapshot is made of
    pub const ALL: [CounterKind; 6] = [
        Self::Anonymous,
        Self::Bot,
        Self::Editors,
        Self::Edits,
        Self::Minor,
        Self::Reverted,
    ];

    /// Path segment of the counter in the counts endpoint
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Bot => "bot",
            Self::Editors => "editors",
            Self::Edits => "edits",
            Self::Minor => "minor",
            Self::Reverted => "reverted",
        }
    }

    /// Ceiling the API counts up to
    ///
    /// A result at the cap comes back with `limited = true` and only tells that the
    /// true count is at least this large.
    pub fn cap(&self) -> u64 {
        match self {
            Self::Anonymous | Self::Bot => 10_000,
            Self::Editors => 25_000,
            Self::Edits | Self::Reverted => 30_000,
            Self::Minor => 1_000,
        }
    }
}

impl fmt::Display for CounterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One counter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterResult {
    pub kind: CounterKind,
    pub count: u64,
    /// True if the API stopped counting at [`CounterKind::cap`]
    pub limited: bool,
}

/// Wire shape of a counts response
#[derive(Debug, Deserialize)]
struct CountResponse {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    count: u64,
    #[serde(default)]
    limit: bool,
}

/// All six counters of one article
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageStatistics {
    pub anonymous: CounterResult,
    pub bot: CounterResult,
    pub editors: CounterResult,
    pub edits: CounterResult,
    pub minor: CounterResult,
    pub reverted: CounterResult,
}

impl PageStatistics {
    pub fn get(&self, kind: CounterKind) -> &CounterResult {
        match kind {
            CounterKind::Anonymous => &self.anonymous,
            CounterKind::Bot => &self.bot,
            CounterKind::Editors => &self.editors,
            CounterKind::Edits => &self.edits,
            CounterKind::Minor => &self.minor,
            CounterKind::Reverted => &self.reverted,
        }
    }

    pub fn total_edits(&self) -> u64 {
        self.edits.count
    }

    /// Registered editors plus anonymous contributors
    pub fn total_users(&self) -> u64 {
        self.anonymous.count + self.editors.count
    }

    /// True if any counter hit its cap
    pub fn any_limited(&self) -> bool {
        CounterKind::ALL.iter().any(|kind| self.get(*kind).limited)
    }
}

/// Fetches the counters of an article, one request at a time
#[derive(Debug, Clone)]
pub struct StatisticsFetcher {
    api: ApiClient,
}

impl StatisticsFetcher {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Fetches all six counters
    ///
    /// Succeeds only if every counter returned a usable value; otherwise fails with
    /// [`HistoryError::StatisticsIncomplete`] naming the first counter that failed.
    /// An abort ends the fetch with [`HistoryError::Aborted`].
    pub async fn fetch_all(
        &self,
        descriptor: &RequestDescriptor,
        abort: &AbortSignal,
    ) -> Result<PageStatistics> {
        Ok(PageStatistics {
            anonymous: self
                .fetch_required(descriptor, CounterKind::Anonymous, abort)
                .await?,
            bot: self.fetch_required(descriptor, CounterKind::Bot, abort).await?,
            editors: self
                .fetch_required(descriptor, CounterKind::Editors, abort)
                .await?,
            edits: self
                .fetch_required(descriptor, CounterKind::Edits, abort)
                .await?,
            minor: self
                .fetch_required(descriptor, CounterKind::Minor, abort)
                .await?,
            reverted: self
                .fetch_required(descriptor, CounterKind::Reverted, abort)
                .await?,
        })
    }

    async fn fetch_required(
        &self,
        descriptor: &RequestDescriptor,
        kind: CounterKind,
        abort: &AbortSignal,
    ) -> Result<CounterResult> {
        match self.fetch_counter(descriptor, kind, abort).await {
            Ok(result) => Ok(result),
            Err(HistoryError::Aborted) => Err(HistoryError::Aborted),
            Err(e) => {
                tracing::warn!("Counter {} of {} failed: {}", kind, descriptor, e);
                Err(HistoryError::StatisticsIncomplete {
                    kind,
                    source: Box::new(e),
                })
            }
        }
    }

    /// Fetches a single counter
    pub async fn fetch_counter(
        &self,
        descriptor: &RequestDescriptor,
        kind: CounterKind,
        abort: &AbortSignal,
    ) -> Result<CounterResult> {
        let url = self
            .api
            .page_endpoint(descriptor, &["history", "counts", kind.as_str()])?;

        let response: CountResponse = self.api.get_json(url.as_str(), descriptor, abort).await?;

        if let Some(reported) = response.kind.as_deref() {
            if reported != kind.as_str() {
                return Err(HistoryError::RemoteApi {
                    status: 200,
                    status_text: format!(
                        "expected '{}' counter, got '{}'",
                        kind.as_str(),
                        reported
                    ),
                });
            }
        }

        Ok(CounterResult {
            kind,
            count: response.count,
            limited: response.limit,
        })
    }
}
