//! Single-page fetches against the revision-history endpoint

use crate::history::client::ApiClient;
use crate::history::payload::HistoryResponse;
use crate::history::AbortSignal;
use crate::state::Revision;
use crate::url::RequestDescriptor;
use crate::Result;

/// One page of revisions with the cursor of the page that follows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Revisions in the order the API returned them (newest first)
    pub revisions: Vec<Revision>,
    /// Full URL of the next page of older revisions; `None` once exhausted
    pub cursor: Option<String>,
}

/// Fetches revision-history pages for an article
#[derive(Debug, Clone)]
pub struct HistoryFetcher {
    api: ApiClient,
}

impl HistoryFetcher {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// URL of the newest page of the article's history
    pub fn history_endpoint(&self, descriptor: &RequestDescriptor) -> Result<String> {
        Ok(self
            .api
            .page_endpoint(descriptor, &["history"])?
            .to_string())
    }

    /// Fetches one page
    ///
    /// `endpoint` is either [`history_endpoint`](Self::history_endpoint) or a cursor
    /// returned with an earlier page. Revisions whose editor cannot be identified are
    /// dropped here, once, before the page is returned.
    ///
    /// # Errors
    ///
    /// * [`HistoryError::Aborted`](crate::HistoryError::Aborted) - the signal fired
    ///   before or during the request
    /// * [`HistoryError::RemoteApi`](crate::HistoryError::RemoteApi) - non-success
    ///   status or a body that does not match the history schema
    /// * [`HistoryError::AuthRequired`](crate::HistoryError::AuthRequired) - HTTP 401
    /// * [`HistoryError::Http`](crate::HistoryError::Http) - transport failure
    pub async fn fetch_page(
        &self,
        endpoint: &str,
        descriptor: &RequestDescriptor,
        abort: &AbortSignal,
    ) -> Result<Page> {
        let response: HistoryResponse = self.api.get_json(endpoint, descriptor, abort).await?;
        let (page, dropped) = response.into_page();

        if dropped > 0 {
            tracing::warn!(
                "Dropped {} revisions without editor identity from {}",
                dropped,
                descriptor
            );
        }

        Ok(page)
    }
}
