//! Wire schema of the revision-history endpoint
//!
//! Responses are deserialized into these shapes first, so missing or mistyped
//! fields fail the whole page instead of leaking into [`Revision`]s.

use crate::history::Page;
use crate::state::{Editor, Revision};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One page of `/page/{title}/history`
#[derive(Debug, Deserialize)]
pub(crate) struct HistoryResponse {
    pub revisions: Vec<RawRevision>,
    /// URL of the next page of older revisions
    #[serde(default)]
    pub older: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawRevision {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub minor: bool,
    pub size: u64,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub user: Option<RawUser>,
    #[serde(default)]
    pub delta: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawUser {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
}

impl RawRevision {
    /// Lifts the raw entry into a revision; `None` if the editor cannot be identified
    fn into_revision(self) -> Option<Revision> {
        let user = self.user?;
        let editor = Editor {
            id: user.id.filter(|id| *id != 0),
            name: user.name.filter(|name| !name.is_empty()),
        };
        if !editor.is_resolvable() {
            return None;
        }

        Some(Revision {
            id: self.id,
            timestamp: self.timestamp,
            minor: self.minor,
            size: self.size,
            comment: self.comment,
            editor,
            delta: self.delta.unwrap_or(0),
        })
    }
}

impl HistoryResponse {
    /// Converts the response into a page, returning it with the number of dropped entries
    pub fn into_page(self) -> (Page, usize) {
        let total = self.revisions.len();
        let revisions: Vec<Revision> = self
            .revisions
            .into_iter()
            .filter_map(RawRevision::into_revision)
            .collect();
        let dropped = total - revisions.len();

        let cursor = self.older.filter(|older| !older.is_empty());
        (Page { revisions, cursor }, dropped)
    }
}
