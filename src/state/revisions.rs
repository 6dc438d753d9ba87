//! The growing revision collection for the active article
//!
//! [`RevisionAggregate`] owns the merged state. Mutations go through
//! [`merge`](RevisionAggregate::merge), [`reset`](RevisionAggregate::reset) and
//! [`set_loading`](RevisionAggregate::set_loading); observers subscribe to a version
//! counter and read the state through shared references only.

use crate::state::summary::{summarize_editors, EditorSummary};
use crate::state::DataSettings;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tokio::sync::watch;

/// Author of a revision
///
/// Anonymous edits carry a name (the IP address) but no id; suppressed
/// accounts may carry an id with the name hidden.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Editor {
    pub id: Option<u64>,
    pub name: Option<String>,
}

impl Editor {
    /// Returns true if the editor can be identified by id or name
    pub fn is_resolvable(&self) -> bool {
        self.id.is_some() || self.name.is_some()
    }
}

/// One historical edit of an article
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub minor: bool,
    /// Article size after the edit (bytes)
    pub size: u64,
    pub comment: Option<String>,
    pub editor: Editor,
    /// Size change relative to the parent revision (bytes)
    pub delta: i64,
}

/// Snapshot of the merged history
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevisionAggregateState {
    /// Revisions sorted ascending by timestamp, unique by id
    pub revisions: Vec<Revision>,

    /// Where the next page of older revisions begins
    pub continuation_cursor: Option<String>,

    /// True iff a cursor is stored and at least one revision exists
    pub has_more: bool,

    /// Set while a driver run is in progress
    pub is_loading: bool,
}

impl RevisionAggregateState {
    pub fn has_revisions(&self) -> bool {
        !self.revisions.is_empty()
    }

    /// Earliest and latest revision timestamps
    pub fn date_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let first = self.revisions.first()?;
        let last = self.revisions.last()?;
        Some((first.timestamp, last.timestamp))
    }
}

/// Counts describing what a single merge did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeReport {
    /// Revisions added to the aggregate
    pub accepted: usize,
    /// Revisions dropped because their editor could not be identified
    pub unresolved: usize,
    /// Revisions dropped because their id was already present
    pub duplicates: usize,
}

/// Owner of the merged revision state for one article
#[derive(Debug)]
pub struct RevisionAggregate {
    state: RevisionAggregateState,
    ids: HashSet<u64>,
    notify: watch::Sender<u64>,
    version: u64,
}

impl Default for RevisionAggregate {
    fn default() -> Self {
        Self::new()
    }
}

impl RevisionAggregate {
    /// Creates an empty aggregate
    pub fn new() -> Self {
        let (notify, _) = watch::channel(0);
        Self {
            state: RevisionAggregateState::default(),
            ids: HashSet::new(),
            notify,
            version: 0,
        }
    }

    /// Read-only view of the current state
    pub fn state(&self) -> &RevisionAggregateState {
        &self.state
    }

    pub fn revisions(&self) -> &[Revision] {
        &self.state.revisions
    }

    pub fn continuation_cursor(&self) -> Option<&str> {
        self.state.continuation_cursor.as_deref()
    }

    pub fn has_more(&self) -> bool {
        self.state.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading
    }

    pub fn len(&self) -> usize {
        self.state.revisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.revisions.is_empty()
    }

    /// Subscribes to state changes
    ///
    /// The received value is a version number bumped after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.notify.subscribe()
    }

    /// Merges one batch of revisions and stores the cursor that follows it
    ///
    /// # Merge Steps
    ///
    /// 1. Drop revisions whose editor has neither id nor name
    /// 2. Drop revisions whose id is already present (first occurrence wins)
    /// 3. Append and stable-sort ascending by timestamp, so equal timestamps keep
    ///    their arrival order
    /// 4. Store `next_cursor` verbatim (`None` means the history is exhausted)
    /// 5. Recompute `has_more`
    pub fn merge(&mut self, batch: Vec<Revision>, next_cursor: Option<String>) -> MergeReport {
        let mut report = MergeReport::default();

        for revision in batch {
            if !revision.editor.is_resolvable() {
                report.unresolved += 1;
                continue;
            }
            if !self.ids.insert(revision.id) {
                report.duplicates += 1;
                continue;
            }
            self.state.revisions.push(revision);
            report.accepted += 1;
        }

        self.state.revisions.sort_by_key(|r| r.timestamp);
        self.state.continuation_cursor = next_cursor;
        self.state.has_more =
            self.state.continuation_cursor.is_some() && !self.state.revisions.is_empty();

        if report.duplicates > 0 {
            tracing::debug!("Skipped {} already merged revisions", report.duplicates);
        }

        self.notify_change();
        report
    }

    /// Clears all revisions and the cursor
    pub fn reset(&mut self) {
        self.state = RevisionAggregateState::default();
        self.ids.clear();
        self.notify_change();
    }

    pub fn set_loading(&mut self, value: bool) {
        self.state.is_loading = value;
        self.notify_change();
    }

    /// Revisions passing the display filters, in timestamp order
    pub fn filtered(&self, settings: &DataSettings) -> Vec<&Revision> {
        self.state
            .revisions
            .iter()
            .filter(|r| settings.accepts(r))
            .collect()
    }

    /// Per-editor summaries of the filtered revisions, most active first
    pub fn editor_summaries(&self, settings: &DataSettings) -> Vec<EditorSummary> {
        summarize_editors(self.filtered(settings))
    }

    fn notify_change(&mut self) {
        self.version += 1;
        self.notify.send_replace(self.version);
    }
}
