//! Per-editor aggregation over a set of revisions

use crate::state::Revision;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Activity of one editor within the currently filtered revisions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorSummary {
    /// Account id of the editor (first one seen in the group)
    pub editor_id: Option<u64>,

    /// Editor name; `None` groups every revision with a hidden or unknown name
    pub name: Option<String>,

    /// Number of revisions made by this editor
    pub revision_count: usize,

    /// How many of those were minor edits
    pub minor_count: usize,

    /// Timestamp of the editor's earliest revision
    pub first_seen: DateTime<Utc>,

    /// Sum of absolute size deltas (bytes)
    pub total_absolute_delta: i64,
}

/// Groups revisions by editor name, most active editor first
///
/// Editors with the same revision count keep the order in which they first appear.
pub fn summarize_editors<'a, I>(revisions: I) -> Vec<EditorSummary>
where
    I: IntoIterator<Item = &'a Revision>,
{
    let mut summaries: Vec<EditorSummary> = Vec::new();
    let mut index: HashMap<Option<&'a str>, usize> = HashMap::new();

    for revision in revisions {
        let key = revision.editor.name.as_deref();
        match index.get(&key) {
            Some(&slot) => {
                let summary = &mut summaries[slot];
                summary.revision_count += 1;
                summary.minor_count += usize::from(revision.minor);
                summary.first_seen = summary.first_seen.min(revision.timestamp);
                summary.total_absolute_delta += revision.delta.abs();
                if summary.editor_id.is_none() {
                    summary.editor_id = revision.editor.id;
                }
            }
            None => {
                index.insert(key, summaries.len());
                summaries.push(EditorSummary {
                    editor_id: revision.editor.id,
                    name: key.map(str::to_string),
                    revision_count: 1,
                    minor_count: usize::from(revision.minor),
                    first_seen: revision.timestamp,
                    total_absolute_delta: revision.delta.abs(),
                });
            }
        }
    }

    // Stable: ties keep first-appearance order
    summaries.sort_by(|a, b| b.revision_count.cmp(&a.revision_count));
    summaries
}
